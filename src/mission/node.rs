use crate::error::{Error, Result};
use crate::validator::Validator;
use crate::value::{FromLua, KeyRef, LuaKey, LuaTable, LuaValue, lookup, lookup_mut};
use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

/// The decoded mission and dictionary trees shared by every view.
#[derive(Debug)]
pub(crate) struct Store {
    pub(crate) mission: LuaTable,
    pub(crate) l10n: LuaTable,
    /// Bumped on structural or identity changes; memoized lookups compare against it.
    generation: u64,
}

pub(crate) type SharedStore = Rc<RefCell<Store>>;

pub(crate) fn new_store(mission: LuaTable, l10n: LuaTable) -> SharedStore {
    Rc::new(RefCell::new(Store {
        mission,
        l10n,
        generation: 0,
    }))
}

/// Location of one sub-table inside the mission tree.
/// Holds no data of its own: every access re-resolves `path` against the shared store.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    store: SharedStore,
    path: Rc<[LuaKey]>,
}

fn key_refs<'k>(keys: impl IntoIterator<Item = &'k LuaKey>) -> Vec<KeyRef<'k>> {
    keys.into_iter().map(LuaKey::as_key_ref).collect()
}

fn resolve<'t>(root: &'t LuaTable, path: &[LuaKey]) -> Option<&'t LuaTable> {
    if path.is_empty() {
        return Some(root);
    }
    lookup(root, &key_refs(path))?.as_table()
}

fn resolve_mut<'t>(root: &'t mut LuaTable, path: &[LuaKey]) -> Option<&'t mut LuaTable> {
    if path.is_empty() {
        return Some(root);
    }
    lookup_mut(root, &key_refs(path))?.as_table_mut()
}

/// Render a key path the way it reads in the mission file: `coalition.blue.country[1].name`.
pub(crate) fn describe<'k>(keys: impl IntoIterator<Item = KeyRef<'k>>) -> String {
    let mut out = String::new();
    for key in keys {
        match key {
            KeyRef::Int(i) => out.push_str(&format!("[{i}]")),
            KeyRef::Str(s) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(s);
            }
        }
    }
    out
}

impl Node {
    pub(crate) fn root(store: SharedStore) -> Self {
        Self {
            store,
            path: Rc::from(Vec::new()),
        }
    }

    pub(crate) fn child<I, K>(&self, keys: I) -> Node
    where
        I: IntoIterator<Item = K>,
        K: Into<LuaKey>,
    {
        let path: Vec<LuaKey> = self
            .path
            .iter()
            .cloned()
            .chain(keys.into_iter().map(Into::into))
            .collect();
        Node {
            store: self.store.clone(),
            path: Rc::from(path),
        }
    }

    pub(crate) fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Whether this node lies strictly below `ancestor` in the same store.
    pub(crate) fn is_within(&self, ancestor: &Node) -> bool {
        Rc::ptr_eq(&self.store, &ancestor.store)
            && self.path.len() > ancestor.path.len()
            && self.path.starts_with(&ancestor.path)
    }

    pub(crate) fn last_key(&self) -> Option<&LuaKey> {
        self.path.last()
    }

    /// Human-readable location of `field` below this node.
    pub(crate) fn describe(&self, field: &[&str]) -> String {
        describe(
            self.path
                .iter()
                .map(LuaKey::as_key_ref)
                .chain(field.iter().map(|f| KeyRef::Str(f))),
        )
    }

    fn missing(&self, field: &[&str]) -> Error {
        Error::MissingField {
            path: self.describe(field),
        }
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&LuaTable) -> Result<R>) -> Result<R> {
        let store = self.store.borrow();
        let table = resolve(&store.mission, &self.path).ok_or_else(|| self.missing(&[]))?;
        f(table)
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut LuaTable) -> Result<R>) -> Result<R> {
        let mut store = self.store.borrow_mut();
        let table =
            resolve_mut(&mut store.mission, &self.path).ok_or_else(|| self.missing(&[]))?;
        f(table)
    }

    /// Keys of the sub-table at `field`, or nothing when it is absent.
    pub(crate) fn keys_of(&self, field: &[&str]) -> Result<Vec<LuaKey>> {
        self.read(|t| {
            let refs: Vec<KeyRef> = field.iter().map(|f| KeyRef::Str(f)).collect();
            match lookup(t, &refs) {
                None => Ok(Vec::new()),
                Some(LuaValue::Table(sub)) => Ok(sub.keys().cloned().collect()),
                Some(other) => Err(Error::type_mismatch(
                    self.describe(field),
                    "table",
                    other.type_name(),
                )),
            }
        })
    }

    pub(crate) fn get_opt<T: FromLua>(&self, field: &[&str]) -> Result<Option<T>> {
        self.read(|t| {
            let refs: Vec<KeyRef> = field.iter().map(|f| KeyRef::Str(f)).collect();
            let Some(value) = lookup(t, &refs) else {
                return Ok(None);
            };
            T::from_lua(value).map(Some).ok_or_else(|| {
                Error::type_mismatch(self.describe(field), T::EXPECTED.name(), value.type_name())
            })
        })
    }

    pub(crate) fn get<T: FromLua>(&self, field: &[&str]) -> Result<T> {
        self.get_opt(field)?.ok_or_else(|| self.missing(field))
    }

    /// Raw value at `field`, cloned out of the tree.
    pub(crate) fn get_value(&self, field: &[&str]) -> Result<Option<LuaValue>> {
        self.read(|t| {
            let refs: Vec<KeyRef> = field.iter().map(|f| KeyRef::Str(f)).collect();
            Ok(lookup(t, &refs).cloned())
        })
    }

    /// Write `value` at `field`. Parent tables must exist; an existing key keeps its position.
    pub(crate) fn set(&self, field: &[&str], value: LuaValue) -> Result<()> {
        let Some((last, parents)) = field.split_last() else {
            return Err(self.missing(field));
        };
        self.write(|t| {
            let parent = if parents.is_empty() {
                t
            } else {
                let refs: Vec<KeyRef> = parents.iter().map(|f| KeyRef::Str(f)).collect();
                lookup_mut(t, &refs)
                    .and_then(LuaValue::as_table_mut)
                    .ok_or_else(|| self.missing(parents))?
            };
            parent.insert(LuaKey::from(*last), value);
            Ok(())
        })
    }

    /// Validate under the public field name `name`, then write.
    pub(crate) fn set_checked(
        &self,
        field: &[&str],
        name: &str,
        value: LuaValue,
        validator: &Validator,
    ) -> Result<()> {
        validator.validate(&value, name)?;
        self.set(field, value)
    }

    pub(crate) fn generation(&self) -> u64 {
        self.store.borrow().generation
    }

    /// Invalidate memoized lookups after a structural or identity change.
    pub(crate) fn touch(&self) {
        let mut store = self.store.borrow_mut();
        store.generation += 1;
        tracing::debug!(generation = store.generation, path = %describe(self.path.iter().map(LuaKey::as_key_ref)), "mission caches invalidated");
    }

    pub(crate) fn with_mission<R>(&self, f: impl FnOnce(&LuaTable) -> R) -> R {
        f(&self.store.borrow().mission)
    }

    /// Text behind a dictionary key (`DictKey_sortie_5` → "Operation ...").
    pub(crate) fn l10n_text(&self, key: &str) -> Result<String> {
        let store = self.store.borrow();
        match store.l10n.get(&KeyRef::Str(key)) {
            Some(LuaValue::String(s)) => Ok(s.clone()),
            Some(other) => Err(Error::type_mismatch(
                format!("dictionary.{key}"),
                "string",
                other.type_name(),
            )),
            None => Err(Error::MissingField {
                path: format!("dictionary.{key}"),
            }),
        }
    }

    pub(crate) fn set_l10n_text(&self, key: &str, text: &str) -> Result<()> {
        self.store
            .borrow_mut()
            .l10n
            .insert(LuaKey::from(key), LuaValue::from(text));
        Ok(())
    }
}

/// Lookup memo invalidated whenever the store generation moves on.
#[derive(Debug)]
pub(crate) struct Memo<K, V> {
    generation: u64,
    entries: HashMap<K, V>,
}

pub(crate) type SharedMemo<K, V> = Rc<RefCell<Memo<K, V>>>;

pub(crate) fn new_memo<K, V>() -> SharedMemo<K, V> {
    Rc::new(RefCell::new(Memo {
        generation: 0,
        entries: HashMap::new(),
    }))
}

impl<K: Eq + Hash, V: Clone> Memo<K, V> {
    fn sync(&mut self, generation: u64) {
        if self.generation != generation {
            self.entries.clear();
            self.generation = generation;
        }
    }

    pub(crate) fn get(&mut self, generation: u64, key: &K) -> Option<V> {
        self.sync(generation);
        self.entries.get(key).cloned()
    }

    pub(crate) fn insert(&mut self, generation: u64, key: K, value: V) {
        self.sync(generation);
        self.entries.insert(key, value);
    }

    pub(crate) fn get_or_insert_with(&mut self, generation: u64, key: K, f: impl FnOnce() -> V) -> V {
        self.sync(generation);
        self.entries.entry(key).or_insert_with(f).clone()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
