use indexmap::{Equivalent, IndexMap};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Ordered Lua table: keys keep their first-appearance order so re-encoding reproduces it.
pub type LuaTable = IndexMap<LuaKey, LuaValue>;

/// Represents a number that preserves the distinction between integer and float literals.
/// `1` and `1.0` are different values and must survive a round trip as written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LuaNumber {
    Integer(i64),
    Float(f64),
}

impl LuaNumber {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            LuaNumber::Integer(v) => Some(*v),
            LuaNumber::Float(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            LuaNumber::Integer(v) => *v as f64,
            LuaNumber::Float(v) => *v,
        }
    }
}

/// A table key. Bare identifiers and bracketed strings both decode to `Str`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LuaKey {
    Int(i64),
    Str(String),
}

/// Borrowed form of [`LuaKey`], usable for lookups without allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRef<'a> {
    Int(i64),
    Str(&'a str),
}

// LuaKey and KeyRef must hash identically for `Equivalent` lookups.
impl Hash for LuaKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_key_ref().hash(state);
    }
}

impl Hash for KeyRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            KeyRef::Int(v) => {
                state.write_u8(0);
                v.hash(state);
            }
            KeyRef::Str(s) => {
                state.write_u8(1);
                s.hash(state);
            }
        }
    }
}

impl Equivalent<LuaKey> for KeyRef<'_> {
    fn equivalent(&self, key: &LuaKey) -> bool {
        *self == key.as_key_ref()
    }
}

impl LuaKey {
    pub fn as_key_ref(&self) -> KeyRef<'_> {
        match self {
            LuaKey::Int(v) => KeyRef::Int(*v),
            LuaKey::Str(s) => KeyRef::Str(s),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            LuaKey::Int(v) => Some(*v),
            LuaKey::Str(_) => None,
        }
    }
}

impl KeyRef<'_> {
    pub fn to_owned_key(self) -> LuaKey {
        match self {
            KeyRef::Int(v) => LuaKey::Int(v),
            KeyRef::Str(s) => LuaKey::Str(s.to_string()),
        }
    }
}

impl From<&str> for LuaKey {
    fn from(s: &str) -> Self {
        LuaKey::Str(s.to_string())
    }
}

impl From<String> for LuaKey {
    fn from(s: String) -> Self {
        LuaKey::Str(s)
    }
}

impl From<i64> for LuaKey {
    fn from(v: i64) -> Self {
        LuaKey::Int(v)
    }
}

impl<'a> From<&'a str> for KeyRef<'a> {
    fn from(s: &'a str) -> Self {
        KeyRef::Str(s)
    }
}

impl From<i64> for KeyRef<'_> {
    fn from(v: i64) -> Self {
        KeyRef::Int(v)
    }
}

impl fmt::Display for LuaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LuaKey::Int(v) => write!(f, "[{v}]"),
            LuaKey::Str(s) => f.write_str(s),
        }
    }
}

/// Kinds of values, used by validators and type-mismatch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Nil,
    Bool,
    Integer,
    Float,
    String,
    Table,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Nil => "nil",
            ValueKind::Bool => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Table => "table",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Represents a value in the Lua table literal format.
#[derive(Debug, Clone, PartialEq)]
pub enum LuaValue {
    Nil,
    Bool(bool),
    Number(LuaNumber),
    String(String),
    Table(LuaTable),
}

impl LuaValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            LuaValue::Nil => ValueKind::Nil,
            LuaValue::Bool(_) => ValueKind::Bool,
            LuaValue::Number(LuaNumber::Integer(_)) => ValueKind::Integer,
            LuaValue::Number(LuaNumber::Float(_)) => ValueKind::Float,
            LuaValue::String(_) => ValueKind::String,
            LuaValue::Table(_) => ValueKind::Table,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn as_table(&self) -> Option<&LuaTable> {
        match self {
            LuaValue::Table(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut LuaTable> {
        match self {
            LuaValue::Table(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LuaValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            LuaValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Numeric value regardless of integer/float kind.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LuaValue::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            LuaValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get<'k>(&self, key: impl Into<KeyRef<'k>>) -> Option<&LuaValue> {
        self.as_table().and_then(|m| m.get(&key.into()))
    }

    pub fn get_mut<'k>(&mut self, key: impl Into<KeyRef<'k>>) -> Option<&mut LuaValue> {
        self.as_table_mut().and_then(|m| m.get_mut(&key.into()))
    }
}

impl From<bool> for LuaValue {
    fn from(v: bool) -> Self {
        LuaValue::Bool(v)
    }
}

impl From<i64> for LuaValue {
    fn from(v: i64) -> Self {
        LuaValue::Number(LuaNumber::Integer(v))
    }
}

impl From<f64> for LuaValue {
    fn from(v: f64) -> Self {
        LuaValue::Number(LuaNumber::Float(v))
    }
}

impl From<&str> for LuaValue {
    fn from(v: &str) -> Self {
        LuaValue::String(v.to_string())
    }
}

impl From<String> for LuaValue {
    fn from(v: String) -> Self {
        LuaValue::String(v)
    }
}

impl From<LuaTable> for LuaValue {
    fn from(v: LuaTable) -> Self {
        LuaValue::Table(v)
    }
}

/// Walk a chain of keys from `table`, returning the value at the end.
pub fn lookup<'t>(table: &'t LuaTable, path: &[KeyRef<'_>]) -> Option<&'t LuaValue> {
    let (first, rest) = path.split_first()?;
    let mut current = table.get(first)?;
    for key in rest {
        current = current.as_table()?.get(key)?;
    }
    Some(current)
}

pub fn lookup_mut<'t>(table: &'t mut LuaTable, path: &[KeyRef<'_>]) -> Option<&'t mut LuaValue> {
    let (first, rest) = path.split_first()?;
    let mut current = table.get_mut(first)?;
    for key in rest {
        current = current.as_table_mut()?.get_mut(key)?;
    }
    Some(current)
}

/// Conversion from a tree value into a typed Rust value.
pub trait FromLua: Sized {
    const EXPECTED: ValueKind;

    fn from_lua(value: &LuaValue) -> Option<Self>;
}

impl FromLua for i64 {
    const EXPECTED: ValueKind = ValueKind::Integer;

    fn from_lua(value: &LuaValue) -> Option<Self> {
        value.as_i64()
    }
}

// Floats accept integer literals too: the host writes `251` and `251.5` for the same field.
impl FromLua for f64 {
    const EXPECTED: ValueKind = ValueKind::Float;

    fn from_lua(value: &LuaValue) -> Option<Self> {
        value.as_f64()
    }
}

impl FromLua for bool {
    const EXPECTED: ValueKind = ValueKind::Bool;

    fn from_lua(value: &LuaValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromLua for String {
    const EXPECTED: ValueKind = ValueKind::String;

    fn from_lua(value: &LuaValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

/// Remove `key` from a 1-based sequence table and shift the following integer keys down.
/// Returns the removed value.
pub fn remove_sequence_entry(table: &mut LuaTable, index: i64) -> Option<LuaValue> {
    let removed = table.shift_remove(&KeyRef::Int(index))?;
    let entries = std::mem::take(table);
    for (key, value) in entries {
        let key = match key {
            LuaKey::Int(i) if i > index => LuaKey::Int(i - 1),
            other => other,
        };
        table.insert(key, value);
    }
    Some(removed)
}
