use super::node::{Node, SharedMemo, new_memo};
use super::{Category, Group, Side, UnitKind, check_id, check_name};
use crate::error::{Error, Result};
use crate::statics;
use crate::value::{KeyRef, LuaKey, LuaValue, remove_sequence_entry};

/// A country inside a coalition, owning groups in four fixed categories.
#[derive(Debug, Clone)]
pub struct Country {
    node: Node,
    side: Side,
    groups: SharedMemo<(Category, LuaKey), Group>,
}

impl Country {
    pub(crate) fn new(node: Node, side: Side) -> Self {
        Self {
            node,
            side,
            groups: new_memo(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn id(&self) -> Result<i64> {
        self.node.get(&[statics::KEY_ID])
    }

    pub fn name(&self) -> Result<String> {
        self.node.get(&[statics::KEY_NAME])
    }

    pub fn groups_of(&self, category: Category) -> Result<Vec<Group>> {
        let generation = self.node.generation();
        let keys = self
            .node
            .keys_of(&[category.as_str(), statics::KEY_GROUP])?;
        let mut memo = self.groups.borrow_mut();
        Ok(keys
            .into_iter()
            .map(|key| {
                memo.get_or_insert_with(generation, (category, key.clone()), || {
                    let node = self.node.child([
                        LuaKey::from(category.as_str()),
                        LuaKey::from(statics::KEY_GROUP),
                        key,
                    ]);
                    Group::new(node, category)
                })
            })
            .collect())
    }

    /// All groups, helicopters first, then planes, ships and vehicles.
    pub fn groups(&self) -> Result<Vec<Group>> {
        let mut groups = Vec::new();
        for category in Category::ALL {
            groups.extend(self.groups_of(category)?);
        }
        Ok(groups)
    }

    pub fn get_groups_from_category(&self, category: &str) -> Result<Vec<Group>> {
        self.groups_of(category.parse()?)
    }

    pub fn get_group_by_id(&self, id: i64) -> Result<Option<Group>> {
        check_id(id, "group id")?;
        for group in self.groups()? {
            if group.id()? == id {
                return Ok(Some(group));
            }
        }
        Ok(None)
    }

    pub fn get_group_by_name(&self, name: &str) -> Result<Option<Group>> {
        check_name(name, "group name")?;
        for group in self.groups()? {
            if group.name()? == name {
                return Ok(Some(group));
            }
        }
        Ok(None)
    }

    pub fn units(&self) -> Result<Vec<UnitKind>> {
        let mut units = Vec::new();
        for group in self.groups()? {
            units.extend(group.units()?);
        }
        Ok(units)
    }

    pub fn get_unit_by_id(&self, id: i64) -> Result<Option<UnitKind>> {
        check_id(id, "unit id")?;
        for group in self.groups()? {
            if let Some(unit) = group.get_unit_by_id(id)? {
                return Ok(Some(unit));
            }
        }
        Ok(None)
    }

    pub fn get_unit_by_name(&self, name: &str) -> Result<Option<UnitKind>> {
        check_name(name, "unit name")?;
        for group in self.groups()? {
            if let Some(unit) = group.get_unit_by_name(name)? {
                return Ok(Some(unit));
            }
        }
        Ok(None)
    }

    /// Delete `group` from this country. Later groups of the same category move up one slot,
    /// so every previously obtained view of this country's groups is stale afterwards.
    pub fn remove_group(&self, group: &Group) -> Result<()> {
        let index = group.index().filter(|_| group.node().is_within(&self.node));
        let Some(index) = index else {
            return Err(Error::MissingField {
                path: self.node.describe(&[group.category().as_str(), statics::KEY_GROUP]),
            });
        };
        let category = group.category().as_str();
        let removed = self.node.write(|t| {
            let groups = t
                .get_mut(&KeyRef::Str(category))
                .and_then(|c| c.get_mut(statics::KEY_GROUP))
                .and_then(LuaValue::as_table_mut);
            Ok(groups.and_then(|g| remove_sequence_entry(g, index)))
        })?;
        if removed.is_none() {
            return Err(Error::MissingField {
                path: self.node.describe(&[category, statics::KEY_GROUP]) + &format!("[{index}]"),
            });
        }
        tracing::info!(country = %self.node.describe(&[]), category, index, "group removed");
        self.node.touch();
        Ok(())
    }
}
