use super::node::{Node, SharedMemo, new_memo};
use super::{Category, UnitKind, check_id, check_name, ensure_unique_id};
use crate::error::{Error, IdKind, Result};
use crate::statics;
use crate::validator::{ValueClass, Validator};
use crate::value::{KeyRef, LuaKey, LuaValue, ValueKind, remove_sequence_entry};
use std::sync::LazyLock;

static NAME: LazyLock<Validator> = LazyLock::new(|| {
    Validator::new()
        .kind(ValueKind::String)
        .pattern(r"\S")
        .logged()
});
static ID: LazyLock<Validator> = LazyLock::new(|| {
    Validator::new()
        .kind(ValueKind::Integer)
        .min(1.0)
        .logged()
});
static START_TIME: LazyLock<Validator> = LazyLock::new(|| {
    Validator::new()
        .kind(ValueKind::Integer)
        .min(0.0)
        .logged()
});
static FREQUENCY: LazyLock<Validator> = LazyLock::new(|| {
    Validator::new()
        .instance_of(ValueClass::Number)
        .min(1.0)
        .max(400.0)
        .logged()
});
static COORDINATE: LazyLock<Validator> =
    LazyLock::new(|| Validator::new().instance_of(ValueClass::Number).logged());

/// One group of units, located by category and slot within its country.
#[derive(Debug, Clone)]
pub struct Group {
    node: Node,
    category: Category,
    units: SharedMemo<LuaKey, UnitKind>,
}

impl Group {
    pub(crate) fn new(node: Node, category: Category) -> Self {
        Self {
            node,
            category,
            units: new_memo(),
        }
    }

    pub(crate) fn node(&self) -> &Node {
        &self.node
    }

    /// Slot of this group in its country's category sequence.
    pub fn index(&self) -> Option<i64> {
        self.node.last_key().and_then(LuaKey::as_int)
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn name(&self) -> Result<String> {
        self.node.get(&[statics::KEY_NAME])
    }

    pub fn set_name(&self, name: &str) -> Result<()> {
        self.node
            .set_checked(&[statics::KEY_NAME], "group name", LuaValue::from(name), &NAME)?;
        self.node.touch();
        Ok(())
    }

    pub fn id(&self) -> Result<i64> {
        self.node.get(&[statics::KEY_GROUP_ID])
    }

    /// Change the group id. Fails if another group already uses it.
    pub fn set_id(&self, id: i64) -> Result<()> {
        ID.validate(&LuaValue::from(id), "group id")?;
        let current = self.node.get_opt::<i64>(&[statics::KEY_GROUP_ID])?;
        ensure_unique_id(&self.node, IdKind::Group, id, current)?;
        self.node.set(&[statics::KEY_GROUP_ID], LuaValue::from(id))?;
        self.node.touch();
        Ok(())
    }

    pub fn hidden(&self) -> Result<bool> {
        self.node.get(&[statics::KEY_HIDDEN])
    }

    pub fn set_hidden(&self, hidden: bool) -> Result<()> {
        self.node.set(&[statics::KEY_HIDDEN], LuaValue::from(hidden))
    }

    pub fn start_time(&self) -> Result<i64> {
        self.node.get(&[statics::KEY_START_TIME])
    }

    pub fn set_start_time(&self, seconds: i64) -> Result<()> {
        self.node.set_checked(
            &[statics::KEY_START_TIME],
            "group start_time",
            LuaValue::from(seconds),
            &START_TIME,
        )
    }

    /// Absent means the group spawns at mission start.
    pub fn late_activation(&self) -> Result<bool> {
        Ok(self
            .node
            .get_opt(&[statics::KEY_LATE_ACTIVATION])?
            .unwrap_or(false))
    }

    pub fn set_late_activation(&self, late: bool) -> Result<()> {
        self.node
            .set(&[statics::KEY_LATE_ACTIVATION], LuaValue::from(late))
    }

    pub fn uncontrolled(&self) -> Result<bool> {
        Ok(self
            .node
            .get_opt(&[statics::KEY_UNCONTROLLED])?
            .unwrap_or(false))
    }

    pub fn set_uncontrolled(&self, uncontrolled: bool) -> Result<()> {
        self.node
            .set(&[statics::KEY_UNCONTROLLED], LuaValue::from(uncontrolled))
    }

    /// Group radio frequency in MHz. Only flying groups carry one.
    pub fn frequency(&self) -> Result<f64> {
        self.require_flying()?;
        self.node.get(&[statics::KEY_FREQUENCY])
    }

    pub fn set_frequency(&self, mhz: f64) -> Result<()> {
        self.require_flying()?;
        self.node.set_checked(
            &[statics::KEY_FREQUENCY],
            "group frequency",
            LuaValue::from(mhz),
            &FREQUENCY,
        )
    }

    fn require_flying(&self) -> Result<()> {
        if self.category.is_flying() {
            Ok(())
        } else {
            Err(Error::type_mismatch(
                self.node.describe(&[statics::KEY_FREQUENCY]),
                "flying group",
                self.category.as_str(),
            ))
        }
    }

    pub fn task(&self) -> Result<String> {
        self.node.get(&[statics::KEY_TASK])
    }

    pub fn position(&self) -> Result<(f64, f64)> {
        Ok((
            self.node.get(&[statics::KEY_X])?,
            self.node.get(&[statics::KEY_Y])?,
        ))
    }

    pub fn set_position(&self, x: f64, y: f64) -> Result<()> {
        self.node
            .set_checked(&[statics::KEY_X], "group x", LuaValue::from(x), &COORDINATE)?;
        self.node
            .set_checked(&[statics::KEY_Y], "group y", LuaValue::from(y), &COORDINATE)
    }

    /// Number of units in the group.
    pub fn size(&self) -> Result<usize> {
        Ok(self.node.keys_of(&[statics::KEY_UNITS])?.len())
    }

    pub fn units(&self) -> Result<Vec<UnitKind>> {
        let generation = self.node.generation();
        let keys = self.node.keys_of(&[statics::KEY_UNITS])?;
        let mut memo = self.units.borrow_mut();
        Ok(keys
            .into_iter()
            .map(|key| {
                memo.get_or_insert_with(generation, key.clone(), || {
                    let node = self
                        .node
                        .child([LuaKey::from(statics::KEY_UNITS), key]);
                    UnitKind::new(node, self.category)
                })
            })
            .collect())
    }

    /// Unit at 1-based `index` within the group.
    pub fn get_unit_by_index(&self, index: i64) -> Result<Option<UnitKind>> {
        check_id(index, "unit index")?;
        let target = LuaKey::Int(index);
        Ok(self
            .units()?
            .into_iter()
            .find(|u| u.base().node().last_key() == Some(&target)))
    }

    pub fn get_unit_by_name(&self, name: &str) -> Result<Option<UnitKind>> {
        check_name(name, "unit name")?;
        for unit in self.units()? {
            if unit.base().name()? == name {
                return Ok(Some(unit));
            }
        }
        Ok(None)
    }

    pub fn get_unit_by_id(&self, id: i64) -> Result<Option<UnitKind>> {
        check_id(id, "unit id")?;
        for unit in self.units()? {
            if unit.base().id()? == id {
                return Ok(Some(unit));
            }
        }
        Ok(None)
    }

    /// Whether any unit of the group is flown by a client.
    pub fn is_client_group(&self) -> Result<bool> {
        for unit in self.units()? {
            if unit.base().skill()? == statics::SKILL_CLIENT {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Delete `unit` from this group; later units move up one slot.
    pub fn remove_unit(&self, unit: &UnitKind) -> Result<()> {
        let node = unit.base().node();
        let index = node
            .last_key()
            .and_then(LuaKey::as_int)
            .filter(|_| node.is_within(&self.node));
        let Some(index) = index else {
            return Err(Error::MissingField {
                path: self.node.describe(&[statics::KEY_UNITS]),
            });
        };
        let removed = self.node.write(|t| {
            let units = t
                .get_mut(&KeyRef::Str(statics::KEY_UNITS))
                .and_then(LuaValue::as_table_mut);
            Ok(units.and_then(|u| remove_sequence_entry(u, index)))
        })?;
        if removed.is_none() {
            return Err(Error::MissingField {
                path: self.node.describe(&[statics::KEY_UNITS]) + &format!("[{index}]"),
            });
        }
        tracing::info!(group = %self.node.describe(&[]), index, "unit removed");
        self.node.touch();
        Ok(())
    }
}
