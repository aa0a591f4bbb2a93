use super::node::{Node, SharedMemo, new_memo};
use super::{Country, Group, Side, UnitKind, check_country_id, check_id, check_name};
use crate::error::Result;
use crate::statics;
use crate::validator::{ValueClass, Validator};
use crate::value::{LuaKey, LuaValue};
use std::sync::LazyLock;

static BULLSEYE: LazyLock<Validator> =
    LazyLock::new(|| Validator::new().instance_of(ValueClass::Number).logged());

/// One side of the mission and the countries fighting on it.
#[derive(Debug, Clone)]
pub struct Coalition {
    node: Node,
    side: Side,
    countries: SharedMemo<LuaKey, Country>,
    by_name: SharedMemo<String, Country>,
    by_id: SharedMemo<i64, Country>,
}

impl Coalition {
    pub(crate) fn new(root: &Node, side: Side) -> Self {
        Self {
            node: root.child([statics::KEY_COALITION, side.as_str()]),
            side,
            countries: new_memo(),
            by_name: new_memo(),
            by_id: new_memo(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn name(&self) -> Result<String> {
        self.node.get(&[statics::KEY_NAME])
    }

    pub fn bullseye(&self) -> Result<(f64, f64)> {
        Ok((
            self.node.get(&[statics::KEY_BULLSEYE, statics::KEY_X])?,
            self.node.get(&[statics::KEY_BULLSEYE, statics::KEY_Y])?,
        ))
    }

    pub fn set_bullseye(&self, x: f64, y: f64) -> Result<()> {
        BULLSEYE.validate(&LuaValue::from(x), "bullseye.x")?;
        BULLSEYE.validate(&LuaValue::from(y), "bullseye.y")?;
        self.node
            .set(&[statics::KEY_BULLSEYE, statics::KEY_X], LuaValue::from(x))?;
        self.node
            .set(&[statics::KEY_BULLSEYE, statics::KEY_Y], LuaValue::from(y))
    }

    pub fn countries(&self) -> Result<Vec<Country>> {
        let generation = self.node.generation();
        let keys = self.node.keys_of(&[statics::KEY_COUNTRY])?;
        let mut memo = self.countries.borrow_mut();
        Ok(keys
            .into_iter()
            .map(|key| {
                memo.get_or_insert_with(generation, key.clone(), || {
                    Country::new(self.node.child([LuaKey::from(statics::KEY_COUNTRY), key]), self.side)
                })
            })
            .collect())
    }

    pub fn get_country_by_name(&self, name: &str) -> Result<Option<Country>> {
        check_name(name, "country name")?;
        let generation = self.node.generation();
        if let Some(hit) = self.by_name.borrow_mut().get(generation, &name.to_string()) {
            return Ok(Some(hit));
        }
        for country in self.countries()? {
            if country.name()? == name {
                self.by_name
                    .borrow_mut()
                    .insert(generation, name.to_string(), country.clone());
                return Ok(Some(country));
            }
        }
        Ok(None)
    }

    pub fn get_country_by_id(&self, id: i64) -> Result<Option<Country>> {
        check_country_id(id)?;
        let generation = self.node.generation();
        if let Some(hit) = self.by_id.borrow_mut().get(generation, &id) {
            return Ok(Some(hit));
        }
        for country in self.countries()? {
            if country.id()? == id {
                self.by_id.borrow_mut().insert(generation, id, country.clone());
                return Ok(Some(country));
            }
        }
        Ok(None)
    }

    pub fn groups(&self) -> Result<Vec<Group>> {
        let mut groups = Vec::new();
        for country in self.countries()? {
            groups.extend(country.groups()?);
        }
        Ok(groups)
    }

    pub fn get_groups_from_category(&self, category: &str) -> Result<Vec<Group>> {
        let category = category.parse()?;
        let mut groups = Vec::new();
        for country in self.countries()? {
            groups.extend(country.groups_of(category)?);
        }
        Ok(groups)
    }

    pub fn get_group_by_id(&self, id: i64) -> Result<Option<Group>> {
        check_id(id, "group id")?;
        for country in self.countries()? {
            if let Some(group) = country.get_group_by_id(id)? {
                return Ok(Some(group));
            }
        }
        Ok(None)
    }

    pub fn get_group_by_name(&self, name: &str) -> Result<Option<Group>> {
        check_name(name, "group name")?;
        for country in self.countries()? {
            if let Some(group) = country.get_group_by_name(name)? {
                return Ok(Some(group));
            }
        }
        Ok(None)
    }

    pub fn get_unit_by_id(&self, id: i64) -> Result<Option<UnitKind>> {
        check_id(id, "unit id")?;
        for country in self.countries()? {
            if let Some(unit) = country.get_unit_by_id(id)? {
                return Ok(Some(unit));
            }
        }
        Ok(None)
    }

    pub fn get_unit_by_name(&self, name: &str) -> Result<Option<UnitKind>> {
        check_name(name, "unit name")?;
        for country in self.countries()? {
            if let Some(unit) = country.get_unit_by_name(name)? {
                return Ok(Some(unit));
            }
        }
        Ok(None)
    }
}
