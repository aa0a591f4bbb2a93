//! Validated views over a decoded mission tree.
//!
//! Views hold no copies of the data: each one carries a handle to the shared store and the
//! key path of its sub-table, and re-resolves that path on every access. Lookups by name or
//! id are memoized per view and dropped whenever a structural or identity change bumps the
//! store generation.

mod coalition;
mod country;
mod ground_control;
mod group;
mod node;
mod radio;
mod unit;
mod weather;

pub use coalition::Coalition;
pub use country::Country;
pub use ground_control::{GroundControl, Role};
pub use group::Group;
pub use radio::{RadioPresets, RadioSpec, radio_specs};
pub use unit::{BaseUnit, FlyingUnit, UnitKind};
pub use weather::{Precipitation, Weather, WindLevel};

use crate::coord::Projection;
use crate::error::{Error, IdKind, Result};
use crate::statics;
use crate::validator::Validator;
use crate::value::{KeyRef, LuaTable, LuaValue, ValueKind};
use chrono::{DateTime, NaiveDateTime};
use node::{Node, SharedMemo, new_memo};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

pub(crate) use node::{SharedStore, new_store};

/// One of the two opposing sides of a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Blue,
    Red,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Blue, Side::Red];

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Blue => "blue",
            Side::Red => "red",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Group categories, in the order the host writes them inside a country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Helicopter,
    Plane,
    Ship,
    Vehicle,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Helicopter,
        Category::Plane,
        Category::Ship,
        Category::Vehicle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Helicopter => "helicopter",
            Category::Plane => "plane",
            Category::Ship => "ship",
            Category::Vehicle => "vehicle",
        }
    }

    pub fn is_flying(self) -> bool {
        matches!(self, Category::Helicopter | Category::Plane)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CATEGORY_QUERY.validate(&LuaValue::from(s), "category")?;
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::type_mismatch("category", "group category", s))
    }
}

// Query validators: a malformed query raises before any search happens.
static NAME_QUERY: LazyLock<Validator> =
    LazyLock::new(|| Validator::new().kind(ValueKind::String).pattern(r"\S"));
static ID_QUERY: LazyLock<Validator> =
    LazyLock::new(|| Validator::new().kind(ValueKind::Integer).min(1.0));
static COUNTRY_ID_QUERY: LazyLock<Validator> =
    LazyLock::new(|| Validator::new().kind(ValueKind::Integer).min(0.0));
static CATEGORY_QUERY: LazyLock<Validator> = LazyLock::new(|| {
    Validator::new()
        .kind(ValueKind::String)
        .one_of(Category::ALL.map(Category::as_str))
});

static START_TIME: LazyLock<Validator> = LazyLock::new(|| {
    Validator::new()
        .kind(ValueKind::Integer)
        .min(0.0)
        .logged()
});
static START_DATE: LazyLock<Validator> = LazyLock::new(|| {
    Validator::new()
        .kind(ValueKind::String)
        .pattern(r"^\d{2}/\d{2}/\d{4} \d{2}:\d{2}:\d{2}$")
        .logged()
});
static TEXT: LazyLock<Validator> = LazyLock::new(|| Validator::new().kind(ValueKind::String));

pub(crate) fn check_name(name: &str, field: &str) -> Result<()> {
    NAME_QUERY.validate(&LuaValue::from(name), field)?;
    Ok(())
}

pub(crate) fn check_id(id: i64, field: &str) -> Result<()> {
    ID_QUERY.validate(&LuaValue::from(id), field)?;
    Ok(())
}

pub(crate) fn check_country_id(id: i64) -> Result<()> {
    COUNTRY_ID_QUERY.validate(&LuaValue::from(id), "country id")?;
    Ok(())
}

fn str_key(key: &'static str) -> KeyRef<'static> {
    KeyRef::Str(key)
}

/// Every group or unit id in the tree, in file order, duplicates included.
pub(crate) fn collect_ids(mission: &LuaTable, kind: IdKind) -> Vec<i64> {
    let mut ids = Vec::new();
    let Some(coalitions) = mission
        .get(&str_key(statics::KEY_COALITION))
        .and_then(LuaValue::as_table)
    else {
        return ids;
    };
    let countries = coalitions
        .values()
        .filter_map(|c| c.get(statics::KEY_COUNTRY))
        .filter_map(LuaValue::as_table)
        .flat_map(|t| t.values());
    for country in countries {
        for category in Category::ALL {
            let groups = country
                .get(category.as_str())
                .and_then(|c| c.get(statics::KEY_GROUP))
                .and_then(LuaValue::as_table);
            for group in groups.into_iter().flat_map(|t| t.values()) {
                match kind {
                    IdKind::Group => ids.extend(group.get(statics::KEY_GROUP_ID).and_then(LuaValue::as_i64)),
                    IdKind::Unit => {
                        let units = group.get(statics::KEY_UNITS).and_then(LuaValue::as_table);
                        ids.extend(
                            units
                                .into_iter()
                                .flat_map(|t| t.values())
                                .filter_map(|u| u.get(statics::KEY_UNIT_ID))
                                .filter_map(LuaValue::as_i64),
                        );
                    }
                }
            }
        }
    }
    ids
}

/// Highest id plus one, or an error on the first id seen twice.
pub(crate) fn next_id(ids: &[i64], kind: IdKind) -> Result<i64> {
    let mut seen = HashSet::with_capacity(ids.len());
    for &id in ids {
        if !seen.insert(id) {
            return Err(Error::DuplicateId { kind, id });
        }
    }
    Ok(ids.iter().copied().max().unwrap_or(0) + 1)
}

/// Fail if `id` is already taken by an entity other than the one holding `current`.
pub(crate) fn ensure_unique_id(node: &Node, kind: IdKind, id: i64, current: Option<i64>) -> Result<()> {
    if current == Some(id) {
        return Ok(());
    }
    let taken = node.with_mission(|m| collect_ids(m, kind).contains(&id));
    if taken {
        return Err(Error::DuplicateId { kind, id });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Query {
    Id(i64),
    Name(String),
}

/// Root of the mission model.
#[derive(Debug, Clone)]
pub struct Mission {
    node: Node,
    blue: Coalition,
    red: Coalition,
    groups: SharedMemo<Query, Group>,
    units: SharedMemo<Query, UnitKind>,
}

impl Mission {
    pub(crate) fn new(store: SharedStore) -> Self {
        let node = Node::root(store);
        Self {
            blue: Coalition::new(&node, Side::Blue),
            red: Coalition::new(&node, Side::Red),
            node,
            groups: new_memo(),
            units: new_memo(),
        }
    }

    /// Build a mission directly from decoded mission and dictionary trees.
    pub fn from_tables(mission: LuaTable, l10n: LuaTable) -> Self {
        Self::new(new_store(mission, l10n))
    }

    pub(crate) fn store(&self) -> &SharedStore {
        self.node.store()
    }

    /// Run `f` against the current mission and dictionary trees.
    pub fn with_tables<R>(&self, f: impl FnOnce(&LuaTable, &LuaTable) -> R) -> R {
        let store = self.store().borrow();
        f(&store.mission, &store.l10n)
    }

    pub fn weather(&self) -> Weather {
        Weather::new(self.node.child([statics::KEY_WEATHER]))
    }

    pub fn ground_control(&self) -> GroundControl {
        GroundControl::new(self.node.child([statics::KEY_GROUND_CONTROL]))
    }

    pub fn blue(&self) -> &Coalition {
        &self.blue
    }

    pub fn red(&self) -> &Coalition {
        &self.red
    }

    pub fn coalition(&self, side: Side) -> &Coalition {
        match side {
            Side::Blue => &self.blue,
            Side::Red => &self.red,
        }
    }

    pub fn coalitions(&self) -> [&Coalition; 2] {
        [&self.blue, &self.red]
    }

    pub fn theatre(&self) -> Result<String> {
        self.node.get(&[statics::KEY_THEATRE])
    }

    /// Projection for this mission's theatre, if the theatre is known.
    pub fn projection(&self) -> Result<Option<Projection>> {
        Ok(Projection::for_theatre(&self.theatre()?))
    }

    /// Mission start as seconds since the Unix epoch, read as UTC by
    /// [`Mission::start_time_as_date`].
    pub fn start_time(&self) -> Result<i64> {
        self.node.get(&[statics::KEY_START_TIME])
    }

    pub fn set_start_time(&self, seconds: i64) -> Result<()> {
        self.node.set_checked(
            &[statics::KEY_START_TIME],
            "start_time",
            LuaValue::from(seconds),
            &START_TIME,
        )
    }

    /// `start_time` rendered as a calendar date (UTC, counted from the Unix epoch).
    pub fn start_time_as_date(&self) -> Result<String> {
        let seconds = self.start_time()?;
        let date = DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
            Error::type_mismatch("start_time", "representable timestamp", seconds.to_string())
        })?;
        Ok(date.format(statics::START_DATE_FORMAT).to_string())
    }

    pub fn set_start_time_as_date(&self, date: &str) -> Result<()> {
        START_DATE.validate(&LuaValue::from(date), "start_time_as_date")?;
        let parsed = NaiveDateTime::parse_from_str(date, statics::START_DATE_FORMAT).map_err(|e| {
            crate::validator::ValidationError {
                field: "start_time_as_date".to_string(),
                cause: format!("{date:?} is not a valid date: {e}"),
            }
        })?;
        self.set_start_time(parsed.and_utc().timestamp())
    }

    fn dictionary_text(&self, key: &str) -> Result<String> {
        let dict_key: String = self.node.get(&[key])?;
        self.node.l10n_text(&dict_key)
    }

    fn set_dictionary_text(&self, key: &str, field: &str, text: &str) -> Result<()> {
        TEXT.validate(&LuaValue::from(text), field)?;
        let dict_key: String = self.node.get(&[key])?;
        self.node.set_l10n_text(&dict_key, text)
    }

    pub fn sortie(&self) -> Result<String> {
        self.dictionary_text(statics::KEY_SORTIE)
    }

    pub fn set_sortie(&self, text: &str) -> Result<()> {
        self.set_dictionary_text(statics::KEY_SORTIE, "sortie", text)
    }

    pub fn description_text(&self) -> Result<String> {
        self.dictionary_text(statics::KEY_DESCRIPTION_TEXT)
    }

    pub fn set_description_text(&self, text: &str) -> Result<()> {
        self.set_dictionary_text(statics::KEY_DESCRIPTION_TEXT, "description_text", text)
    }

    pub fn description_blue_task(&self) -> Result<String> {
        self.dictionary_text(statics::KEY_DESCRIPTION_BLUE)
    }

    pub fn set_description_blue_task(&self, text: &str) -> Result<()> {
        self.set_dictionary_text(statics::KEY_DESCRIPTION_BLUE, "description_blue_task", text)
    }

    pub fn description_red_task(&self) -> Result<String> {
        self.dictionary_text(statics::KEY_DESCRIPTION_RED)
    }

    pub fn set_description_red_task(&self, text: &str) -> Result<()> {
        self.set_dictionary_text(statics::KEY_DESCRIPTION_RED, "description_red_task", text)
    }

    pub fn groups(&self) -> Result<Vec<Group>> {
        let mut groups = self.blue.groups()?;
        groups.extend(self.red.groups()?);
        Ok(groups)
    }

    pub fn units(&self) -> Result<Vec<UnitKind>> {
        let mut units = Vec::new();
        for group in self.groups()? {
            units.extend(group.units()?);
        }
        Ok(units)
    }

    pub fn get_groups_from_category(&self, category: &str) -> Result<Vec<Group>> {
        let mut groups = self.blue.get_groups_from_category(category)?;
        groups.extend(self.red.get_groups_from_category(category)?);
        Ok(groups)
    }

    /// Groups with at least one client-controlled unit.
    pub fn get_clients_groups(&self) -> Result<Vec<Group>> {
        let mut clients = Vec::new();
        for group in self.groups()? {
            if group.is_client_group()? {
                clients.push(group);
            }
        }
        Ok(clients)
    }

    fn cached_group(&self, query: Query, find: impl FnOnce() -> Result<Option<Group>>) -> Result<Option<Group>> {
        let generation = self.node.generation();
        if let Some(hit) = self.groups.borrow_mut().get(generation, &query) {
            return Ok(Some(hit));
        }
        let found = find()?;
        if let Some(group) = &found {
            self.groups.borrow_mut().insert(generation, query, group.clone());
        }
        Ok(found)
    }

    pub fn get_group_by_id(&self, id: i64) -> Result<Option<Group>> {
        check_id(id, "group id")?;
        self.cached_group(Query::Id(id), || {
            for coalition in self.coalitions() {
                if let Some(group) = coalition.get_group_by_id(id)? {
                    return Ok(Some(group));
                }
            }
            Ok(None)
        })
    }

    pub fn get_group_by_name(&self, name: &str) -> Result<Option<Group>> {
        check_name(name, "group name")?;
        self.cached_group(Query::Name(name.to_string()), || {
            for coalition in self.coalitions() {
                if let Some(group) = coalition.get_group_by_name(name)? {
                    return Ok(Some(group));
                }
            }
            Ok(None)
        })
    }

    fn cached_unit(&self, query: Query, find: impl FnOnce() -> Result<Option<UnitKind>>) -> Result<Option<UnitKind>> {
        let generation = self.node.generation();
        if let Some(hit) = self.units.borrow_mut().get(generation, &query) {
            return Ok(Some(hit));
        }
        let found = find()?;
        if let Some(unit) = &found {
            self.units.borrow_mut().insert(generation, query, unit.clone());
        }
        Ok(found)
    }

    pub fn get_unit_by_id(&self, id: i64) -> Result<Option<UnitKind>> {
        check_id(id, "unit id")?;
        self.cached_unit(Query::Id(id), || {
            for coalition in self.coalitions() {
                if let Some(unit) = coalition.get_unit_by_id(id)? {
                    return Ok(Some(unit));
                }
            }
            Ok(None)
        })
    }

    pub fn get_unit_by_name(&self, name: &str) -> Result<Option<UnitKind>> {
        check_name(name, "unit name")?;
        self.cached_unit(Query::Name(name.to_string()), || {
            for coalition in self.coalitions() {
                if let Some(unit) = coalition.get_unit_by_name(name)? {
                    return Ok(Some(unit));
                }
            }
            Ok(None)
        })
    }

    pub fn get_country_by_name(&self, name: &str) -> Result<Option<Country>> {
        for coalition in self.coalitions() {
            if let Some(country) = coalition.get_country_by_name(name)? {
                return Ok(Some(country));
            }
        }
        Ok(None)
    }

    pub fn get_country_by_id(&self, id: i64) -> Result<Option<Country>> {
        for coalition in self.coalitions() {
            if let Some(country) = coalition.get_country_by_id(id)? {
                return Ok(Some(country));
            }
        }
        Ok(None)
    }

    /// Next free group id. Fails if the mission already holds a duplicate.
    pub fn next_group_id(&self) -> Result<i64> {
        self.node
            .with_mission(|m| next_id(&collect_ids(m, IdKind::Group), IdKind::Group))
    }

    /// Next free unit id. Fails if the mission already holds a duplicate.
    pub fn next_unit_id(&self) -> Result<i64> {
        self.node
            .with_mission(|m| next_id(&collect_ids(m, IdKind::Unit), IdKind::Unit))
    }

    /// Drop every memoized lookup, e.g. after editing the tree behind the model's back.
    pub fn invalidate_caches(&self) {
        self.node.touch();
    }
}
