use super::node::Node;
use super::radio::{RadioPresets, radio_specs};
use super::{Category, ensure_unique_id};
use crate::coord::Projection;
use crate::error::{Error, IdKind, Result};
use crate::parking::ParkingSpot;
use crate::statics;
use crate::validator::{ValueClass, Validator};
use crate::value::{LuaKey, LuaValue, ValueKind};
use std::f64::consts::TAU;
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
static SKILL: LazyLock<Validator> = LazyLock::new(|| {
    Validator::new()
        .kind(ValueKind::String)
        .one_of(statics::SKILLS)
        .logged()
});
static COORDINATE: LazyLock<Validator> =
    LazyLock::new(|| Validator::new().instance_of(ValueClass::Number).logged());
static HEADING: LazyLock<Validator> = LazyLock::new(|| {
    Validator::new()
        .instance_of(ValueClass::Number)
        .min(0.0)
        .max(TAU)
        .logged()
});
static LIVERY: LazyLock<Validator> =
    LazyLock::new(|| Validator::new().kind(ValueKind::String).logged());
static ONBOARD_NUM: LazyLock<Validator> = LazyLock::new(|| {
    Validator::new()
        .kind(ValueKind::String)
        .pattern(r"^\d{3}$")
        .logged()
});
static NON_NEGATIVE: LazyLock<Validator> = LazyLock::new(|| {
    Validator::new()
        .instance_of(ValueClass::Number)
        .min(0.0)
        .logged()
});

/// Fields every unit carries, whatever its category.
#[derive(Debug, Clone)]
pub struct BaseUnit {
    node: Node,
    category: Category,
}

impl BaseUnit {
    pub(crate) fn node(&self) -> &Node {
        &self.node
    }

    /// Slot of this unit within its group.
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
            .set_checked(&[statics::KEY_NAME], "unit name", LuaValue::from(name), &NAME)?;
        self.node.touch();
        Ok(())
    }

    pub fn id(&self) -> Result<i64> {
        self.node.get(&[statics::KEY_UNIT_ID])
    }

    /// Change the unit id. Fails if another unit already uses it.
    pub fn set_id(&self, id: i64) -> Result<()> {
        ID.validate(&LuaValue::from(id), "unit id")?;
        let current = self.node.get_opt::<i64>(&[statics::KEY_UNIT_ID])?;
        ensure_unique_id(&self.node, IdKind::Unit, id, current)?;
        self.node.set(&[statics::KEY_UNIT_ID], LuaValue::from(id))?;
        self.node.touch();
        Ok(())
    }

    pub fn unit_type(&self) -> Result<String> {
        self.node.get(&[statics::KEY_TYPE])
    }

    pub fn set_unit_type(&self, unit_type: &str) -> Result<()> {
        self.node.set_checked(
            &[statics::KEY_TYPE],
            "unit type",
            LuaValue::from(unit_type),
            &NAME,
        )
    }

    pub fn skill(&self) -> Result<String> {
        self.node.get(&[statics::KEY_SKILL])
    }

    pub fn set_skill(&self, skill: &str) -> Result<()> {
        self.node
            .set_checked(&[statics::KEY_SKILL], "skill", LuaValue::from(skill), &SKILL)
    }

    pub fn position(&self) -> Result<(f64, f64)> {
        Ok((
            self.node.get(&[statics::KEY_X])?,
            self.node.get(&[statics::KEY_Y])?,
        ))
    }

    pub fn set_position(&self, x: f64, y: f64) -> Result<()> {
        self.node
            .set_checked(&[statics::KEY_X], "unit x", LuaValue::from(x), &COORDINATE)?;
        self.node
            .set_checked(&[statics::KEY_Y], "unit y", LuaValue::from(y), &COORDINATE)
    }

    /// Position as (latitude, longitude) degrees.
    pub fn lat_lon(&self, projection: &Projection) -> Result<(f64, f64)> {
        let (x, y) = self.position()?;
        Ok(projection.to_lat_lon(x, y))
    }

    /// Heading in radians.
    pub fn heading(&self) -> Result<f64> {
        self.node.get(&[statics::KEY_HEADING])
    }

    pub fn set_heading(&self, radians: f64) -> Result<()> {
        self.node.set_checked(
            &[statics::KEY_HEADING],
            "heading",
            LuaValue::from(radians),
            &HEADING,
        )
    }
}

/// A helicopter or plane: a [`BaseUnit`] plus flight and radio fields.
#[derive(Debug, Clone)]
pub struct FlyingUnit {
    base: BaseUnit,
}

impl FlyingUnit {
    pub fn base(&self) -> &BaseUnit {
        &self.base
    }

    fn node(&self) -> &Node {
        &self.base.node
    }

    pub fn livery(&self) -> Result<String> {
        self.node().get(&[statics::KEY_LIVERY])
    }

    pub fn set_livery(&self, livery: &str) -> Result<()> {
        self.node()
            .set_checked(&[statics::KEY_LIVERY], "livery", LuaValue::from(livery), &LIVERY)
    }

    pub fn onboard_num(&self) -> Result<String> {
        self.node().get(&[statics::KEY_ONBOARD_NUM])
    }

    /// Three-digit side number, e.g. `"010"`.
    pub fn set_onboard_num(&self, number: &str) -> Result<()> {
        self.node().set_checked(
            &[statics::KEY_ONBOARD_NUM],
            "onboard_num",
            LuaValue::from(number),
            &ONBOARD_NUM,
        )
    }

    // The host writes parking slots as strings or plain integers.
    fn parking_field(&self, key: &str) -> Result<Option<String>> {
        match self.node().get_value(&[key])? {
            None => Ok(None),
            Some(LuaValue::String(s)) => Ok(Some(s)),
            Some(v) => match v.as_i64() {
                Some(i) => Ok(Some(i.to_string())),
                None => Err(Error::type_mismatch(
                    self.node().describe(&[key]),
                    "string or integer",
                    v.type_name(),
                )),
            },
        }
    }

    fn set_parking_field(&self, key: &str, value: &str) -> Result<()> {
        let as_int = matches!(
            self.node().get_value(&[key])?,
            Some(LuaValue::Number(_))
        );
        let value = match value.parse::<i64>() {
            Ok(i) if as_int => LuaValue::from(i),
            _ => LuaValue::from(value),
        };
        self.node().set(&[key], value)
    }

    pub fn parking(&self) -> Result<Option<String>> {
        self.parking_field(statics::KEY_PARKING)
    }

    pub fn parking_id(&self) -> Result<Option<String>> {
        self.parking_field(statics::KEY_PARKING_ID)
    }

    /// Altitude in meters.
    pub fn altitude(&self) -> Result<f64> {
        self.node().get(&[statics::KEY_ALT])
    }

    pub fn set_altitude(&self, meters: f64) -> Result<()> {
        self.node().set_checked(
            &[statics::KEY_ALT],
            "altitude",
            LuaValue::from(meters),
            &NON_NEGATIVE,
        )
    }

    /// Speed in meters per second.
    pub fn speed(&self) -> Result<f64> {
        self.node().get(&[statics::KEY_SPEED])
    }

    pub fn set_speed(&self, mps: f64) -> Result<()> {
        self.node().set_checked(
            &[statics::KEY_SPEED],
            "speed",
            LuaValue::from(mps),
            &NON_NEGATIVE,
        )
    }

    /// Preset tables present on this unit, for aircraft types with known radios.
    pub fn radio_presets(&self) -> Result<Vec<RadioPresets>> {
        let unit_type = self.base.unit_type()?;
        let Some(specs) = radio_specs(&unit_type) else {
            return Ok(Vec::new());
        };
        let present = self.node().keys_of(&[statics::KEY_RADIO])?;
        Ok(specs
            .iter()
            .filter(|(slot, _)| present.contains(&LuaKey::Int(*slot)))
            .map(|(slot, spec)| RadioPresets::new(self.radio_node(*slot), *slot, spec))
            .collect())
    }

    /// Preset table of radio `slot`.
    pub fn radio(&self, slot: i64) -> Result<RadioPresets> {
        let unit_type = self.base.unit_type()?;
        let specs = radio_specs(&unit_type).ok_or_else(|| {
            Error::type_mismatch(
                self.node().describe(&[statics::KEY_RADIO]),
                "aircraft with radio presets",
                unit_type.clone(),
            )
        })?;
        let slots = Validator::new()
            .kind(ValueKind::Integer)
            .one_of(specs.iter().map(|(s, _)| *s));
        slots.validate(&LuaValue::from(slot), "radio slot")?;
        let spec = specs
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, spec)| spec)
            .ok_or_else(|| Error::MissingField {
                path: self.node().describe(&[statics::KEY_RADIO]) + &format!("[{slot}]"),
            })?;
        Ok(RadioPresets::new(self.radio_node(slot), slot, spec))
    }

    pub fn radio_by_name(&self, name: &str) -> Result<Option<RadioPresets>> {
        let unit_type = self.base.unit_type()?;
        let Some(specs) = radio_specs(&unit_type) else {
            return Ok(None);
        };
        Ok(specs
            .iter()
            .find(|(_, spec)| spec.name == name)
            .map(|(slot, spec)| RadioPresets::new(self.radio_node(*slot), *slot, spec)))
    }

    fn radio_node(&self, slot: i64) -> Node {
        self.node()
            .child([LuaKey::from(statics::KEY_RADIO), LuaKey::Int(slot)])
    }

    /// Move the unit onto `spot`, taking over its position and parking identifiers.
    pub fn snap_to_parking(&self, spot: &ParkingSpot) -> Result<()> {
        self.set_parking_field(statics::KEY_PARKING, &spot.index.to_string())?;
        self.set_parking_field(statics::KEY_PARKING_ID, &spot.label)?;
        self.base.set_position(spot.x, spot.y)?;
        tracing::debug!(unit = %self.node().describe(&[]), spot = spot.index, label = %spot.label, "snapped to parking");
        Ok(())
    }
}

/// A unit view, typed by the category of the group holding it.
#[derive(Debug, Clone)]
pub enum UnitKind {
    Helicopter(FlyingUnit),
    Plane(FlyingUnit),
    Vehicle(BaseUnit),
    Ship(BaseUnit),
}

impl UnitKind {
    pub(crate) fn new(node: Node, category: Category) -> Self {
        let base = BaseUnit { node, category };
        match category {
            Category::Helicopter => UnitKind::Helicopter(FlyingUnit { base }),
            Category::Plane => UnitKind::Plane(FlyingUnit { base }),
            Category::Vehicle => UnitKind::Vehicle(base),
            Category::Ship => UnitKind::Ship(base),
        }
    }

    pub fn base(&self) -> &BaseUnit {
        match self {
            UnitKind::Helicopter(u) | UnitKind::Plane(u) => &u.base,
            UnitKind::Vehicle(u) | UnitKind::Ship(u) => u,
        }
    }

    pub fn as_flying(&self) -> Option<&FlyingUnit> {
        match self {
            UnitKind::Helicopter(u) | UnitKind::Plane(u) => Some(u),
            UnitKind::Vehicle(_) | UnitKind::Ship(_) => None,
        }
    }

    pub fn category(&self) -> Category {
        self.base().category
    }
}
