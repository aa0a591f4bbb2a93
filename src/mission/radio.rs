use super::node::Node;
use crate::error::Result;
use crate::statics;
use crate::validator::{ValueClass, Validator};
use crate::value::{LuaKey, LuaValue, ValueKind};

/// Fixed characteristics of one radio set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadioSpec {
    pub name: &'static str,
    /// Lowest tunable frequency, MHz.
    pub min: f64,
    /// Highest tunable frequency, MHz.
    pub max: f64,
    pub channels_qty: i64,
}

const fn radio(name: &'static str, min: f64, max: f64, channels_qty: i64) -> RadioSpec {
    RadioSpec {
        name,
        min,
        max,
        channels_qty,
    }
}

// Aircraft whose client slots carry editable preset tables, keyed by radio slot.
static RADIOS: &[(&str, &[(i64, RadioSpec)])] = &[
    (
        "Ka-50",
        &[(1, radio("R-828", 20.0, 59.9, 10)), (2, radio("ARK-22", 0.15, 1.75, 16))],
    ),
    (
        "Mi-8MT",
        &[(1, radio("R-863", 100.0, 399.9, 20)), (2, radio("R-828", 20.0, 59.9, 10))],
    ),
    ("UH-1H", &[(1, radio("AN/ARC-51BX", 225.0, 399.975, 20))]),
    ("F-86F Sabre", &[(1, radio("ARC-27", 225.0, 399.9, 18))]),
    (
        "M-2000C",
        &[(1, radio("UHF", 225.0, 400.0, 20)), (2, radio("V/UHF", 118.0, 400.0, 20))],
    ),
    ("MiG-21Bis", &[(1, radio("R-832", 80.0, 399.9, 20))]),
    ("P-51D", &[(1, radio("SCR-522", 100.0, 156.0, 4))]),
    ("TF-51D", &[(1, radio("SCR-522", 100.0, 156.0, 4))]),
    ("SpitfireLFMkIX", &[(1, radio("A.R.I. 1063", 100.0, 156.0, 4))]),
    ("Bf-109K-4", &[(1, radio("FuG 16ZY", 38.0, 156.0, 5))]),
    ("FW-190D9", &[(1, radio("FuG 16ZY", 38.0, 156.0, 5))]),
    ("F-5E-3", &[(1, radio("AN/ARC-164", 225.0, 399.975, 20))]),
    (
        "AV8BNA",
        &[(1, radio("COMM1", 30.0, 400.0, 26)), (2, radio("COMM2", 30.0, 400.0, 26))],
    ),
];

/// Radio slots of `unit_type`, or `None` for aircraft without preset tables.
pub fn radio_specs(unit_type: &str) -> Option<&'static [(i64, RadioSpec)]> {
    RADIOS
        .iter()
        .find(|(t, _)| *t == unit_type)
        .map(|(_, specs)| *specs)
}

/// Channel → frequency table of one radio on one flying unit.
#[derive(Debug, Clone)]
pub struct RadioPresets {
    node: Node,
    slot: i64,
    spec: &'static RadioSpec,
}

impl RadioPresets {
    pub(crate) fn new(node: Node, slot: i64, spec: &'static RadioSpec) -> Self {
        Self { node, slot, spec }
    }

    pub fn slot(&self) -> i64 {
        self.slot
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn min(&self) -> f64 {
        self.spec.min
    }

    pub fn max(&self) -> f64 {
        self.spec.max
    }

    pub fn channels_qty(&self) -> i64 {
        self.spec.channels_qty
    }

    /// All preset channels in file order, as (channel, MHz).
    pub fn channels(&self) -> Result<Vec<(i64, f64)>> {
        self.node.read(|t| {
            let Some(channels) = t
                .get(&LuaKey::from(statics::KEY_CHANNELS))
                .and_then(LuaValue::as_table)
            else {
                return Ok(Vec::new());
            };
            Ok(channels
                .iter()
                .filter_map(|(k, v)| Some((k.as_int()?, v.as_f64()?)))
                .collect())
        })
    }

    fn check_channel(&self, channel: i64) -> Result<()> {
        Validator::new()
            .kind(ValueKind::Integer)
            .min(1.0)
            .max(self.spec.channels_qty as f64)
            .logged()
            .validate(&LuaValue::from(channel), "radio channel")?;
        Ok(())
    }

    pub fn frequency(&self, channel: i64) -> Result<f64> {
        self.check_channel(channel)?;
        self.node.read(|t| {
            let value = t
                .get(&LuaKey::from(statics::KEY_CHANNELS))
                .and_then(|c| c.get(channel));
            value.and_then(LuaValue::as_f64).ok_or_else(|| crate::error::Error::MissingField {
                path: self.node.describe(&[statics::KEY_CHANNELS]) + &format!("[{channel}]"),
            })
        })
    }

    pub fn set_frequency(&self, channel: i64, mhz: f64) -> Result<()> {
        self.check_channel(channel)?;
        Validator::new()
            .instance_of(ValueClass::Number)
            .min(self.spec.min)
            .max(self.spec.max)
            .logged()
            .validate(&LuaValue::from(mhz), "radio frequency")?;
        self.node.write(|t| {
            let channels = t
                .get_mut(&LuaKey::from(statics::KEY_CHANNELS))
                .and_then(LuaValue::as_table_mut)
                .ok_or_else(|| crate::error::Error::MissingField {
                    path: self.node.describe(&[statics::KEY_CHANNELS]),
                })?;
            channels.insert(LuaKey::Int(channel), LuaValue::from(mhz));
            Ok(())
        })
    }
}
