use super::node::Node;
use crate::error::Result;
use crate::statics::{
    KEY_ATMOSPHERE_TYPE, KEY_CLOUD_BASE, KEY_CLOUD_DENSITY, KEY_CLOUD_THICKNESS, KEY_CLOUDS,
    KEY_DISTANCE, KEY_DUST_DENSITY, KEY_ENABLE_DUST, KEY_ENABLE_FOG, KEY_FOG, KEY_FOG_THICKNESS,
    KEY_FOG_VISIBILITY, KEY_GROUND_TURBULENCE, KEY_PRECIPITATIONS, KEY_QNH, KEY_SEASON,
    KEY_TEMPERATURE, KEY_VISIBILITY, KEY_WIND, KEY_WIND_DIR, KEY_WIND_SPEED,
};
use crate::validator::{ValidationError, Validator};
use crate::value::{LuaValue, ValueKind};
use std::fmt;
use std::sync::LazyLock;

fn bounded(min: i64, max: i64) -> Validator {
    Validator::new()
        .kind(ValueKind::Integer)
        .min(min as f64)
        .max(max as f64)
        .logged()
}

static PRECIPITATIONS: LazyLock<Validator> = LazyLock::new(|| bounded(0, 4));
static CLOUD_DENSITY: LazyLock<Validator> = LazyLock::new(|| bounded(0, 10));
static CLOUD_BASE: LazyLock<Validator> = LazyLock::new(|| bounded(300, 5000));
static CLOUD_THICKNESS: LazyLock<Validator> = LazyLock::new(|| bounded(200, 2000));
static TEMPERATURE: LazyLock<Validator> = LazyLock::new(|| bounded(-50, 50));
static TURBULENCE: LazyLock<Validator> = LazyLock::new(|| bounded(0, 60));
static WIND_SPEED: LazyLock<Validator> = LazyLock::new(|| bounded(0, 50));
static WIND_DIR: LazyLock<Validator> = LazyLock::new(|| bounded(0, 359));
static QNH: LazyLock<Validator> = LazyLock::new(|| bounded(720, 790));
static VISIBILITY: LazyLock<Validator> = LazyLock::new(|| bounded(0, 800_000));
static FOG_THICKNESS: LazyLock<Validator> = LazyLock::new(|| bounded(0, 1000));
static FOG_VISIBILITY: LazyLock<Validator> = LazyLock::new(|| bounded(0, 6000));
static DUST_DENSITY: LazyLock<Validator> = LazyLock::new(|| bounded(300, 3000));
static ATMOSPHERE_TYPE: LazyLock<Validator> = LazyLock::new(|| bounded(0, 1));

/// Precipitation codes as stored in `iprecptns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precipitation {
    None = 0,
    Rain = 1,
    Thunderstorm = 2,
    Snow = 3,
    Snowstorm = 4,
}

impl Precipitation {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Precipitation::None),
            1 => Some(Precipitation::Rain),
            2 => Some(Precipitation::Thunderstorm),
            3 => Some(Precipitation::Snow),
            4 => Some(Precipitation::Snowstorm),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    fn is_storm(self) -> bool {
        matches!(self, Precipitation::Thunderstorm | Precipitation::Snowstorm)
    }

    fn is_snow(self) -> bool {
        matches!(self, Precipitation::Snow | Precipitation::Snowstorm)
    }

    fn is_rain(self) -> bool {
        matches!(self, Precipitation::Rain | Precipitation::Thunderstorm)
    }
}

/// Altitude band of a wind layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindLevel {
    Ground,
    At2000,
    At8000,
}

impl WindLevel {
    pub const ALL: [WindLevel; 3] = [WindLevel::Ground, WindLevel::At2000, WindLevel::At8000];

    pub fn as_str(self) -> &'static str {
        match self {
            WindLevel::Ground => "atGround",
            WindLevel::At2000 => "at2000",
            WindLevel::At8000 => "at8000",
        }
    }
}

impl fmt::Display for WindLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mission weather. All fields are integers checked against fixed ranges; precipitation is
/// additionally coupled to cloud density and temperature.
#[derive(Debug, Clone)]
pub struct Weather {
    node: Node,
}

impl Weather {
    pub(crate) fn new(node: Node) -> Self {
        Self { node }
    }

    pub fn precipitations(&self) -> Result<i64> {
        self.node.get(&[KEY_CLOUDS, KEY_PRECIPITATIONS])
    }

    /// Set the precipitation code (0 none, 1 rain, 2 thunderstorm, 3 snow, 4 snowstorm).
    ///
    /// Any precipitation needs a cloud density of at least 5 and storms need 9; snow needs a
    /// temperature below zero and rain one at or above zero.
    pub fn set_precipitations(&self, code: i64) -> Result<()> {
        PRECIPITATIONS.validate(&LuaValue::from(code), "precipitations")?;
        let Some(kind) = Precipitation::from_code(code) else {
            return Ok(());
        };
        if kind != Precipitation::None {
            let density = self.cloud_density()?;
            let needed = if kind.is_storm() { 9 } else { 5 };
            if density < needed {
                return Err(coupling(code, format!("needs a cloud density of at least {needed}, current is {density}")));
            }
            let temperature = self.temperature()?;
            if kind.is_snow() && temperature >= 0 {
                return Err(coupling(code, format!("snow needs a temperature below 0, current is {temperature}")));
            }
            if kind.is_rain() && temperature < 0 {
                return Err(coupling(code, format!("rain needs a temperature of 0 or more, current is {temperature}")));
            }
        }
        self.node
            .set(&[KEY_CLOUDS, KEY_PRECIPITATIONS], LuaValue::from(code))
    }

    pub fn cloud_density(&self) -> Result<i64> {
        self.node.get(&[KEY_CLOUDS, KEY_CLOUD_DENSITY])
    }

    pub fn set_cloud_density(&self, density: i64) -> Result<()> {
        self.node.set_checked(
            &[KEY_CLOUDS, KEY_CLOUD_DENSITY],
            "cloud_density",
            LuaValue::from(density),
            &CLOUD_DENSITY,
        )
    }

    pub fn cloud_base(&self) -> Result<i64> {
        self.node.get(&[KEY_CLOUDS, KEY_CLOUD_BASE])
    }

    pub fn set_cloud_base(&self, meters: i64) -> Result<()> {
        self.node.set_checked(
            &[KEY_CLOUDS, KEY_CLOUD_BASE],
            "cloud_base",
            LuaValue::from(meters),
            &CLOUD_BASE,
        )
    }

    pub fn cloud_thickness(&self) -> Result<i64> {
        self.node.get(&[KEY_CLOUDS, KEY_CLOUD_THICKNESS])
    }

    pub fn set_cloud_thickness(&self, meters: i64) -> Result<()> {
        self.node.set_checked(
            &[KEY_CLOUDS, KEY_CLOUD_THICKNESS],
            "cloud_thickness",
            LuaValue::from(meters),
            &CLOUD_THICKNESS,
        )
    }

    pub fn temperature(&self) -> Result<i64> {
        self.node.get(&[KEY_SEASON, KEY_TEMPERATURE])
    }

    /// Set the temperature in °C. Going below zero turns rain into snow; zero or above turns
    /// snow into rain, so snow only ever exists below zero. The adjusted precipitation is
    /// written as is, without re-checking cloud density.
    pub fn set_temperature(&self, celsius: i64) -> Result<()> {
        TEMPERATURE.validate(&LuaValue::from(celsius), "temperature")?;
        let current = Precipitation::from_code(self.precipitations()?);
        let adjusted = match current {
            Some(Precipitation::Rain) if celsius < 0 => Some(Precipitation::Snow),
            Some(Precipitation::Thunderstorm) if celsius < 0 => Some(Precipitation::Snowstorm),
            Some(Precipitation::Snow) if celsius >= 0 => Some(Precipitation::Rain),
            Some(Precipitation::Snowstorm) if celsius >= 0 => Some(Precipitation::Thunderstorm),
            _ => None,
        };
        self.node
            .set(&[KEY_SEASON, KEY_TEMPERATURE], LuaValue::from(celsius))?;
        if let Some(adjusted) = adjusted {
            tracing::info!(celsius, from = ?current, to = ?adjusted, "precipitation adjusted to temperature");
            self.node
                .set(&[KEY_CLOUDS, KEY_PRECIPITATIONS], LuaValue::from(adjusted.code()))?;
        }
        Ok(())
    }

    pub fn turbulence(&self) -> Result<i64> {
        self.node.get(&[KEY_GROUND_TURBULENCE])
    }

    pub fn set_turbulence(&self, value: i64) -> Result<()> {
        self.node.set_checked(
            &[KEY_GROUND_TURBULENCE],
            "turbulence",
            LuaValue::from(value),
            &TURBULENCE,
        )
    }

    pub fn wind_speed(&self, level: WindLevel) -> Result<i64> {
        self.node.get(&[KEY_WIND, level.as_str(), KEY_WIND_SPEED])
    }

    pub fn set_wind_speed(&self, level: WindLevel, speed: i64) -> Result<()> {
        self.node.set_checked(
            &[KEY_WIND, level.as_str(), KEY_WIND_SPEED],
            "wind_speed",
            LuaValue::from(speed),
            &WIND_SPEED,
        )
    }

    pub fn wind_direction(&self, level: WindLevel) -> Result<i64> {
        self.node.get(&[KEY_WIND, level.as_str(), KEY_WIND_DIR])
    }

    pub fn set_wind_direction(&self, level: WindLevel, degrees: i64) -> Result<()> {
        self.node.set_checked(
            &[KEY_WIND, level.as_str(), KEY_WIND_DIR],
            "wind_direction",
            LuaValue::from(degrees),
            &WIND_DIR,
        )
    }

    /// Sea-level pressure in mmHg.
    pub fn qnh(&self) -> Result<i64> {
        self.node.get(&[KEY_QNH])
    }

    pub fn set_qnh(&self, mmhg: i64) -> Result<()> {
        self.node
            .set_checked(&[KEY_QNH], "qnh", LuaValue::from(mmhg), &QNH)
    }

    pub fn visibility(&self) -> Result<i64> {
        self.node.get(&[KEY_VISIBILITY, KEY_DISTANCE])
    }

    pub fn set_visibility(&self, meters: i64) -> Result<()> {
        self.node.set_checked(
            &[KEY_VISIBILITY, KEY_DISTANCE],
            "visibility",
            LuaValue::from(meters),
            &VISIBILITY,
        )
    }

    pub fn fog_enabled(&self) -> Result<bool> {
        self.node.get(&[KEY_ENABLE_FOG])
    }

    pub fn set_fog_enabled(&self, enabled: bool) -> Result<()> {
        self.node.set(&[KEY_ENABLE_FOG], LuaValue::from(enabled))
    }

    pub fn fog_thickness(&self) -> Result<i64> {
        self.node.get(&[KEY_FOG, KEY_FOG_THICKNESS])
    }

    pub fn set_fog_thickness(&self, meters: i64) -> Result<()> {
        self.node.set_checked(
            &[KEY_FOG, KEY_FOG_THICKNESS],
            "fog_thickness",
            LuaValue::from(meters),
            &FOG_THICKNESS,
        )
    }

    pub fn fog_visibility(&self) -> Result<i64> {
        self.node.get(&[KEY_FOG, KEY_FOG_VISIBILITY])
    }

    pub fn set_fog_visibility(&self, meters: i64) -> Result<()> {
        self.node.set_checked(
            &[KEY_FOG, KEY_FOG_VISIBILITY],
            "fog_visibility",
            LuaValue::from(meters),
            &FOG_VISIBILITY,
        )
    }

    pub fn dust_enabled(&self) -> Result<bool> {
        self.node.get(&[KEY_ENABLE_DUST])
    }

    pub fn set_dust_enabled(&self, enabled: bool) -> Result<()> {
        self.node.set(&[KEY_ENABLE_DUST], LuaValue::from(enabled))
    }

    pub fn dust_density(&self) -> Result<i64> {
        self.node.get(&[KEY_DUST_DENSITY])
    }

    pub fn set_dust_density(&self, density: i64) -> Result<()> {
        self.node.set_checked(
            &[KEY_DUST_DENSITY],
            "dust_density",
            LuaValue::from(density),
            &DUST_DENSITY,
        )
    }

    /// 0 for static weather, 1 for dynamic.
    pub fn atmosphere_type(&self) -> Result<i64> {
        self.node.get(&[KEY_ATMOSPHERE_TYPE])
    }

    pub fn set_atmosphere_type(&self, value: i64) -> Result<()> {
        self.node.set_checked(
            &[KEY_ATMOSPHERE_TYPE],
            "atmosphere_type",
            LuaValue::from(value),
            &ATMOSPHERE_TYPE,
        )
    }
}

fn coupling(code: i64, cause: String) -> crate::error::Error {
    tracing::error!(field = "precipitations", code, %cause, "validation failed");
    ValidationError {
        field: "precipitations".to_string(),
        cause: format!("{code} {cause}"),
    }
    .into()
}
