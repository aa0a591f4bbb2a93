//! Map coordinate conversion
//!
//! Mission positions are flat meters on a per-theatre transverse Mercator grid, with `x`
//! pointing north and `y` pointing east. This module converts them to and from WGS84
//! latitude/longitude.

use std::fmt;

const SEMI_MAJOR: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_223_563;
const SCALE: f64 = 0.9996;

/// Theatres with a known grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theatre {
    Caucasus,
    Nevada,
    Normandy,
    PersianGulf,
    TheChannel,
    Syria,
    MarianaIslands,
}

impl Theatre {
    pub const ALL: [Theatre; 7] = [
        Theatre::Caucasus,
        Theatre::Nevada,
        Theatre::Normandy,
        Theatre::PersianGulf,
        Theatre::TheChannel,
        Theatre::Syria,
        Theatre::MarianaIslands,
    ];

    /// Name as written in the mission's `theatre` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Theatre::Caucasus => "Caucasus",
            Theatre::Nevada => "Nevada",
            Theatre::Normandy => "Normandy",
            Theatre::PersianGulf => "PersianGulf",
            Theatre::TheChannel => "TheChannel",
            Theatre::Syria => "Syria",
            Theatre::MarianaIslands => "MarianaIslands",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    // (central meridian, false easting, false northing)
    fn grid(self) -> (f64, f64, f64) {
        match self {
            Theatre::Caucasus => (33.0, -99_516.999_999_973_2, -4_998_114.999_999_984),
            Theatre::Nevada => (-117.0, -193_996.809_999_645_48, -4_410_028.063_999_966),
            Theatre::Normandy => (-3.0, -195_526.000_000_002_04, -5_484_812.999_999_951),
            Theatre::PersianGulf => (57.0, 75_755.999_999_996_45, -2_894_933.000_000_037_7),
            Theatre::TheChannel => (3.0, 99_376.000_000_002_88, -5_636_889.000_000_01),
            Theatre::Syria => (39.0, 282_801.000_000_039_93, -3_879_865.999_999_999_5),
            Theatre::MarianaIslands => (147.0, 238_417.999_999_899_68, -1_491_840.000_000_048),
        }
    }
}

impl fmt::Display for Theatre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transverse Mercator grid of one theatre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub theatre: Theatre,
    central_meridian: f64,
    false_easting: f64,
    false_northing: f64,
}

impl Projection {
    pub fn new(theatre: Theatre) -> Self {
        let (central_meridian, false_easting, false_northing) = theatre.grid();
        Self {
            theatre,
            central_meridian,
            false_easting,
            false_northing,
        }
    }

    /// Projection for a mission `theatre` value, or `None` for unknown theatres.
    pub fn for_theatre(name: &str) -> Option<Self> {
        Theatre::from_name(name).map(Self::new)
    }

    /// Grid position (x north, y east) to (latitude, longitude) in degrees.
    pub fn to_lat_lon(&self, x: f64, y: f64) -> (f64, f64) {
        let e2 = eccentricity_squared();
        let ep2 = e2 / (1.0 - e2);
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let m = (x - self.false_northing) / SCALE;
        let mu = m / (SEMI_MAJOR * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin1, cos1) = phi1.sin_cos();
        let tan1 = phi1.tan();
        let c1 = ep2 * cos1.powi(2);
        let t1 = tan1.powi(2);
        let n1 = SEMI_MAJOR / (1.0 - e2 * sin1.powi(2)).sqrt();
        let r1 = SEMI_MAJOR * (1.0 - e2) / (1.0 - e2 * sin1.powi(2)).powf(1.5);
        let d = (y - self.false_easting) / (n1 * SCALE);

        let lat = phi1
            - (n1 * tan1 / r1)
                * (d.powi(2) / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2) - 252.0 * ep2 - 3.0 * c1.powi(2))
                        * d.powi(6)
                        / 720.0);
        let lon = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2)) * d.powi(5)
                / 120.0)
            / cos1;

        (lat.to_degrees(), self.central_meridian + lon.to_degrees())
    }

    /// (latitude, longitude) in degrees to grid position (x north, y east).
    pub fn from_lat_lon(&self, lat: f64, lon: f64) -> (f64, f64) {
        let e2 = eccentricity_squared();
        let ep2 = e2 / (1.0 - e2);

        let phi = lat.to_radians();
        let (sin, cos) = phi.sin_cos();
        let n = SEMI_MAJOR / (1.0 - e2 * sin.powi(2)).sqrt();
        let t = phi.tan().powi(2);
        let c = ep2 * cos.powi(2);
        let a = (lon - self.central_meridian).to_radians() * cos;
        let m = meridian_arc(phi, e2);

        let easting = SCALE
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0);
        let northing = SCALE
            * (m + n
                * phi.tan()
                * (a.powi(2) / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));

        (northing + self.false_northing, easting + self.false_easting)
    }
}

fn eccentricity_squared() -> f64 {
    FLATTENING * (2.0 - FLATTENING)
}

/// Distance along the meridian from the equator to latitude `phi` (radians).
fn meridian_arc(phi: f64, e2: f64) -> f64 {
    let e4 = e2.powi(2);
    let e6 = e2.powi(3);
    SEMI_MAJOR
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}
