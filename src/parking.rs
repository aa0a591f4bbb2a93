//! Airfield parking spots and matching unit positions against them.

/// One parking position of an airfield.
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingSpot {
    /// Numeric slot written to a unit's `parking` field.
    pub index: i64,
    /// Label written to a unit's `parking_id` field, e.g. `"G21"`.
    pub label: String,
    pub x: f64,
    pub y: f64,
}

impl ParkingSpot {
    pub fn new(index: i64, label: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            index,
            label: label.into(),
            x,
            y,
        }
    }

    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        (self.x - x).hypot(self.y - y)
    }
}

/// Closest spot to (`x`, `y`) no further than `tolerance` meters. Ties go to the earlier spot.
pub fn nearest_spot(spots: &[ParkingSpot], x: f64, y: f64, tolerance: f64) -> Option<&ParkingSpot> {
    let mut best: Option<(&ParkingSpot, f64)> = None;
    for spot in spots {
        let distance = spot.distance_to(x, y);
        if distance > tolerance {
            continue;
        }
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((spot, distance)),
        }
    }
    best.map(|(spot, _)| spot)
}

#[cfg(test)]
mod tests {
    use super::{ParkingSpot, nearest_spot};

    fn apron() -> Vec<ParkingSpot> {
        vec![
            ParkingSpot::new(1, "01", 0.0, 0.0),
            ParkingSpot::new(2, "02", 30.0, 0.0),
            ParkingSpot::new(3, "03", 0.0, 30.0),
        ]
    }

    #[test]
    fn picks_closest_within_tolerance() {
        let spots = apron();
        assert_eq!(nearest_spot(&spots, 25.0, 1.0, 10.0).map(|s| s.index), Some(2));
        assert_eq!(nearest_spot(&spots, 100.0, 100.0, 10.0), None);
    }

    #[test]
    fn ties_go_to_first_spot() {
        let spots = apron();
        assert_eq!(nearest_spot(&spots, 15.0, 0.0, 20.0).map(|s| s.index), Some(1));
    }
}
