use crate::value::{LuaValue, ValueKind};
use regex::Regex;
use std::path::Path;
use thiserror::Error;

/// A field constraint failed. Carries the field name and a human-readable cause.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid value for `{field}`: {cause}")]
pub struct ValidationError {
    pub field: String,
    pub cause: String,
}

/// Broad value classes for instance-of checks (an integer *is a* number).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    Number,
    Scalar,
}

impl ValueClass {
    fn admits(self, kind: ValueKind) -> bool {
        match self {
            ValueClass::Number => matches!(kind, ValueKind::Integer | ValueKind::Float),
            ValueClass::Scalar => kind != ValueKind::Table,
        }
    }

    fn name(self) -> &'static str {
        match self {
            ValueClass::Number => "number",
            ValueClass::Scalar => "scalar",
        }
    }
}

/// Reusable predicate bundle checked before any model field is written.
///
/// ```
/// use mizkit::validator::Validator;
/// use mizkit::value::{LuaValue, ValueKind};
///
/// let density = Validator::new().kind(ValueKind::Integer).min(0.0).max(10.0);
/// assert!(density.validate(&LuaValue::from(10_i64), "cloud_density").is_ok());
/// assert!(density.validate(&LuaValue::from(11_i64), "cloud_density").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Validator {
    kind: Option<ValueKind>,
    class: Option<ValueClass>,
    min: Option<f64>,
    max: Option<f64>,
    pattern: Option<Result<Regex, regex::Error>>,
    one_of: Option<Vec<LuaValue>>,
    path_exists: bool,
    logged: bool,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require exactly this value kind.
    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Require a value belonging to this class.
    pub fn instance_of(mut self, class: ValueClass) -> Self {
        self.class = Some(class);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Require string values to match `pattern`. An invalid pattern fails every value.
    pub fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(Regex::new(pattern));
        self
    }

    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<LuaValue>,
    {
        self.one_of = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Require string values to name an existing filesystem path.
    pub fn path_exists(mut self) -> Self {
        self.path_exists = true;
        self
    }

    /// Log failures at error level before returning them.
    pub fn logged(mut self) -> Self {
        self.logged = true;
        self
    }

    pub fn validate(&self, value: &LuaValue, field: &str) -> Result<(), ValidationError> {
        match self.check(value) {
            None => Ok(()),
            Some(cause) => {
                if self.logged {
                    tracing::error!(field, %cause, "validation failed");
                }
                Err(ValidationError {
                    field: field.to_string(),
                    cause,
                })
            }
        }
    }

    fn check(&self, value: &LuaValue) -> Option<String> {
        let shown = display(value);
        if let Some(kind) = self.kind {
            if value.kind() != kind {
                return Some(format!("expected {kind}, got {} ({shown})", value.kind()));
            }
        }
        if let Some(class) = self.class {
            if !class.admits(value.kind()) {
                return Some(format!("expected a {}, got {} ({shown})", class.name(), value.kind()));
            }
        }
        if self.min.is_some() || self.max.is_some() {
            let Some(n) = value.as_f64() else {
                return Some(format!("expected a number, got {} ({shown})", value.kind()));
            };
            if !n.is_finite() {
                return Some(format!("{shown} is not a finite number"));
            }
            if let Some(min) = self.min {
                if n < min {
                    return Some(format!("{shown} is under the minimum of {min}"));
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    return Some(format!("{shown} is over the maximum of {max}"));
                }
            }
        }
        if let Some(pattern) = &self.pattern {
            let pattern = match pattern {
                Ok(pattern) => pattern,
                Err(e) => return Some(format!("unusable pattern: {e}")),
            };
            match value.as_str() {
                Some(s) if pattern.is_match(s) => {}
                _ => return Some(format!("{shown} does not match `{}`", pattern.as_str())),
            }
        }
        if let Some(allowed) = &self.one_of {
            if !allowed.contains(value) {
                let list: Vec<String> = allowed.iter().map(display).collect();
                return Some(format!("{shown} is not one of [{}]", list.join(", ")));
            }
        }
        if self.path_exists {
            match value.as_str() {
                Some(s) if Path::new(s).exists() => {}
                _ => return Some(format!("{shown} does not exist")),
            }
        }
        None
    }
}

fn display(value: &LuaValue) -> String {
    match value {
        LuaValue::Nil => "nil".to_string(),
        LuaValue::Bool(b) => b.to_string(),
        LuaValue::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64().to_string(),
        },
        LuaValue::String(s) => format!("{s:?}"),
        LuaValue::Table(t) => format!("table of {} entries", t.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::{ValueClass, Validator};
    use crate::value::{LuaValue, ValueKind};

    #[test]
    fn bounds_are_inclusive() {
        let v = Validator::new().kind(ValueKind::Integer).min(200.0).max(2000.0);
        assert!(v.validate(&LuaValue::from(200_i64), "cloud_thickness").is_ok());
        assert!(v.validate(&LuaValue::from(2000_i64), "cloud_thickness").is_ok());

        let err = v.validate(&LuaValue::from(199_i64), "cloud_thickness").unwrap_err();
        assert_eq!(err.field, "cloud_thickness");
        assert!(err.cause.contains("minimum"), "{err}");
        assert!(v.validate(&LuaValue::from(2001_i64), "cloud_thickness").is_err());
    }

    #[test]
    fn bounds_reject_non_finite_numbers() {
        let v = Validator::new().instance_of(ValueClass::Number).min(20.0).max(59.9);
        for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = v.validate(&LuaValue::from(n), "frequency").unwrap_err();
            assert!(err.cause.contains("finite"), "{err}");
        }
        let open = Validator::new().instance_of(ValueClass::Number).min(0.0);
        assert!(open.validate(&LuaValue::from(f64::NAN), "altitude").is_err());
    }

    #[test]
    fn exact_kind_rejects_float_for_integer() {
        let v = Validator::new().kind(ValueKind::Integer);
        assert!(v.validate(&LuaValue::from(3.0_f64), "start_time").is_err());
        assert!(v.validate(&LuaValue::from("3"), "start_time").is_err());
    }

    #[test]
    fn instance_of_number_admits_both_kinds() {
        let v = Validator::new().instance_of(ValueClass::Number).min(0.15).max(1.75);
        assert!(v.validate(&LuaValue::from(1_i64), "freq").is_ok());
        assert!(v.validate(&LuaValue::from(0.15_f64), "freq").is_ok());
        assert!(v.validate(&LuaValue::from(true), "freq").is_err());
    }

    #[test]
    fn pattern_and_membership() {
        let onboard = Validator::new().pattern(r"^\d{3}$");
        assert!(onboard.validate(&LuaValue::from("010"), "onboard_num").is_ok());
        assert!(onboard.validate(&LuaValue::from("10a"), "onboard_num").is_err());
        assert!(onboard.validate(&LuaValue::from(10_i64), "onboard_num").is_err());

        let skill = Validator::new().one_of(["Average", "Good"]);
        assert!(skill.validate(&LuaValue::from("Good"), "skill").is_ok());
        let err = skill.validate(&LuaValue::from("Ace"), "skill").unwrap_err();
        assert!(err.cause.contains("\"Average\""), "{err}");
    }

    #[test]
    fn path_existence() {
        let dir = tempfile::tempdir().unwrap();
        let v = Validator::new().path_exists();
        let existing = dir.path().to_string_lossy().to_string();
        let missing = dir.path().join("nope").to_string_lossy().to_string();
        assert!(v.validate(&LuaValue::from(existing), "scratch").is_ok());
        assert!(v.validate(&LuaValue::from(missing), "scratch").is_err());
    }
}
