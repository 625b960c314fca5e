//! Typed, range-constrained algorithm parameters.
//!
//! Every parameter an algorithm declares is a [`ParamSpec`]: a machine
//! name, a user-facing label and a [`ParamKind`] carrying the
//! kind-specific constraints. External values always arrive as strings
//! (query-string style); [`ParamSpec::bind`] parses and validates one
//! value into a [`ParamValue`]. Descriptors are immutable `'static` data;
//! bound values live in a per-invocation [`BoundValues`] map, so a
//! catalog entry never holds caller state.
//!
//! Kind dispatch is exhaustive `match` over the enum, both at bind time
//! and at catalog serialization, so adding a kind without handling it
//! everywhere is a compile error.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::area::Area;
use crate::error::TransformError;

#[derive(Debug, Clone, Copy)]
pub enum ParamKind {
    /// Integer constrained to `[min, max]`. `step` is UI metadata only.
    IntRange { min: i64, max: i64, step: i64 },
    /// Float constrained to `[min, max]`. `step` is UI metadata only.
    FloatRange { min: f64, max: f64, step: f64 },
    /// Boolean toggle (`"true"` / `"false"`).
    Flag,
    /// One of a fixed option set.
    Select { options: &'static [&'static str] },
    /// `#rrggbb` hex color.
    Color,
    /// Semicolon-delimited inclusive rectangle, see [`Area`].
    Region,
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: ParamKind,
}

/// A successfully bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Flag(bool),
    Select(&'static str),
    Color([u8; 3]),
    Region(Area),
}

impl ParamSpec {
    pub const fn new(name: &'static str, label: &'static str, kind: ParamKind) -> Self {
        ParamSpec { name, label, kind }
    }

    /// Parse and validate one external string value against this
    /// descriptor. Re-binding simply produces a fresh value; failures are
    /// always [`TransformError::ParameterInvalid`].
    pub fn bind(&self, raw: &str) -> Result<ParamValue, TransformError> {
        match self.kind {
            ParamKind::IntRange { min, max, .. } => {
                let v: i64 = raw
                    .parse()
                    .map_err(|_| TransformError::invalid_param(self.name, format!("'{raw}' is not an integer")))?;
                if v < min || v > max {
                    return Err(TransformError::invalid_param(
                        self.name,
                        format!("{v} is outside [{min}, {max}]"),
                    ));
                }
                Ok(ParamValue::Int(v))
            }
            ParamKind::FloatRange { min, max, .. } => {
                let v: f64 = raw
                    .parse()
                    .map_err(|_| TransformError::invalid_param(self.name, format!("'{raw}' is not a number")))?;
                if !v.is_finite() || v < min || v > max {
                    return Err(TransformError::invalid_param(
                        self.name,
                        format!("{v} is outside [{min}, {max}]"),
                    ));
                }
                Ok(ParamValue::Float(v))
            }
            ParamKind::Flag => match raw {
                "true" => Ok(ParamValue::Flag(true)),
                "false" => Ok(ParamValue::Flag(false)),
                _ => Err(TransformError::invalid_param(
                    self.name,
                    format!("'{raw}' is not a boolean"),
                )),
            },
            ParamKind::Select { options } => options
                .iter()
                .find(|o| **o == raw)
                .map(|o| ParamValue::Select(*o))
                .ok_or_else(|| {
                    TransformError::invalid_param(
                        self.name,
                        format!("'{raw}' is not one of {options:?}"),
                    )
                }),
            ParamKind::Color => {
                let rgb = parse_hex_color(raw).ok_or_else(|| {
                    TransformError::invalid_param(
                        self.name,
                        format!("'{raw}' is not a #rrggbb color"),
                    )
                })?;
                Ok(ParamValue::Color(rgb))
            }
            ParamKind::Region => raw
                .parse::<Area>()
                .map(ParamValue::Region)
                .map_err(|reason| TransformError::invalid_param(self.name, reason)),
        }
    }
}

fn parse_hex_color(raw: &str) -> Option<[u8; 3]> {
    let hex = raw.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

/// Bound values for one algorithm invocation, keyed by parameter machine
/// name. The typed getters return [`TransformError::Internal`] on a kind
/// mismatch: the registry binds values against the same descriptors the
/// transforms read them with, so a mismatch is a programming error, not a
/// caller error.
#[derive(Debug, Default)]
pub struct BoundValues {
    values: HashMap<&'static str, ParamValue>,
}

impl BoundValues {
    pub fn insert(&mut self, name: &'static str, value: ParamValue) {
        self.values.insert(name, value);
    }

    fn get(&self, name: &str) -> Result<&ParamValue, TransformError> {
        self.values
            .get(name)
            .ok_or_else(|| TransformError::MissingParameter(name.to_string()))
    }

    pub fn int(&self, name: &str) -> Result<i64, TransformError> {
        match self.get(name)? {
            ParamValue::Int(v) => Ok(*v),
            other => Err(kind_mismatch(name, "integer", other)),
        }
    }

    pub fn float(&self, name: &str) -> Result<f64, TransformError> {
        match self.get(name)? {
            ParamValue::Float(v) => Ok(*v),
            other => Err(kind_mismatch(name, "float", other)),
        }
    }

    pub fn flag(&self, name: &str) -> Result<bool, TransformError> {
        match self.get(name)? {
            ParamValue::Flag(v) => Ok(*v),
            other => Err(kind_mismatch(name, "flag", other)),
        }
    }

    pub fn select(&self, name: &str) -> Result<&'static str, TransformError> {
        match self.get(name)? {
            ParamValue::Select(v) => Ok(v),
            other => Err(kind_mismatch(name, "select", other)),
        }
    }

    pub fn color(&self, name: &str) -> Result<[u8; 3], TransformError> {
        match self.get(name)? {
            ParamValue::Color(v) => Ok(*v),
            other => Err(kind_mismatch(name, "color", other)),
        }
    }

    pub fn region(&self, name: &str) -> Result<Area, TransformError> {
        match self.get(name)? {
            ParamValue::Region(v) => Ok(*v),
            other => Err(kind_mismatch(name, "area", other)),
        }
    }
}

fn kind_mismatch(name: &str, wanted: &str, got: &ParamValue) -> TransformError {
    TransformError::Internal(format!(
        "parameter '{name}' bound as {got:?}, read as {wanted}"
    ))
}

impl Serialize for ParamSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", self.name)?;
        map.serialize_entry("label", self.label)?;
        match self.kind {
            ParamKind::IntRange { min, max, step } => {
                map.serialize_entry("type", "range")?;
                map.serialize_entry("min", &min)?;
                map.serialize_entry("max", &max)?;
                map.serialize_entry("step", &step)?;
            }
            ParamKind::FloatRange { min, max, step } => {
                map.serialize_entry("type", "range")?;
                map.serialize_entry("min", &min)?;
                map.serialize_entry("max", &max)?;
                map.serialize_entry("step", &step)?;
            }
            ParamKind::Flag => {
                map.serialize_entry("type", "boolean")?;
            }
            ParamKind::Select { options } => {
                map.serialize_entry("type", "select")?;
                map.serialize_entry("options", options)?;
            }
            ParamKind::Color => {
                map.serialize_entry("type", "color")?;
            }
            ParamKind::Region => {
                map.serialize_entry("type", "area")?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELTA: ParamSpec = ParamSpec::new(
        "delta",
        "Delta",
        ParamKind::IntRange {
            min: -255,
            max: 255,
            step: 1,
        },
    );

    #[test]
    fn int_binding_respects_range() {
        assert_eq!(DELTA.bind("40").unwrap(), ParamValue::Int(40));
        assert_eq!(DELTA.bind("-255").unwrap(), ParamValue::Int(-255));
        assert!(matches!(
            DELTA.bind("256"),
            Err(TransformError::ParameterInvalid { .. })
        ));
        assert!(matches!(
            DELTA.bind("abc"),
            Err(TransformError::ParameterInvalid { .. })
        ));
    }

    #[test]
    fn float_binding_rejects_non_finite() {
        let sigma = ParamSpec::new(
            "sigma",
            "Sigma",
            ParamKind::FloatRange {
                min: 0.1,
                max: 2.0,
                step: 0.1,
            },
        );
        assert_eq!(sigma.bind("0.5").unwrap(), ParamValue::Float(0.5));
        assert!(sigma.bind("NaN").is_err());
        assert!(sigma.bind("2.1").is_err());
    }

    #[test]
    fn select_binding_requires_membership() {
        let border = ParamSpec::new(
            "border",
            "Border",
            ParamKind::Select {
                options: &["skip", "zero"],
            },
        );
        assert_eq!(
            border.bind("zero").unwrap(),
            ParamValue::Select("zero")
        );
        assert!(border.bind("mirror").is_err());
        assert!(border.bind("ZERO").is_err());
    }

    #[test]
    fn color_binding_parses_hex() {
        let c = ParamSpec::new("color", "Color", ParamKind::Color);
        assert_eq!(c.bind("#ff8000").unwrap(), ParamValue::Color([255, 128, 0]));
        assert!(c.bind("ff8000").is_err());
        assert!(c.bind("#ff80").is_err());
        assert!(c.bind("#gg8000").is_err());
    }

    #[test]
    fn region_binding_wraps_parse_errors() {
        let a = ParamSpec::new("area", "Area", ParamKind::Region);
        assert_eq!(
            a.bind("1;2;3;4").unwrap(),
            ParamValue::Region(Area::new(1, 2, 3, 4))
        );
        assert!(matches!(
            a.bind("1;2;3"),
            Err(TransformError::ParameterInvalid { .. })
        ));
    }

    #[test]
    fn flag_binding_is_strict() {
        let f = ParamSpec::new("keep", "Keep", ParamKind::Flag);
        assert_eq!(f.bind("true").unwrap(), ParamValue::Flag(true));
        assert_eq!(f.bind("false").unwrap(), ParamValue::Flag(false));
        assert!(f.bind("1").is_err());
    }

    #[test]
    fn typed_getters_check_kind() {
        let mut bound = BoundValues::default();
        bound.insert("delta", ParamValue::Int(3));
        assert_eq!(bound.int("delta").unwrap(), 3);
        assert!(matches!(
            bound.float("delta"),
            Err(TransformError::Internal(_))
        ));
        assert!(matches!(
            bound.int("missing"),
            Err(TransformError::MissingParameter(_))
        ));
    }

    #[test]
    fn catalog_serialization_flattens_constraints() {
        let json = serde_json::to_value(DELTA).unwrap();
        assert_eq!(json["type"], "range");
        assert_eq!(json["min"], -255);
        assert_eq!(json["max"], 255);
        assert_eq!(json["step"], 1);

        let border = ParamSpec::new(
            "border",
            "Border",
            ParamKind::Select {
                options: &["skip", "zero"],
            },
        );
        let json = serde_json::to_value(border).unwrap();
        assert_eq!(json["type"], "select");
        assert_eq!(json["options"][1], "zero");
    }
}
