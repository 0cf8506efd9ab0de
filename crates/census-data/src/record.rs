//! Typed census attribute records.
//!
//! GeoJSON feature properties arrive as a loose JSON map. Each feature's
//! attributes are resolved into a `CensusRecord` exactly once at load time;
//! everything downstream (styling, popups, the JSON API) reads the typed
//! fields instead of doing per-access key lookups.

use serde::Serialize;
use serde_json::{Map, Value};

/// Attribute keys as they appear in the source GeoJSON.
pub const KEY_NAME: &str = "Name";
pub const KEY_TOTAL_2014: &str = "Total_2014";
pub const KEY_TOTAL_2024: &str = "Total_2024";
pub const KEY_GROWTH_RATE: &str = "Growth_rate";
pub const KEY_DENSITY_2024: &str = "Popa_dens_2024";

/// One district's census attributes. Every field is optional: the schema is
/// conventional, not enforced, and absent values degrade to defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CensusRecord {
    /// District name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Population total, 2014 census.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_2014: Option<f64>,
    /// Population total, 2024 census.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_2024: Option<f64>,
    /// Population growth rate 2014 to 2024, signed percentage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<f64>,
    /// Population density 2024, people per square kilometer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density_2024: Option<f64>,
}

impl CensusRecord {
    /// Resolve a record from a GeoJSON properties map.
    ///
    /// Numbers are taken as-is; strings that parse as numbers are coerced
    /// (the source data carries some numeric columns as text); anything
    /// else resolves to `None`.
    pub fn from_properties(props: &Map<String, Value>) -> Self {
        Self {
            name: props.get(KEY_NAME).and_then(string_value),
            total_2014: props.get(KEY_TOTAL_2014).and_then(numeric_value),
            total_2024: props.get(KEY_TOTAL_2024).and_then(numeric_value),
            growth_rate: props.get(KEY_GROWTH_RATE).and_then(numeric_value),
            density_2024: props.get(KEY_DENSITY_2024).and_then(numeric_value),
        }
    }

    /// Name if present and non-empty.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|s| !s.is_empty())
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        // "NaN"/"inf" parse as floats but are not usable attribute values.
        Value::String(s) => s.trim().parse().ok().filter(|v: &f64| v.is_finite()),
        _ => None,
    }
}

fn string_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
