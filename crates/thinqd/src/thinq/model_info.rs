//! Vendor model metadata.
//!
//! Every ThinQ device model ships a JSON document describing the values its
//! status and control keys can take. Two formats exist in the wild:
//!
//! - V1: `{"Value": {"OpMode": {"type": "Enum", "option": {"0": "@LABEL"}}}}`
//! - V2: `{"MonitoringValue": {"airState.opMode": {"dataType": "enum",
//!   "valueMapping": {"0": {"index": 0, "label": "@LABEL"}}}}}`
//!
//! Both are decoded into the same [`ModelValue`] shapes.

use std::collections::BTreeMap;

use serde_json::Value;

/// Format of a model info document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoVersion {
    V1,
    V2,
}

/// A decoded entry of a model's value table.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelValue {
    /// Raw value -> vendor label.
    Enum(BTreeMap<String, String>),

    /// Numeric range, inclusive on both ends.
    Range { min: f64, max: f64, step: f64 },

    /// Value types the adapter does not interpret (bit fields, references, ...).
    Other(String),
}

impl ModelValue {
    /// Enum options, if this is an enum value.
    pub fn options(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ModelValue::Enum(options) => Some(options),
            _ => None,
        }
    }
}

/// Model metadata for a single device model.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    data: Value,
    version: InfoVersion,
}

impl ModelInfo {
    pub fn new(data: Value) -> Self {
        let version = if data.get("MonitoringValue").is_some() {
            InfoVersion::V2
        } else {
            InfoVersion::V1
        };
        Self { data, version }
    }

    /// Parse a model info document from raw JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_slice(bytes)?))
    }

    pub fn version(&self) -> InfoVersion {
        self.version
    }

    pub fn is_info_v2(&self) -> bool {
        self.version == InfoVersion::V2
    }

    /// Look up and decode the value definition for `key`.
    pub fn value(&self, key: &str) -> Option<ModelValue> {
        match self.version {
            InfoVersion::V1 => parse_v1(self.data.get("Value")?.get(key)?),
            InfoVersion::V2 => parse_v2(self.data.get("MonitoringValue")?.get(key)?),
        }
    }

    /// Raw value for the enum option labelled `label`.
    pub fn enum_value(&self, key: &str, label: &str) -> Option<String> {
        let value = self.value(key)?;
        value
            .options()?
            .iter()
            .find(|(_, l)| l.as_str() == label)
            .map(|(raw, _)| raw.clone())
    }

    /// Label of the enum option stored under `raw`.
    pub fn enum_name(&self, key: &str, raw: &str) -> Option<String> {
        let value = self.value(key)?;
        value.options()?.get(raw).cloned()
    }
}

fn parse_v1(v: &Value) -> Option<ModelValue> {
    let kind = v.get("type")?.as_str()?;
    let option = v.get("option");
    match kind.to_ascii_lowercase().as_str() {
        "enum" => {
            let options = option?
                .as_object()?
                .iter()
                .filter_map(|(raw, label)| Some((raw.clone(), label.as_str()?.to_string())))
                .collect();
            Some(ModelValue::Enum(options))
        }
        "range" => parse_range(option?),
        other => Some(ModelValue::Other(other.to_string())),
    }
}

fn parse_v2(v: &Value) -> Option<ModelValue> {
    let kind = v.get("dataType")?.as_str()?;
    let mapping = v.get("valueMapping");
    match kind.to_ascii_lowercase().as_str() {
        "enum" => {
            let options = mapping?
                .as_object()?
                .iter()
                .filter_map(|(raw, entry)| {
                    // Entries are either {"index": .., "label": ..} or a bare label.
                    let label = match entry {
                        Value::Object(obj) => match obj.get("label").and_then(Value::as_str) {
                            Some(label) => label.to_string(),
                            None => raw.clone(),
                        },
                        Value::String(label) => label.clone(),
                        _ => return None,
                    };
                    Some((raw.clone(), label))
                })
                .collect();
            Some(ModelValue::Enum(options))
        }
        "range" => parse_range(mapping?),
        other => Some(ModelValue::Other(other.to_string())),
    }
}

fn parse_range(v: &Value) -> Option<ModelValue> {
    Some(ModelValue::Range {
        min: number(v.get("min")?)?,
        max: number(v.get("max")?)?,
        step: v.get("step").and_then(number).unwrap_or(1.0),
    })
}

/// Numbers in ThinQ documents arrive as JSON numbers or numeric strings.
pub(crate) fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
