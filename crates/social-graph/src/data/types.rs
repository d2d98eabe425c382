//! Property values and element maps exchanged with the graph store

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key under which every element map carries the element identifier.
pub const ID_KEY: &str = "id";

/// Key under which every element map carries the element label.
pub const LABEL_KEY: &str = "label";

/// Flat key/value representation of a vertex or edge, as produced by the
/// store on read and consumed by the store on write.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A single property value stored on a vertex or edge.
///
/// `Map` only appears in element maps for the `IN`/`OUT` endpoint anchors of
/// an edge; stored properties are always scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    Map(PropertyMap),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&PropertyMap> {
        match self {
            PropertyValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Short name of the variant, used in mapping error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Integer(_) => "integer",
            PropertyValue::Float(_) => "float",
            PropertyValue::String(_) => "string",
            PropertyValue::Date(_) => "date",
            PropertyValue::Map(_) => "map",
        }
    }

    // Helper to convert a PropertyValue to Json
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PropertyValue::Null => serde_json::Value::Null,
            PropertyValue::Bool(b) => serde_json::Value::Bool(*b),
            PropertyValue::Integer(i) => serde_json::json!(i),
            PropertyValue::Float(f) => serde_json::json!(f),
            PropertyValue::String(s) => serde_json::Value::String(s.clone()),
            PropertyValue::Date(d) => serde_json::Value::String(d.to_string()),
            PropertyValue::Map(map) => {
                let mut json_obj = serde_json::Map::new();
                for (k, v) in map {
                    json_obj.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(json_obj)
            }
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "{}", s),
            PropertyValue::Date(d) => write!(f, "{}", d),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<NaiveDate> for PropertyValue {
    fn from(d: NaiveDate) -> Self {
        PropertyValue::Date(d)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

/// Direction of an edge relative to a vertex, and the anchor keys under
/// which an edge map carries its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Incoming: the edge points at the vertex (followers).
    In,
    /// Outgoing: the edge leaves the vertex (following).
    Out,
}

impl Direction {
    /// Literal anchor key used in edge element maps.
    pub fn token(&self) -> &'static str {
        match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
        }
    }

    /// Alternate anchor key accepted on decode ("to" for IN, "from" for OUT).
    pub fn alias(&self) -> &'static str {
        match self {
            Direction::In => "to",
            Direction::Out => "from",
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::In => Direction::Out,
            Direction::Out => Direction::In,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
