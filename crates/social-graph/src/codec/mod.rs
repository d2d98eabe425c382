//! Mapping between domain objects and flat graph property maps
//!
//! Every domain type declares its own field table ([`GraphObject::SCHEMA`])
//! and reads/writes its fields through [`PropertyReader`] and
//! [`PropertyWriter`]. Nested records are flattened as
//! `<prefix>_<field>` keys, but only for prefixes the schema names; keys are
//! never split on the delimiter to discover structure, so a field name that
//! itself contains `_` round-trips unambiguously.

mod follow;
mod user;

use chrono::NaiveDate;
use serde_json::Value;

use crate::data::{Direction, ElementId, MappingError, PropertyMap, PropertyValue, ID_KEY, LABEL_KEY};

pub use follow::FOLLOW_EDGE_LABEL;
pub use user::{USER_VERTEX_LABEL, USERNAME_PROPERTY, NAME_PROPERTY, ADDRESS_STATE_PROPERTY};

/// Separator between a nested record's prefix and its field names.
pub const NESTED_PROPERTY_DELIMITER: &str = "_";

/// Scalar type of a stored property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Date,
}

impl FieldKind {
    fn name(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Date => "date",
        }
    }
}

/// A scalar field of a domain type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Required fields can be written but never cleared by a patch.
    pub required: bool,
}

impl Field {
    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: false }
    }

    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: true }
    }
}

/// One entry of a domain type's field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSpec {
    Scalar(Field),
    /// A nested record flattened under `<name>_<field>` keys.
    Nested {
        name: &'static str,
        fields: &'static [Field],
    },
}

impl FieldSpec {
    pub fn name(&self) -> &'static str {
        match self {
            FieldSpec::Scalar(field) => field.name,
            FieldSpec::Nested { name, .. } => name,
        }
    }

    /// Stored property keys covered by this entry.
    pub fn keys(&self) -> Vec<String> {
        match self {
            FieldSpec::Scalar(field) => vec![field.name.to_string()],
            FieldSpec::Nested { name, fields } => {
                fields.iter().map(|f| nested_key(name, f.name)).collect()
            }
        }
    }
}

/// A domain type stored as a vertex or edge.
pub trait GraphObject: Sized {
    /// Vertex or edge label.
    const LABEL: &'static str;

    /// Field table of the stored properties, excluding id and endpoint anchors.
    const SCHEMA: &'static [FieldSpec];

    fn write_properties(&self, writer: &mut PropertyWriter);

    fn read_properties(reader: &PropertyReader<'_>) -> Result<Self, MappingError>;
}

/// Flattens `object` into a property map.
///
/// Absent scalar values are recorded as [`PropertyValue::Null`] rather than
/// omitted, and an absent nested record yields a null for each of its
/// fields, so the caller decides whether a null drops or skips a property.
pub fn flatten<T: GraphObject>(object: &T) -> PropertyMap {
    let mut writer = PropertyWriter::new();
    object.write_properties(&mut writer);
    writer.finish()
}

/// Rebuilds a domain object from an element map. Unknown keys are ignored.
pub fn unflatten<T: GraphObject>(properties: &PropertyMap) -> Result<T, MappingError> {
    T::read_properties(&PropertyReader::new(properties))
}

/// Converts a partial JSON object into the property changes it describes.
///
/// Only keys present in `patch` appear in the result. An explicit `null`
/// for a nested record expands to a null for each of its fields.
pub fn flatten_patch<T: GraphObject>(
    patch: &serde_json::Map<String, Value>,
) -> Result<PropertyMap, MappingError> {
    let mut properties = PropertyMap::new();

    for (name, value) in patch {
        let schema_field = T::SCHEMA
            .iter()
            .find(|candidate| candidate.name() == name)
            .ok_or_else(|| MappingError::UnknownField(name.clone()))?;

        match (schema_field, value) {
            (FieldSpec::Scalar(field), _) => {
                properties.insert(field.name.to_string(), json_to_property(field, field.name, value)?);
            }
            (FieldSpec::Nested { name, fields }, Value::Null) => {
                for field in fields.iter() {
                    properties.insert(nested_key(name, field.name), PropertyValue::Null);
                }
            }
            (FieldSpec::Nested { name, fields }, Value::Object(nested)) => {
                for (field_name, field_value) in nested {
                    let key = nested_key(name, field_name);
                    let field = fields
                        .iter()
                        .find(|f| f.name == field_name)
                        .ok_or_else(|| MappingError::UnknownField(key.clone()))?;
                    let value = json_to_property(field, &key, field_value)?;
                    properties.insert(key, value);
                }
            }
            (FieldSpec::Nested { name, .. }, other) => {
                return Err(MappingError::TypeMismatch {
                    key: name.to_string(),
                    expected: "object",
                    found: json_type_name(other).to_string(),
                });
            }
        }
    }

    Ok(properties)
}

/// Keys the store owns: element id, label and edge endpoint anchors.
pub fn is_reserved_key(key: &str) -> bool {
    key == ID_KEY
        || key == LABEL_KEY
        || key == Direction::In.token()
        || key == Direction::Out.token()
}

/// Drops reserved keys from a flattened map, leaving only properties a
/// traversal may write.
pub fn writable_properties(properties: PropertyMap) -> impl Iterator<Item = (String, PropertyValue)> {
    properties.into_iter().filter(|(key, _)| !is_reserved_key(key))
}

fn nested_key(prefix: &str, name: &str) -> String {
    format!("{}{}{}", prefix, NESTED_PROPERTY_DELIMITER, name)
}

fn json_to_property(field: &Field, key: &str, value: &Value) -> Result<PropertyValue, MappingError> {
    match (field.kind, value) {
        (_, Value::Null) if field.required => Err(MappingError::RequiredField(key.to_string())),
        (_, Value::Null) => Ok(PropertyValue::Null),
        (FieldKind::String, Value::String(s)) => Ok(PropertyValue::String(s.clone())),
        (FieldKind::Date, Value::String(s)) => parse_date(key, s).map(PropertyValue::Date),
        (kind, other) => Err(MappingError::TypeMismatch {
            key: key.to_string(),
            expected: kind.name(),
            found: json_type_name(other).to_string(),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_date(key: &str, raw: &str) -> Result<NaiveDate, MappingError> {
    raw.parse::<NaiveDate>().map_err(|_| MappingError::TypeMismatch {
        key: key.to_string(),
        expected: "date",
        found: format!("string {:?}", raw),
    })
}

/// Builds a flat property map, prefixing keys inside nested records.
#[derive(Debug, Default)]
pub struct PropertyWriter {
    properties: PropertyMap,
    prefix: Option<String>,
}

impl PropertyWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => nested_key(prefix, name),
            None => name.to_string(),
        }
    }

    pub fn string(&mut self, name: &str, value: Option<&str>) {
        let value = value.map_or(PropertyValue::Null, PropertyValue::from);
        self.properties.insert(self.key(name), value);
    }

    pub fn date(&mut self, name: &str, value: Option<NaiveDate>) {
        let value = value.map_or(PropertyValue::Null, PropertyValue::Date);
        self.properties.insert(self.key(name), value);
    }

    /// Records the element id; omitted when the object has none yet.
    pub fn id(&mut self, id: Option<&ElementId>) {
        if let Some(id) = id {
            self.properties.insert(ID_KEY.to_string(), PropertyValue::from(id.as_str()));
        }
    }

    /// Records an edge endpoint as a minimal `{id}` anchor map.
    pub fn anchor(&mut self, direction: Direction, id: Option<&ElementId>) {
        if let Some(id) = id {
            let mut anchor = PropertyMap::new();
            anchor.insert(ID_KEY.to_string(), PropertyValue::from(id.as_str()));
            self.properties.insert(direction.token().to_string(), PropertyValue::Map(anchor));
        }
    }

    /// Writes the fields of a nested record under `<name>_` keys.
    pub fn nested(&mut self, name: &str, write: impl FnOnce(&mut PropertyWriter)) {
        let mut nested = PropertyWriter {
            properties: PropertyMap::new(),
            prefix: Some(self.key(name)),
        };
        write(&mut nested);
        self.properties.extend(nested.properties);
    }

    pub fn finish(self) -> PropertyMap {
        self.properties
    }
}

/// Typed, prefix-aware view over an element map.
#[derive(Debug, Clone)]
pub struct PropertyReader<'a> {
    properties: &'a PropertyMap,
    prefix: Option<String>,
}

impl<'a> PropertyReader<'a> {
    pub fn new(properties: &'a PropertyMap) -> Self {
        Self { properties, prefix: None }
    }

    fn key(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => nested_key(prefix, name),
            None => name.to_string(),
        }
    }

    /// Value stored under `key`, treating an explicit null as absent.
    fn value(&self, key: &str) -> Option<&'a PropertyValue> {
        self.properties.get(key).filter(|value| !value.is_null())
    }

    /// Reads a string property, coercing other scalars to their text form.
    pub fn string(&self, name: &str) -> Result<Option<String>, MappingError> {
        let key = self.key(name);
        match self.value(&key) {
            None => Ok(None),
            Some(PropertyValue::String(s)) => Ok(Some(s.clone())),
            Some(PropertyValue::Map(_)) => Err(MappingError::TypeMismatch {
                key,
                expected: "string",
                found: "map".to_string(),
            }),
            Some(other) => Ok(Some(other.to_string())),
        }
    }

    pub fn required_string(&self, name: &str) -> Result<String, MappingError> {
        self.string(name)?
            .ok_or_else(|| MappingError::MissingField(self.key(name)))
    }

    /// Reads a date property stored natively or as an ISO-8601 string.
    pub fn date(&self, name: &str) -> Result<Option<NaiveDate>, MappingError> {
        let key = self.key(name);
        match self.value(&key) {
            None => Ok(None),
            Some(PropertyValue::Date(d)) => Ok(Some(*d)),
            Some(PropertyValue::String(s)) => parse_date(&key, s).map(Some),
            Some(other) => Err(MappingError::TypeMismatch {
                key,
                expected: "date",
                found: other.type_name().to_string(),
            }),
        }
    }

    /// View over the fields of a nested record.
    pub fn nested(&self, name: &str) -> PropertyReader<'a> {
        PropertyReader {
            properties: self.properties,
            prefix: Some(self.key(name)),
        }
    }

    /// Element identifier, if the map carries one.
    pub fn id(&self) -> Result<Option<ElementId>, MappingError> {
        match self.value(ID_KEY) {
            None => Ok(None),
            Some(PropertyValue::String(s)) => Ok(Some(ElementId::from(s.as_str()))),
            Some(PropertyValue::Integer(i)) => Ok(Some(ElementId::from(i.to_string()))),
            Some(other) => Err(MappingError::TypeMismatch {
                key: ID_KEY.to_string(),
                expected: "identifier",
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Identifier of the endpoint anchored under `direction`.
    ///
    /// Accepts either the literal direction token or its alias, holding
    /// either an `{id, ...}` map or a bare identifier.
    pub fn anchor(&self, direction: Direction) -> Result<Option<ElementId>, MappingError> {
        let key = direction.token();
        let value = self.value(key).or_else(|| self.value(direction.alias()));
        match value {
            None => Ok(None),
            Some(PropertyValue::String(s)) => Ok(Some(ElementId::from(s.as_str()))),
            Some(PropertyValue::Map(anchor)) => PropertyReader::new(anchor)
                .id()?
                .map(Some)
                .ok_or_else(|| MappingError::MissingField(format!("{}.{}", key, ID_KEY))),
            Some(other) => Err(MappingError::TypeMismatch {
                key: key.to_string(),
                expected: "endpoint reference",
                found: other.type_name().to_string(),
            }),
        }
    }
}
