//! Tool schema model and the schema validator.
//!
//! A schema is an ordered list of `{name, type}` fields. Client input is
//! parsed into a [`ToolSchema`] by [`validate_schema`]; once registered the
//! schema is immutable.

use super::SchemaError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Maximum field name length, matching `PostgreSQL` identifier limits.
const MAX_FIELD_NAME_LENGTH: usize = 63;

/// Column names every tool relation carries.
pub(crate) const RESERVED_COLUMNS: [&str; 2] = ["id", "created_at"];

/// Accepted type tags, aliases included, in the order they are reported.
const TYPE_VOCABULARY: [(&str, FieldType); 9] = [
    ("int", FieldType::Int),
    ("integer", FieldType::Int),
    ("str", FieldType::String),
    ("string", FieldType::String),
    ("bool", FieldType::Bool),
    ("boolean", FieldType::Bool),
    ("json", FieldType::Json),
    ("float", FieldType::Float),
    ("timestamp", FieldType::Timestamp),
];

/// Declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Integer values (`int`, `integer`).
    Int,
    /// Text values (`str`, `string`).
    String,
    /// Boolean values (`bool`, `boolean`).
    Bool,
    /// Arbitrary JSON documents.
    Json,
    /// Floating-point numbers.
    Float,
    /// Timestamps.
    Timestamp,
}

impl FieldType {
    /// Parses a client-supplied type tag, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedType`] listing the allowed tags when
    /// the tag is not part of the vocabulary.
    pub fn parse(tag: &str) -> Result<Self, SchemaError> {
        let folded = tag.to_lowercase();
        TYPE_VOCABULARY
            .iter()
            .find(|(candidate, _)| *candidate == folded)
            .map(|(_, field_type)| *field_type)
            .ok_or_else(|| SchemaError::UnsupportedType {
                type_tag: folded,
                allowed: Self::allowed_tags(),
            })
    }

    /// Parses a tag read back from storage.
    ///
    /// Tags outside the vocabulary fall back to [`FieldType::String`]; the
    /// boolean reports whether the fallback was taken.
    #[must_use]
    pub fn from_persisted(tag: &str) -> (Self, bool) {
        Self::parse(tag).map_or((Self::String, true), |field_type| (field_type, false))
    }

    /// Returns every accepted tag, aliases included.
    #[must_use]
    pub fn allowed_tags() -> Vec<&'static str> {
        TYPE_VOCABULARY.iter().map(|(tag, _)| *tag).collect()
    }

    /// Returns the canonical lower-case tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Json => "json",
            Self::Float => "float",
            Self::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// One named, typed field of a tool schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaField {
    name: String,
    #[serde(rename = "type")]
    field_type: FieldType,
}

impl SchemaField {
    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }
}

/// Ordered, validated field list of a registered tool.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ToolSchema(Vec<SchemaField>);

impl ToolSchema {
    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[SchemaField] {
        &self.0
    }

    /// Returns the declared type of `name`, if the schema has that field.
    #[must_use]
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.0
            .iter()
            .find(|field| field.name == name)
            .map(SchemaField::field_type)
    }

    /// Returns the number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the schema declares no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serializes the schema to its canonical JSON form.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .map(|field| {
                    let mut entry = Map::new();
                    entry.insert("name".to_owned(), Value::String(field.name.clone()));
                    entry.insert(
                        "type".to_owned(),
                        Value::String(field.field_type.as_str().to_owned()),
                    );
                    Value::Object(entry)
                })
                .collect(),
        )
    }

    /// Rebuilds a schema from its stored JSON form.
    ///
    /// Structure and names are validated as strictly as on registration, but
    /// unknown type tags fall back to `string`. The names of fields that took
    /// the fallback are returned alongside the schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the stored document is structurally
    /// invalid.
    pub fn from_persisted(definition: &Value) -> Result<(Self, Vec<String>), SchemaError> {
        let parsed = parse_fields(definition, |tag| Ok(FieldType::from_persisted(tag)))?;
        let fallbacks = parsed
            .iter()
            .filter(|(_, fell_back)| *fell_back)
            .map(|(field, _)| field.name.clone())
            .collect();
        let fields = parsed.into_iter().map(|(field, _)| field).collect();
        Ok((Self(fields), fallbacks))
    }
}

/// Validates a client-supplied schema definition.
///
/// The definition must be a JSON array whose entries are objects holding
/// exactly `name` and `type`. Type tags are matched case-insensitively
/// against the fixed vocabulary and stored in canonical form.
///
/// # Errors
///
/// Returns the first [`SchemaError`] encountered.
pub fn validate_schema(definition: &Value) -> Result<ToolSchema, SchemaError> {
    let fields = parse_fields(definition, |tag| Ok((FieldType::parse(tag)?, false)))?;
    Ok(ToolSchema(fields.into_iter().map(|(field, _)| field).collect()))
}

/// Walks a schema document, resolving each tag with `resolve_type`.
///
/// The boolean paired with each field is whatever `resolve_type` reported
/// alongside the type.
fn parse_fields<F>(
    definition: &Value,
    resolve_type: F,
) -> Result<Vec<(SchemaField, bool)>, SchemaError>
where
    F: Fn(&str) -> Result<(FieldType, bool), SchemaError>,
{
    let Value::Array(entries) = definition else {
        return Err(SchemaError::NotASequence {
            observed: json_kind(definition),
        });
    };

    let mut seen = HashSet::with_capacity(entries.len());
    let mut fields = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let Value::Object(object) = entry else {
            return Err(SchemaError::FieldNotAnObject {
                index,
                observed: json_kind(entry),
            });
        };

        let name = required_string(object, index, "name")?;
        let tag = required_string(object, index, "type")?;
        if let Some(extra) = object
            .keys()
            .find(|key| !matches!(key.as_str(), "name" | "type"))
        {
            return Err(SchemaError::UnexpectedKey {
                index,
                key: extra.clone(),
            });
        }

        let (field_type, fell_back) = resolve_type(tag)?;
        validate_field_name(name)?;
        if !seen.insert(name) {
            return Err(SchemaError::DuplicateField(name.to_owned()));
        }

        fields.push((
            SchemaField {
                name: name.to_owned(),
                field_type,
            },
            fell_back,
        ));
    }
    Ok(fields)
}

fn required_string<'a>(
    object: &'a Map<String, Value>,
    index: usize,
    key: &'static str,
) -> Result<&'a str, SchemaError> {
    match object.get(key) {
        None => Err(SchemaError::MissingKey { index, key }),
        Some(Value::String(value)) => Ok(value.as_str()),
        Some(other) => Err(SchemaError::NonStringValue {
            index,
            key,
            observed: json_kind(other),
        }),
    }
}

fn validate_field_name(name: &str) -> Result<(), SchemaError> {
    let mut characters = name.chars();
    let starts_well = characters
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_');
    let rest_is_valid =
        characters.all(|character| character.is_ascii_alphanumeric() || character == '_');

    if !starts_well || !rest_is_valid || name.len() > MAX_FIELD_NAME_LENGTH {
        return Err(SchemaError::InvalidFieldName(name.to_owned()));
    }

    if RESERVED_COLUMNS.contains(&name) {
        return Err(SchemaError::ReservedFieldName(name.to_owned()));
    }
    Ok(())
}

/// Names the JSON kind of a value for diagnostics.
#[must_use]
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) => {
            if number.is_f64() {
                "number"
            } else {
                "integer"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
