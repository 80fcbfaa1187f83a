//! Payload validation against a registered tool schema.
//!
//! Validation runs in flexible mode: keys the schema does not declare are
//! ignored here and dropped by [`ToolRecord::from_payload`]. Only `int`,
//! `string` and `bool` fields are type-checked; `json`, `float` and
//! `timestamp` values pass through to the store unchanged.

use super::schema::json_kind;
use super::{FieldType, PayloadValidationError, ToolSchema};
use serde_json::{Map, Value};

/// Validates `payload` against `schema`.
///
/// JSON booleans never satisfy an `int` field and JSON integers never
/// satisfy a `bool` field. Floats, `null` and integers outside the signed
/// 64-bit range do not satisfy `int`.
///
/// # Errors
///
/// Returns [`PayloadValidationError::NotAnObject`] when the payload is not a
/// JSON object, or [`PayloadValidationError::TypeMismatch`] for the first
/// field whose value does not match its declared type.
pub fn validate_payload(payload: &Value, schema: &ToolSchema) -> Result<(), PayloadValidationError> {
    let Value::Object(entries) = payload else {
        return Err(PayloadValidationError::NotAnObject {
            observed: json_kind(payload),
        });
    };

    for (key, value) in entries {
        let Some(expected) = schema.field_type(key) else {
            continue;
        };
        if let Some(observed) = mismatch(expected, value) {
            return Err(PayloadValidationError::TypeMismatch {
                field: key.clone(),
                expected: expected.as_str(),
                observed,
            });
        }
    }
    Ok(())
}

/// Returns the observed kind when `value` cannot fill an `expected` field.
fn mismatch(expected: FieldType, value: &Value) -> Option<&'static str> {
    let accepted = match expected {
        FieldType::Int => match value {
            Value::Number(number) if number.as_i64().is_some() => true,
            Value::Number(number) if number.is_u64() => return Some("integer out of range"),
            _ => false,
        },
        FieldType::String => value.is_string(),
        FieldType::Bool => value.is_boolean(),
        FieldType::Json | FieldType::Float | FieldType::Timestamp => true,
    };
    (!accepted).then(|| json_kind(value))
}

/// Validated record restricted to the keys its schema declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRecord(Map<String, Value>);

impl ToolRecord {
    /// Validates `payload` and keeps only schema-declared keys.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadValidationError`] when validation fails.
    pub fn from_payload(payload: &Value, schema: &ToolSchema) -> Result<Self, PayloadValidationError> {
        validate_payload(payload, schema)?;
        let Value::Object(entries) = payload else {
            return Err(PayloadValidationError::NotAnObject {
                observed: json_kind(payload),
            });
        };

        let retained = entries
            .iter()
            .filter(|(key, _)| schema.field_type(key).is_some())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok(Self(retained))
    }

    /// Returns the retained values keyed by column name.
    #[must_use]
    pub const fn values(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns the retained values as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Returns whether no schema field was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
