//! Mapping raw structured responses back onto declared output shapes.

use crate::structured::error::{CoercionError, FieldError};
use crate::structured::schema::{ScalarKind, SchemaType};
use crate::Result;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoercionMode {
    /// Every required field must be present and every value must match its
    /// declared type before the record is built.
    #[default]
    Validated,
    /// Fields are assigned by name; only deserialization itself can fail.
    Structural,
}

/// The declared output shape of a structured call.
///
/// The schema is derived once, when the shape is declared; coercing a response
/// never re-inspects the Rust type.
#[derive(Debug, Clone)]
pub struct OutputShape<T> {
    schema: SchemaType,
    mode: CoercionMode,
    _marker: PhantomData<fn() -> T>,
}

impl<T: JsonSchema + DeserializeOwned> OutputShape<T> {
    pub fn validated() -> Result<Self> {
        Self::with_mode(CoercionMode::Validated)
    }

    pub fn structural() -> Result<Self> {
        Self::with_mode(CoercionMode::Structural)
    }

    pub fn with_mode(mode: CoercionMode) -> Result<Self> {
        Ok(Self {
            schema: SchemaType::of::<T>()?,
            mode,
            _marker: PhantomData,
        })
    }
}

impl<T: DeserializeOwned> OutputShape<T> {
    pub fn schema(&self) -> &SchemaType {
        &self.schema
    }

    pub fn mode(&self) -> CoercionMode {
        self.mode
    }

    pub fn coerce(&self, raw: Value) -> std::result::Result<T, CoercionError> {
        coerce(&self.schema, self.mode, raw)
    }
}

pub fn coerce<T: DeserializeOwned>(
    schema: &SchemaType,
    mode: CoercionMode,
    raw: Value,
) -> std::result::Result<T, CoercionError> {
    if mode == CoercionMode::Validated {
        validate(schema, &raw)?;
    }
    T::deserialize(&raw).map_err(|err| locate(schema, &raw, err))
}

/// Trace a deserialization failure back to the offending fields. Failures the
/// schema cannot see (integer range, string formats) stay at `$`.
fn locate(schema: &SchemaType, raw: &Value, err: serde_json::Error) -> CoercionError {
    match validate(schema, raw) {
        Err(located) => located,
        Ok(()) => CoercionError::from_serde(err),
    }
}

/// Check `value` against `schema`, reporting every mismatch with its path.
///
/// Fields the schema does not declare are ignored.
pub fn validate(schema: &SchemaType, value: &Value) -> std::result::Result<(), CoercionError> {
    let mut errors = Vec::new();
    validate_at(schema, value, "$", &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoercionError::new(errors))
    }
}

fn validate_at(schema: &SchemaType, value: &Value, path: &str, errors: &mut Vec<FieldError>) {
    match schema {
        SchemaType::Scalar(kind) => {
            let ok = match kind {
                ScalarKind::String => value.is_string(),
                ScalarKind::Bool => value.is_boolean(),
                ScalarKind::Int => value.is_i64() || value.is_u64(),
                ScalarKind::Float => value.is_number(),
            };
            if !ok {
                errors.push(type_mismatch(kind.tag(), value, path));
            }
        }
        SchemaType::Sequence(element) => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    validate_at(element, item, &format!("{}[{}]", path, i), errors);
                }
            }
            None => errors.push(type_mismatch("sequence", value, path)),
        },
        SchemaType::Record(record) => match value.as_object() {
            Some(map) => {
                for field in record.fields() {
                    let field_path = format!("{}.{}", path, field.name);
                    match map.get(&field.name) {
                        Some(v) => validate_at(&field.ty, v, &field_path, errors),
                        None if field.required => {
                            errors.push(FieldError::new(field_path, "missing required field"))
                        }
                        None => {}
                    }
                }
            }
            None => errors.push(type_mismatch("record", value, path)),
        },
    }
}

fn type_mismatch(expected: &str, value: &Value, path: &str) -> FieldError {
    FieldError::new(
        path,
        format!("expected {}, got {}", expected, value_kind(value)),
    )
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "record",
    }
}
