//! Error types for response coercion.

use std::fmt;

/// One problem found while mapping a raw value onto a declared shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// JSON path to the error location (e.g., "$.address.city", "$.items[0].price")
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A structured response could not be mapped onto the declared output shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", format_errors(.errors))]
pub struct CoercionError {
    pub errors: Vec<FieldError>,
}

impl CoercionError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldError::new(path, message)])
    }

    /// Wrap a deserialization failure the schema could not locate. serde's
    /// message is kept, including its line and column when parsing text.
    pub fn from_serde(err: serde_json::Error) -> Self {
        Self::single("$", err.to_string())
    }

    /// Get errors as formatted strings.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.path.as_str()).collect()
    }
}

fn format_errors(errors: &[FieldError]) -> String {
    match errors {
        [] => "value does not match the declared shape".to_string(),
        [only] => only.to_string(),
        many => format!(
            "{} problems: {}",
            many.len(),
            many.iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        ),
    }
}
