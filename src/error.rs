use crate::structured::CoercionError;
use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "config.base_url", "args.document")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_builder", "structured_invoker")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for capability invocations.
///
/// Transport failures are absorbed by the retry loop; callers of a retried
/// capability normally only observe [`Error::RetriesExhausted`] or one of the
/// synchronous caller-side errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Capability '{capability}' failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        capability: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Unsupported schema type '{type_name}' at {path}")]
    UnsupportedSchemaType { type_name: String, path: String },

    #[error("Coercion error: {0}")]
    Coercion(#[from] CoercionError),

    #[error("Capability '{uri}' is not bound to an invoker (valid identifiers: {})", .valid.join(", "))]
    UnboundCapability { uri: String, valid: Vec<String> },

    #[error("Invalid argument: {message}{}", format_context(.context))]
    InvalidArgument {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invocation cancelled")]
    Cancelled,
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new invalid-argument error with structured context
    pub fn invalid_argument_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvalidArgument {
            message: msg.into(),
            context,
        }
    }

    pub fn unsupported_schema_type(type_name: impl Into<String>, path: impl Into<String>) -> Self {
        Error::UnsupportedSchemaType {
            type_name: type_name.into(),
            path: path.into(),
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::InvalidArgument { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// Whether this is the terminal failure of a retried invocation.
    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self, Error::RetriesExhausted { .. })
    }
}
