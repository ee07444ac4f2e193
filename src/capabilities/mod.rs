//! The capability invokers.
//!
//! Each capability exposes typed entry points (`call` blocks, `call_async`
//! suspends) and implements [`Invoke`], the JSON-argument surface used by
//! registry-resolved references.
//!
//! The blocking entry points drive a blocking HTTP client and must not be called
//! from inside an async runtime; use `call_async` there.
//!
//! | Identifier | Invoker | Endpoint |
//! |------------|---------|----------|
//! | `multi/summarize` | [`Summarize`] | `/summarize` |
//! | `multi/document_qa` | [`DocumentQa`] | `/documentqa` |
//! | `multi/sql` | [`Sql`] | `/sql` |
//! | `multi/search` | [`Search`] | `/search` |
//! | `multi/structured` | [`Structured`] | `/structured` |
//! | `multi/web_content` | [`WebContent`] | rendering service `/content` |

pub(crate) mod dispatch;
pub mod document_qa;
pub mod search;
pub mod sql;
pub mod structured;
pub mod summarize;
pub mod web_content;

pub use document_qa::DocumentQa;
pub use search::Search;
pub use sql::Sql;
pub use structured::Structured;
pub use summarize::Summarize;
pub use web_content::WebContent;

use crate::transport::Session;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Invocation by JSON arguments, shared by every capability.
#[async_trait]
pub trait Invoke: Send + Sync {
    /// Registry identifier, e.g. `multi/summarize`.
    fn name(&self) -> &'static str;

    fn invoke(&self, args: &Value) -> Result<Value>;

    async fn invoke_async(&self, args: &Value, session: Option<&Session>) -> Result<Value>;
}

/// Named-argument accessor for dynamic invocations.
pub(crate) struct Args<'a> {
    capability: &'static str,
    args: &'a serde_json::Map<String, Value>,
}

impl<'a> Args<'a> {
    pub(crate) fn new(capability: &'static str, args: &'a Value) -> Result<Self> {
        let args = args.as_object().ok_or_else(|| {
            Error::invalid_argument_with_context(
                "arguments must be a JSON object",
                ErrorContext::new()
                    .with_field_path("args")
                    .with_source(capability),
            )
        })?;
        Ok(Self { capability, args })
    }

    pub(crate) fn value(&self, key: &str) -> Result<&'a Value> {
        self.args.get(key).ok_or_else(|| {
            Error::invalid_argument_with_context(
                format!("missing argument '{}'", key),
                ErrorContext::new()
                    .with_field_path(format!("args.{}", key))
                    .with_source(self.capability),
            )
        })
    }

    pub(crate) fn str(&self, key: &str) -> Result<&'a str> {
        self.value(key)?
            .as_str()
            .ok_or_else(|| self.not_a_string(key))
    }

    pub(crate) fn opt_str(&self, key: &str) -> Result<Option<&'a str>> {
        match self.args.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(self.not_a_string(key)),
        }
    }

    fn not_a_string(&self, key: &str) -> Error {
        Error::invalid_argument_with_context(
            format!("argument '{}' must be a string", key),
            ErrorContext::new()
                .with_field_path(format!("args.{}", key))
                .with_source(self.capability),
        )
    }
}
