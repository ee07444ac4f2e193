//! Structured extraction support.
//!
//! - [`SchemaType`]: closed description of a record shape, flattened into the
//!   field-type map the remote service expects
//! - [`OutputShape`]: the caller's declared output type plus its coercion mode
//! - [`CoercionError`]: path-scoped problems found while mapping a response
//!
//! # Examples
//!
//! ```
//! use multi_capabilities::structured::{OutputShape, SchemaType};
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct Person {
//!     name: String,
//!     age: i64,
//!     tags: Vec<String>,
//! }
//!
//! let flat = SchemaType::of::<Person>().unwrap().flatten();
//! assert_eq!(flat, json!({"name": "string", "age": "int", "tags": ["string"]}));
//!
//! let shape = OutputShape::<Person>::validated().unwrap();
//! let person = shape
//!     .coerce(json!({"name": "Ada", "age": 36, "tags": ["math"]}))
//!     .unwrap();
//! assert_eq!(person.tags, vec!["math".to_string()]);
//! ```

pub mod coerce;
pub mod error;
pub mod schema;

pub use coerce::{coerce, validate, CoercionMode, OutputShape};
pub use error::{CoercionError, FieldError};
pub use schema::{flatten, Field, RecordSchema, ScalarKind, SchemaType};
