//! # multi-capabilities
//!
//! 统一调用远程能力（摘要、文档问答、SQL 生成、搜索、结构化抽取、网页内容）的客户端层。
//!
//! A client-side capability layer: a small, fixed set of named remote operations
//! invoked through one calling convention, with retry and exponential backoff, a
//! blocking and a cooperative (async) execution path, and typed coercion of
//! structured responses.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use multi_capabilities::{Capabilities, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> multi_capabilities::Result<()> {
//!     let caps = Capabilities::new(ClientConfig::builder().api_key("your-api-key").build()?)?;
//!
//!     let summary = caps
//!         .summarize()
//!         .call_async("The quick brown fox jumps over the lazy dog.", None)
//!         .await?;
//!     println!("{summary}");
//!
//!     // By identifier, with JSON arguments
//!     let search = caps.resolve("multi/search").into_capability();
//!     let hits = search.call_async(&serde_json::json!({"query": "rust"}), None).await?;
//!     println!("{hits}");
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Capabilities`] facade, builder, cancellation |
//! | [`capabilities`] | Per-capability invokers |
//! | [`registry`] | Identifier lookup |
//! | [`resilience`] | Retry with exponential backoff |
//! | [`structured`] | Schema flattening and response coercion |
//! | [`transport`] | HTTP transport and sessions |
//! | [`config`] | Client configuration |
//! | [`utils`] | Readable content extraction |

pub mod capabilities;
pub mod client;
pub mod config;
pub mod registry;
pub mod resilience;
pub mod structured;
pub mod transport;
pub mod utils;

pub use capabilities::Invoke;
pub use client::{run_cancellable, Capabilities, CapabilitiesBuilder};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use registry::{Capability, CapabilityRegistry, Resolution};
pub use resilience::RetryPolicy;
pub use structured::{CoercionMode, OutputShape, SchemaType};
pub use transport::{Session, SessionFactory};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
