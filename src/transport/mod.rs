//! HTTP transport and session lifecycle.

pub mod http;
pub mod session;

pub use http::{HttpTransport, TransportError};
pub use session::{HttpSessionFactory, Session, SessionFactory};
pub(crate) use session::ScopedSession;
