//! Helpers applied to responses after they are received.

pub mod readable;

pub use readable::ReadableDocument;
