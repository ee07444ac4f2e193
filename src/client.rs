//! Client facade.
//!
//! [`Capabilities`] owns the configuration, the per-capability invokers and the
//! registry; build it with [`CapabilitiesBuilder`] or from the environment.

pub mod builder;
pub mod cancel;
pub mod core;

pub use builder::CapabilitiesBuilder;
pub use cancel::run_cancellable;
pub use core::Capabilities;
