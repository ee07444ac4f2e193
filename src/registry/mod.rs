//! Capability registry: identifier → invoker lookup.
//!
//! The table is fixed when the client is built and read-only afterwards.
//! Resolution never fails; an unknown identifier yields
//! [`Resolution::NotFound`], which may still be turned into an unbound
//! [`Capability`] whose every invocation fails with
//! [`Error::UnboundCapability`].

use crate::capabilities::Invoke;
use crate::transport::Session;
use crate::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct CapabilityRegistry {
    table: HashMap<&'static str, Arc<dyn Invoke>>,
}

impl CapabilityRegistry {
    /// Build the table; a later invoker with the same name replaces an earlier one.
    pub fn new(invokers: Vec<Arc<dyn Invoke>>) -> Self {
        let table = invokers
            .into_iter()
            .map(|invoker| (invoker.name(), invoker))
            .collect();
        Self { table }
    }

    /// Exact-match lookup.
    pub fn resolve(&self, name: &str) -> Resolution {
        match self.table.get(name) {
            Some(invoker) => Resolution::Found(Capability {
                uri: name.to_string(),
                invoker: Some(Arc::clone(invoker)),
                valid: Vec::new(),
            }),
            None => {
                let valid = self.names();
                warn!(name, valid = ?valid, "unknown capability");
                Resolution::NotFound {
                    name: name.to_string(),
                    valid,
                }
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Invoke>> {
        self.table.get(name).cloned()
    }

    /// Registered identifiers, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.table.keys().map(|k| k.to_string()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Outcome of [`CapabilityRegistry::resolve`].
pub enum Resolution {
    Found(Capability),
    NotFound { name: String, valid: Vec<String> },
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    /// The capability reference; unbound when the name was not found.
    pub fn into_capability(self) -> Capability {
        match self {
            Resolution::Found(capability) => capability,
            Resolution::NotFound { name, valid } => Capability::unbound(name, valid),
        }
    }

    pub fn into_result(self) -> Result<Capability> {
        match self {
            Resolution::Found(capability) => Ok(capability),
            Resolution::NotFound { name, valid } => Err(Error::UnboundCapability { uri: name, valid }),
        }
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Found(capability) => f.debug_tuple("Found").field(capability).finish(),
            Resolution::NotFound { name, valid } => f
                .debug_struct("NotFound")
                .field("name", name)
                .field("valid", valid)
                .finish(),
        }
    }
}

/// A named reference to a capability, possibly unbound.
#[derive(Clone)]
pub struct Capability {
    uri: String,
    invoker: Option<Arc<dyn Invoke>>,
    valid: Vec<String>,
}

impl Capability {
    fn unbound(uri: String, valid: Vec<String>) -> Self {
        Self {
            uri,
            invoker: None,
            valid,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn is_bound(&self) -> bool {
        self.invoker.is_some()
    }

    fn invoker(&self) -> Result<&Arc<dyn Invoke>> {
        self.invoker.as_ref().ok_or_else(|| Error::UnboundCapability {
            uri: self.uri.clone(),
            valid: self.valid.clone(),
        })
    }

    /// Blocking invocation with named JSON arguments.
    pub fn call(&self, args: &Value) -> Result<Value> {
        self.invoker()?.invoke(args)
    }

    pub async fn call_async(&self, args: &Value, session: Option<&Session>) -> Result<Value> {
        self.invoker()?.invoke_async(args, session).await
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("uri", &self.uri)
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl Invoke for Echo {
        fn name(&self) -> &'static str {
            "multi/echo"
        }

        fn invoke(&self, args: &Value) -> Result<Value> {
            Ok(args.clone())
        }

        async fn invoke_async(&self, args: &Value, _session: Option<&Session>) -> Result<Value> {
            Ok(args.clone())
        }
    }

    fn registry() -> CapabilityRegistry {
        CapabilityRegistry::new(vec![Arc::new(Echo)])
    }

    #[test]
    fn test_resolve_found() {
        let resolution = registry().resolve("multi/echo");
        assert!(resolution.is_found());
        let capability = resolution.into_capability();
        assert!(capability.is_bound());
        assert_eq!(capability.call(&json!({"x": 1})).unwrap(), json!({"x": 1}));
    }

    #[test]
    fn test_resolve_is_exact_match() {
        assert!(!registry().resolve("multi/Echo").is_found());
        assert!(!registry().resolve("echo").is_found());
    }

    #[test]
    fn test_unknown_name_resolves_without_failing() {
        let capability = registry().resolve("multi/nope").into_capability();
        assert!(!capability.is_bound());
        assert_eq!(capability.uri(), "multi/nope");

        match capability.call(&json!({})) {
            Err(Error::UnboundCapability { uri, valid }) => {
                assert_eq!(uri, "multi/nope");
                assert_eq!(valid, vec!["multi/echo".to_string()]);
            }
            other => panic!("expected unbound capability, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unbound_async_call_fails() {
        let capability = registry().resolve("multi/nope").into_capability();
        assert!(matches!(
            capability.call_async(&json!({}), None).await,
            Err(Error::UnboundCapability { .. })
        ));
    }

    #[test]
    fn test_into_result() {
        assert!(registry().resolve("multi/echo").into_result().is_ok());
        assert!(matches!(
            registry().resolve("multi/nope").into_result(),
            Err(Error::UnboundCapability { .. })
        ));
    }
}
