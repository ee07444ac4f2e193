use crate::capabilities::{DocumentQa, Search, Sql, Structured, Summarize, WebContent};
use crate::client::builder::CapabilitiesBuilder;
use crate::config::ClientConfig;
use crate::registry::{CapabilityRegistry, Resolution};
use crate::transport::{Session, SessionFactory};
use crate::Result;
use once_cell::sync::OnceCell;
use std::sync::Arc;

static GLOBAL: OnceCell<Capabilities> = OnceCell::new();

/// Entry point: every capability, sharing one configuration and one registry.
pub struct Capabilities {
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) sessions: Arc<dyn SessionFactory>,
    pub(crate) summarize: Summarize,
    pub(crate) document_qa: DocumentQa,
    pub(crate) sql: Sql,
    pub(crate) search: Search,
    pub(crate) structured: Structured,
    pub(crate) web_content: WebContent,
    pub(crate) registry: CapabilityRegistry,
}

impl Capabilities {
    pub fn new(config: ClientConfig) -> Result<Self> {
        CapabilitiesBuilder::new().config(config).build()
    }

    /// Build from `MULTI_*` / `BROWSERLESS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        CapabilitiesBuilder::new().build()
    }

    pub fn builder() -> CapabilitiesBuilder {
        CapabilitiesBuilder::new()
    }

    /// Process-wide instance, built from the environment on first use.
    ///
    /// A failed first build is not cached; the next call tries again.
    pub fn global() -> Result<&'static Capabilities> {
        GLOBAL.get_or_try_init(Capabilities::from_env)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn summarize(&self) -> &Summarize {
        &self.summarize
    }

    pub fn document_qa(&self) -> &DocumentQa {
        &self.document_qa
    }

    pub fn sql(&self) -> &Sql {
        &self.sql
    }

    pub fn search(&self) -> &Search {
        &self.search
    }

    pub fn structured(&self) -> &Structured {
        &self.structured
    }

    pub fn web_content(&self) -> &WebContent {
        &self.web_content
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Look up a capability by identifier, e.g. `multi/summarize`.
    pub fn resolve(&self, name: &str) -> Resolution {
        self.registry.resolve(name)
    }

    /// Open a caller-owned session. Invocations handed this session never
    /// close it; call [`Session::close`] when done.
    pub fn open_session(&self) -> Result<Session> {
        self.sessions.open()
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{clear_env, ENV_LOCK};
    use crate::Error;
    use std::env;

    #[test]
    fn test_from_env_builds_every_capability() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("MULTI_API_KEY", "env-key");
        env::set_var("MULTI_BASE_URL", "http://127.0.0.1:4010");
        env::set_var("MULTI_MAX_ATTEMPTS", "2");

        let caps = Capabilities::from_env();
        clear_env();
        let caps = caps.unwrap();

        assert_eq!(caps.config().api_key(), "env-key");
        assert_eq!(caps.config().base_url, "http://127.0.0.1:4010");
        assert_eq!(caps.config().max_attempts, 2);
        assert_eq!(caps.registry().len(), 6);
        assert!(caps.resolve("multi/summarize").is_found());
    }

    #[test]
    fn test_from_env_rejects_bad_configuration() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("MULTI_API_KEY", "env-key");
        env::set_var("MULTI_BASE_URL", "::nope");

        let result = Capabilities::from_env();
        clear_env();

        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_global_is_built_once() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("MULTI_API_KEY", "global-key");

        let first = Capabilities::global();
        clear_env();
        let first = first.unwrap();
        // Environment changes after the first build are not observed.
        let second = Capabilities::global().unwrap();

        assert!(std::ptr::eq(first, second));
        assert_eq!(second.config().api_key(), "global-key");
        assert_eq!(second.config().base_url, crate::config::DEFAULT_BASE_URL);
    }
}
