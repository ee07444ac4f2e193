use crate::capabilities::dispatch::Dispatcher;
use crate::capabilities::{DocumentQa, Invoke, Search, Sql, Structured, Summarize, WebContent};
use crate::client::core::Capabilities;
use crate::config::ClientConfig;
use crate::registry::CapabilityRegistry;
use crate::resilience::RetryPolicy;
use crate::transport::{HttpSessionFactory, HttpTransport, SessionFactory};
use crate::Result;
use std::sync::Arc;
use tracing::info;

/// Builder for [`Capabilities`].
pub struct CapabilitiesBuilder {
    config: Option<ClientConfig>,
    session_factory: Option<Arc<dyn SessionFactory>>,
}

impl CapabilitiesBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            session_factory: None,
        }
    }

    /// Use an explicit configuration instead of the environment.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace how scoped sessions are opened. Default opens a fresh pooled
    /// client from the configuration.
    pub fn session_factory(mut self, factory: Arc<dyn SessionFactory>) -> Self {
        self.session_factory = Some(factory);
        self
    }

    pub fn build(self) -> Result<Capabilities> {
        let config = Arc::new(match self.config {
            Some(config) => config,
            None => ClientConfig::from_env()?,
        });

        let transport = Arc::new(HttpTransport::new(Arc::clone(&config)));
        let sessions: Arc<dyn SessionFactory> = match self.session_factory {
            Some(factory) => factory,
            None => Arc::new(HttpSessionFactory::new(Arc::clone(&config))),
        };
        let retry = RetryPolicy::new(config.max_attempts, config.backoff_unit);
        let dispatcher = Dispatcher::new(transport, Arc::clone(&sessions), retry);

        let summarize = Summarize::new(dispatcher.clone());
        let document_qa = DocumentQa::new(dispatcher.clone());
        let sql = Sql::new(dispatcher.clone());
        let search = Search::new(dispatcher.clone());
        let structured = Structured::new(dispatcher.clone());
        let web_content = WebContent::new(dispatcher);

        let invokers: Vec<Arc<dyn Invoke>> = vec![
            Arc::new(summarize.clone()),
            Arc::new(document_qa.clone()),
            Arc::new(sql.clone()),
            Arc::new(search.clone()),
            Arc::new(structured.clone()),
            Arc::new(web_content.clone()),
        ];
        let registry = CapabilityRegistry::new(invokers);

        info!(
            base_url = %config.base_url,
            max_attempts = retry.max_attempts(),
            backoff_unit_ms = retry.unit().as_millis() as u64,
            capabilities = registry.len(),
            "capabilities ready"
        );

        Ok(Capabilities {
            config,
            sessions,
            summarize,
            document_qa,
            sql,
            search,
            structured,
            web_content,
            registry,
        })
    }
}

impl Default for CapabilitiesBuilder {
    fn default() -> Self {
        Self::new()
    }
}
