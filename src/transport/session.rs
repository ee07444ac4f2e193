//! Transport sessions and their ownership.
//!
//! A [`Session`] is a cheap, cloneable handle over a pooled async HTTP client.
//! Sessions handed in by a caller stay owned by that caller. When no session is
//! supplied, the invoker opens a [`ScopedSession`] from its [`SessionFactory`];
//! the guard closes the session when it goes out of scope, which covers success,
//! failure, exhausted retries and cancellation (the future being dropped).

use crate::config::ClientConfig;
use crate::transport::TransportError;
use crate::{Error, ErrorContext, Result};
use reqwest::Proxy;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug)]
struct SessionState {
    id: Uuid,
    closed: AtomicBool,
}

#[derive(Debug, Clone)]
pub struct Session {
    client: reqwest::Client,
    state: Arc<SessionState>,
}

impl Session {
    /// Build a session with the pool settings from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Some(config.pool_idle_timeout));

        if let Some(timeout) = config.attempt_timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration_with_context(
                    "invalid proxy URL",
                    ErrorContext::new()
                        .with_field_path("proxy_url")
                        .with_details(e.to_string())
                        .with_source("session"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| {
            Error::configuration_with_context(
                "failed to build HTTP client",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("session"),
            )
        })?;

        Ok(Self::from_client(client))
    }

    /// Wrap an existing client, e.g. one shared with the rest of an application.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            client,
            state: Arc::new(SessionState {
                id: Uuid::new_v4(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.state.id
    }

    /// Mark the session closed. Clones observe the same state; requests through a
    /// closed session fail with [`TransportError::SessionClosed`].
    pub fn close(&self) {
        if !self.state.closed.swap(true, Ordering::SeqCst) {
            debug!(session_id = %self.state.id, "session closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn client(&self) -> std::result::Result<&reqwest::Client, TransportError> {
        if self.is_closed() {
            Err(TransportError::SessionClosed)
        } else {
            Ok(&self.client)
        }
    }
}

/// Source of sessions for invocations that were not handed one.
pub trait SessionFactory: Send + Sync {
    fn open(&self) -> Result<Session>;
}

/// Default factory: a fresh pooled client per scoped session.
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    config: Arc<ClientConfig>,
}

impl HttpSessionFactory {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self { config }
    }
}

impl SessionFactory for HttpSessionFactory {
    fn open(&self) -> Result<Session> {
        Session::new(&self.config)
    }
}

/// A session owned by exactly one invocation; closed on drop.
pub(crate) struct ScopedSession {
    session: Session,
}

impl ScopedSession {
    pub(crate) fn open(factory: &dyn SessionFactory) -> Result<Self> {
        let session = factory.open()?;
        debug!(session_id = %session.id(), "opened scoped session");
        Ok(Self { session })
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        self.session.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::builder().api_key("k").build().unwrap()
    }

    #[test]
    fn test_close_is_shared_between_clones() {
        let session = Session::new(&config()).unwrap();
        let clone = session.clone();
        assert!(!clone.is_closed());
        session.close();
        assert!(clone.is_closed());
        assert!(matches!(clone.client(), Err(TransportError::SessionClosed)));
        assert_eq!(session.id(), clone.id());
    }

    #[test]
    fn test_scoped_session_closes_on_drop() {
        let factory = HttpSessionFactory::new(Arc::new(config()));
        let observed = {
            let scoped = ScopedSession::open(&factory).unwrap();
            let observed = scoped.session().clone();
            assert!(!observed.is_closed());
            observed
        };
        assert!(observed.is_closed());
    }

    #[test]
    fn test_invalid_proxy_is_a_configuration_error() {
        let config = ClientConfig::builder()
            .api_key("k")
            .proxy_url("http://[::not-a-proxy")
            .build()
            .unwrap();
        let err = Session::new(&config).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
