//! Shared request execution for the JSON capabilities.
//!
//! Blocking calls go through the lazily built blocking client. Async calls come in
//! two layers: [`Dispatcher::post_with_session`] always needs a session, and
//! [`Dispatcher::post_async`] supplies a scoped one when the caller did not.

use crate::resilience::RetryPolicy;
use crate::transport::{HttpTransport, ScopedSession, Session, SessionFactory};
use crate::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub(crate) struct Dispatcher {
    transport: Arc<HttpTransport>,
    sessions: Arc<dyn SessionFactory>,
    retry: RetryPolicy,
}

impl Dispatcher {
    pub(crate) fn new(
        transport: Arc<HttpTransport>,
        sessions: Arc<dyn SessionFactory>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            sessions,
            retry,
        }
    }

    pub(crate) fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    pub(crate) fn open_scoped(&self) -> Result<ScopedSession> {
        ScopedSession::open(self.sessions.as_ref())
    }

    pub(crate) fn post(&self, capability: &'static str, path: &str, payload: &Value) -> Result<Value> {
        let request_id = Uuid::new_v4().to_string();
        info!(capability, request_id = %request_id, mode = "blocking", "invoking capability");

        let client = self.transport.blocking_client()?;
        self.retry.execute_blocking(capability, |_| {
            self.transport
                .post_json_blocking(client, path, payload, &request_id)
        })
    }

    pub(crate) async fn post_async(
        &self,
        capability: &'static str,
        path: &str,
        payload: &Value,
        session: Option<&Session>,
    ) -> Result<Value> {
        match session {
            Some(session) => {
                self.post_with_session(capability, path, payload, session)
                    .await
            }
            None => {
                let scoped = self.open_scoped()?;
                let result = self
                    .post_with_session(capability, path, payload, scoped.session())
                    .await;
                drop(scoped);
                result
            }
        }
    }

    pub(crate) async fn post_with_session(
        &self,
        capability: &'static str,
        path: &str,
        payload: &Value,
        session: &Session,
    ) -> Result<Value> {
        let request_id = Uuid::new_v4().to_string();
        info!(
            capability,
            request_id = %request_id,
            session_id = %session.id(),
            mode = "async",
            "invoking capability"
        );

        self.retry
            .execute(capability, |_| {
                self.transport
                    .post_json(session, path, payload, &request_id)
            })
            .await
    }
}
