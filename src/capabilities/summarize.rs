//! Document summarization.

use crate::capabilities::dispatch::Dispatcher;
use crate::capabilities::{Args, Invoke};
use crate::transport::Session;
use crate::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

#[derive(Clone)]
pub struct Summarize {
    dispatcher: Dispatcher,
}

impl Summarize {
    pub const NAME: &'static str = "multi/summarize";
    pub const PATH: &'static str = "/summarize";

    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Summarize `document`, blocking the calling thread through any retries.
    pub fn call(&self, document: &str) -> Result<Value> {
        debug!(document_chars = document.chars().count(), "summarize");
        self.dispatcher.post(Self::NAME, Self::PATH, &payload(document))
    }

    /// Summarize `document` on `session`, or on a session owned by this call.
    pub async fn call_async(&self, document: &str, session: Option<&Session>) -> Result<Value> {
        debug!(document_chars = document.chars().count(), "summarize");
        self.dispatcher
            .post_async(Self::NAME, Self::PATH, &payload(document), session)
            .await
    }
}

fn payload(document: &str) -> Value {
    json!({ "document": document })
}

#[async_trait]
impl Invoke for Summarize {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn invoke(&self, args: &Value) -> Result<Value> {
        let args = Args::new(Self::NAME, args)?;
        self.call(args.str("document")?)
    }

    async fn invoke_async(&self, args: &Value, session: Option<&Session>) -> Result<Value> {
        let args = Args::new(Self::NAME, args)?;
        self.call_async(args.str("document")?, session).await
    }
}
