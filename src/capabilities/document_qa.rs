//! Question answering over a supplied document.

use crate::capabilities::dispatch::Dispatcher;
use crate::capabilities::{Args, Invoke};
use crate::transport::Session;
use crate::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

#[derive(Clone)]
pub struct DocumentQa {
    dispatcher: Dispatcher,
}

impl DocumentQa {
    pub const NAME: &'static str = "multi/document_qa";
    pub const PATH: &'static str = "/documentqa";

    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn call(&self, document: &str, query: &str) -> Result<Value> {
        debug!(document_chars = document.chars().count(), "document qa");
        self.dispatcher
            .post(Self::NAME, Self::PATH, &payload(document, query))
    }

    pub async fn call_async(
        &self,
        document: &str,
        query: &str,
        session: Option<&Session>,
    ) -> Result<Value> {
        debug!(document_chars = document.chars().count(), "document qa");
        self.dispatcher
            .post_async(Self::NAME, Self::PATH, &payload(document, query), session)
            .await
    }
}

fn payload(document: &str, query: &str) -> Value {
    json!({ "document": document, "query": query })
}

#[async_trait]
impl Invoke for DocumentQa {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn invoke(&self, args: &Value) -> Result<Value> {
        let args = Args::new(Self::NAME, args)?;
        self.call(args.str("document")?, args.str("query")?)
    }

    async fn invoke_async(&self, args: &Value, session: Option<&Session>) -> Result<Value> {
        let args = Args::new(Self::NAME, args)?;
        self.call_async(args.str("document")?, args.str("query")?, session)
            .await
    }
}
