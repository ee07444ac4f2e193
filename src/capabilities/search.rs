//! Web search.

use crate::capabilities::dispatch::Dispatcher;
use crate::capabilities::{Args, Invoke};
use crate::transport::Session;
use crate::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

#[derive(Clone)]
pub struct Search {
    dispatcher: Dispatcher,
}

impl Search {
    pub const NAME: &'static str = "multi/search";
    pub const PATH: &'static str = "/search";

    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn call(&self, query: &str) -> Result<Value> {
        self.dispatcher
            .post(Self::NAME, Self::PATH, &json!({ "query": query }))
    }

    pub async fn call_async(&self, query: &str, session: Option<&Session>) -> Result<Value> {
        self.dispatcher
            .post_async(Self::NAME, Self::PATH, &json!({ "query": query }), session)
            .await
    }
}

#[async_trait]
impl Invoke for Search {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn invoke(&self, args: &Value) -> Result<Value> {
        let args = Args::new(Self::NAME, args)?;
        self.call(args.str("query")?)
    }

    async fn invoke_async(&self, args: &Value, session: Option<&Session>) -> Result<Value> {
        let args = Args::new(Self::NAME, args)?;
        self.call_async(args.str("query")?, session).await
    }
}
