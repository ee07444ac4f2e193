//! Readable content of a web page, fetched through the rendering service.
//!
//! The blocking entry point returns the page's readable text; the async entry
//! point returns the main content block as cleaned HTML. Rendering requests are
//! not retried.

use crate::capabilities::dispatch::Dispatcher;
use crate::capabilities::{Args, Invoke};
use crate::transport::Session;
use crate::utils::ReadableDocument;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

#[derive(Clone)]
pub struct WebContent {
    dispatcher: Dispatcher,
}

impl WebContent {
    pub const NAME: &'static str = "multi/web_content";

    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Render `url` and return its readable text.
    pub fn call(&self, url: &str) -> Result<String> {
        let transport = self.dispatcher.transport();
        let endpoint = transport.render_endpoint()?;
        info!(capability = Self::NAME, url, mode = "blocking", "rendering page");

        let client = transport.blocking_client()?;
        let html = transport.render_blocking(client, &endpoint, url)?;
        debug!(html_chars = html.len(), "rendered page");
        Ok(ReadableDocument::parse(&html).content())
    }

    /// Render `url` and return the main content block as HTML.
    pub async fn call_async(&self, url: &str, session: Option<&Session>) -> Result<String> {
        let transport = self.dispatcher.transport();
        let endpoint = transport.render_endpoint()?;
        info!(capability = Self::NAME, url, mode = "async", "rendering page");

        let html = match session {
            Some(session) => transport.render(session, &endpoint, url).await?,
            None => {
                let scoped = self.dispatcher.open_scoped()?;
                let html = transport.render(scoped.session(), &endpoint, url).await;
                drop(scoped);
                html?
            }
        };
        debug!(html_chars = html.len(), "rendered page");
        Ok(ReadableDocument::parse(&html).summary())
    }
}

#[async_trait]
impl Invoke for WebContent {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn invoke(&self, args: &Value) -> Result<Value> {
        let args = Args::new(Self::NAME, args)?;
        self.call(args.str("url")?).map(Value::String)
    }

    async fn invoke_async(&self, args: &Value, session: Option<&Session>) -> Result<Value> {
        let args = Args::new(Self::NAME, args)?;
        self.call_async(args.str("url")?, session)
            .await
            .map(Value::String)
    }
}
