//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use multi_capabilities::transport::{Session, SessionFactory};
use multi_capabilities::{Capabilities, ClientConfig, ClientConfigBuilder};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const API_KEY: &str = "test-key";
pub const RENDER_TOKEN: &str = "render-token";

pub const FOX: &str = "The quick brown fox jumps over the lazy dog.";

pub const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Foxes</title><script>var tracked = true;</script></head>
<body>
  <nav><a href="/">Home</a></nav>
  <article>
    <h1>The Quick Brown Fox</h1>
    <p>The quick brown fox jumps over the lazy dog, again and again.</p>
    <p>Foxes are remarkably agile animals.</p>
  </article>
  <footer>Copyright</footer>
</body>
</html>"#;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Config pointed at `url` for both the capability service and the renderer,
/// with a 1 ms backoff unit.
pub fn config_builder(url: &str) -> ClientConfigBuilder {
    ClientConfig::builder()
        .api_key(API_KEY)
        .base_url(url)
        .render_url(url)
        .backoff_unit(Duration::from_millis(1))
}

pub fn config(url: &str) -> ClientConfig {
    config_builder(url)
        .render_token(RENDER_TOKEN)
        .build()
        .unwrap()
}

pub fn capabilities(url: &str) -> Capabilities {
    init_tracing();
    Capabilities::new(config(url)).unwrap()
}

/// Session factory that remembers every session it hands out.
pub struct RecordingSessions {
    config: ClientConfig,
    opened: Mutex<Vec<Session>>,
}

impl RecordingSessions {
    pub fn new(config: ClientConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            opened: Mutex::new(Vec::new()),
        })
    }

    pub fn opened(&self) -> Vec<Session> {
        self.opened.lock().unwrap().clone()
    }

    pub fn all_closed(&self) -> bool {
        self.opened().iter().all(Session::is_closed)
    }
}

impl SessionFactory for RecordingSessions {
    fn open(&self) -> multi_capabilities::Result<Session> {
        let session = Session::new(&self.config)?;
        self.opened.lock().unwrap().push(session.clone());
        Ok(session)
    }
}

/// Capabilities whose scoped sessions are recorded.
pub fn recorded(config: ClientConfig) -> (Capabilities, Arc<RecordingSessions>) {
    init_tracing();
    let sessions = RecordingSessions::new(config.clone());
    let caps = Capabilities::builder()
        .config(config)
        .session_factory(sessions.clone())
        .build()
        .unwrap();
    (caps, sessions)
}
