//! Tool test fixtures: a worker over in-memory stores and an always-up network.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use stash_core::{AppConfig, CacheDb, Error, Network, Request, Response, Worker};

pub(crate) const ORIGIN: &str = "https://app.test";

/// Answers every URL with `200 "ok <path>"`, or fails when switched off.
#[derive(Default)]
pub(crate) struct EchoNetwork {
    offline: AtomicBool,
}

impl EchoNetwork {
    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl Network for EchoNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        Ok(Response::new(200, vec![("content-type".into(), "text/plain".into())], format!("ok {}", request.url().path())))
    }
}

pub(crate) struct Fixture {
    pub(crate) worker: Arc<Worker>,
    pub(crate) cache: CacheDb,
    pub(crate) net: Arc<EchoNetwork>,
}

impl Fixture {
    pub(crate) async fn new() -> Self {
        let config = AppConfig { origin: ORIGIN.into(), ..Default::default() };
        let cache = CacheDb::open_in_memory().await.unwrap();
        let net = Arc::new(EchoNetwork::default());
        let worker = Worker::new(&config, Arc::new(cache.clone()), net.clone()).unwrap();
        Self { worker: Arc::new(worker), cache, net }
    }

    pub(crate) async fn started() -> Self {
        let fixture = Self::new().await;
        fixture.worker.start().await.unwrap();
        fixture
    }

    pub(crate) fn url(path: &str) -> String {
        format!("{ORIGIN}{path}")
    }
}

/// Parse the JSON text of a tool result.
pub(crate) fn output_json(result: &rmcp::model::CallToolResult) -> serde_json::Value {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
