//! Test doubles for the worker: a scripted network and a ready-made harness.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{UpdateCheck, Worker};
use crate::cache::CacheDb;
use crate::config::AppConfig;
use crate::net::{Network, Request, RequestMode, Response};
use crate::Error;

const ORIGIN: &str = "https://app.test";

/// In-process network with a route table and an offline switch.
///
/// Unrouted URLs answer 404.
#[derive(Default)]
pub(crate) struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Response>>,
    failing: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedNetwork {
    pub(crate) fn route(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub(crate) fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = request.url().as_str();

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        if self.failing.lock().unwrap().contains(url) {
            return Err(Error::Network(format!("connection reset: {url}")));
        }

        let routed = self.routes.lock().unwrap().get(url).cloned();
        Ok(routed.unwrap_or_else(|| Response::empty(404)))
    }
}

/// Update check with a fixed answer.
pub(crate) enum StaticUpdateCheck {
    /// The latest published tag.
    Found(String),
    Failing,
}

#[async_trait]
impl UpdateCheck for StaticUpdateCheck {
    async fn check(&self, current: &str) -> Result<bool, Error> {
        match self {
            StaticUpdateCheck::Found(latest) => Ok(latest != current),
            StaticUpdateCheck::Failing => Err(Error::UpdateCheckFailed("unreachable".into())),
        }
    }
}

/// A worker over an in-memory database and a scripted network that serves
/// every manifest path.
pub(crate) struct Harness {
    pub(crate) worker: Worker,
    pub(crate) db: CacheDb,
    pub(crate) net: Arc<ScriptedNetwork>,
    pub(crate) config: AppConfig,
}

impl Harness {
    pub(crate) async fn new(tag: &str) -> Self {
        let config = AppConfig { origin: ORIGIN.into(), version_tag: tag.into(), ..Default::default() };
        let db = CacheDb::open_in_memory().await.unwrap();
        let net = Arc::new(ScriptedNetwork::default());

        for path in &config.static_manifest {
            let response = if path.ends_with(".html") || path == "/" {
                Response::html(Self::body_for(path))
            } else {
                Response::new(200, vec![], Self::body_for(path))
            };
            net.route(&format!("{ORIGIN}{path}"), response);
        }

        let worker = Worker::new(&config, Arc::new(db.clone()), net.clone()).unwrap();
        Self { worker, db, net, config }
    }

    /// Harness whose worker has installed and activated.
    pub(crate) async fn started(tag: &str) -> Self {
        let harness = Self::new(tag).await;
        harness.worker.start().await.unwrap();
        harness
    }

    /// Another worker for `tag` sharing this harness's database and network.
    pub(crate) async fn worker_for(&self, tag: &str) -> Worker {
        let config = AppConfig { version_tag: tag.into(), ..self.config.clone() };
        Worker::new(&config, Arc::new(self.db.clone()), self.net.clone()).unwrap()
    }

    /// Same release, but install leaves the worker waiting.
    pub(crate) async fn waiting_worker(&self) -> Worker {
        let config = AppConfig { skip_waiting_on_install: false, ..self.config.clone() };
        Worker::new(&config, Arc::new(self.db.clone()), self.net.clone()).unwrap()
    }

    pub(crate) async fn worker_with_updates(&self, updates: Arc<dyn UpdateCheck>) -> Worker {
        Worker::new(&self.config, Arc::new(self.db.clone()), self.net.clone())
            .unwrap()
            .with_update_check(updates)
    }

    fn body_for(path: &str) -> String {
        format!("body of {path}")
    }

    pub(crate) fn manifest_body(&self, path: &str) -> String {
        Self::body_for(path)
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{ORIGIN}{path}")
    }

    pub(crate) fn request(&self, path: &str) -> Request {
        Request::parse(&self.url(path), RequestMode::NoCors).unwrap()
    }

    pub(crate) fn navigation(&self, path: &str) -> Request {
        Request::parse(&self.url(path), RequestMode::Navigate).unwrap()
    }
}
