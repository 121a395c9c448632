//! The fetch-interception worker.
//!
//! A [`Worker`] owns the injected store adapter, network, and update check,
//! and handles four event kinds through one entry point, [`Worker::dispatch`]:
//!
//! - `Install`: warm the static store from the manifest
//! - `Activate`: drop stale stores and start controlling requests
//! - `Fetch`: classify and answer one request
//! - `Message`: run a control command, replying on the port if given
//!
//! Requests from different callers interleave freely at store and network
//! awaits; nothing is locked around store access.

pub mod classify;
pub mod lifecycle;
pub mod message;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;
use url::Url;

use crate::Error;
use crate::cache::{CacheStorage, VersionRegistry};
use crate::config::AppConfig;
use crate::net::{Network, Request, Response};

pub use classify::{RequestClass, classify};
pub use lifecycle::{Activation, Installation, WorkerState};
pub use message::{Command, NoUpdateCheck, Reply, ReplyPort, UpdateCheck};

use lifecycle::Lifecycle;

/// What the worker did with an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the caller goes to the network itself.
    Passthrough,
    Response(Response),
    /// Intercepted, but neither network nor stores produced a response.
    NoResponse,
}

/// Events the worker handles.
#[derive(Debug)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    Message { data: Value, port: Option<ReplyPort> },
}

/// Result of [`Worker::dispatch`], one variant per event kind.
#[derive(Debug)]
pub enum EventOutcome {
    Installed(Installation),
    Activated(Activation),
    Fetched(FetchOutcome),
    Handled,
}

/// Cache-strategy engine for one release.
pub struct Worker {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    updates: Arc<dyn UpdateCheck>,
    versions: VersionRegistry,
    manifest: Vec<Url>,
    offline_page: Url,
    dynamic_max_items: usize,
    skip_waiting_on_install: bool,
    lifecycle: RwLock<Lifecycle>,
    background: Mutex<JoinSet<()>>,
}

impl Worker {
    /// Build a worker for the release described by `config`.
    ///
    /// Manifest and offline paths are resolved against `config.origin`.
    pub fn new(config: &AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let manifest = config
            .static_manifest
            .iter()
            .map(|path| config.resolve(path))
            .collect::<Result<Vec<_>, _>>()?;
        let offline_page = config.resolve(&config.offline_page)?;

        Ok(Self {
            storage,
            network,
            updates: Arc::new(NoUpdateCheck),
            versions: config.versions(),
            manifest,
            offline_page,
            dynamic_max_items: config.dynamic_max_items,
            skip_waiting_on_install: config.skip_waiting_on_install,
            lifecycle: RwLock::new(Lifecycle::new()),
            background: Mutex::new(JoinSet::new()),
        })
    }

    /// Use `updates` for CHECK_UPDATE.
    pub fn with_update_check(mut self, updates: Arc<dyn UpdateCheck>) -> Self {
        self.updates = updates;
        self
    }

    pub fn versions(&self) -> &VersionRegistry {
        &self.versions
    }

    pub fn manifest(&self) -> &[Url] {
        &self.manifest
    }

    pub async fn state(&self) -> WorkerState {
        self.lifecycle.read().await.state
    }

    /// Whether fetches are being intercepted.
    pub async fn is_controlling(&self) -> bool {
        self.lifecycle.read().await.controlling
    }

    /// Route one event to its handler.
    ///
    /// Only lifecycle events can fail; fetches and messages always complete.
    pub async fn dispatch(&self, event: Event) -> Result<EventOutcome, Error> {
        match event {
            Event::Install => self.install().await.map(EventOutcome::Installed),
            Event::Activate => self.activate().await.map(EventOutcome::Activated),
            Event::Fetch(request) => Ok(EventOutcome::Fetched(self.handle_fetch(request).await)),
            Event::Message { data, port } => {
                self.on_message(&data, port).await;
                Ok(EventOutcome::Handled)
            }
        }
    }

    /// Classify `request` and run the matching strategy.
    pub async fn handle_fetch(&self, request: Request) -> FetchOutcome {
        if !self.is_controlling().await {
            return FetchOutcome::Passthrough;
        }

        let Some(class) = classify(&request) else {
            return FetchOutcome::Passthrough;
        };

        tracing::debug!(url = %request.url(), %class, "intercepted");

        match class {
            RequestClass::Navigation => FetchOutcome::Response(self.handle_navigation(&request).await),
            RequestClass::StaticAsset => FetchOutcome::Response(self.handle_static_asset(&request).await),
            RequestClass::Dynamic => match self.handle_dynamic(&request).await {
                Some(response) => FetchOutcome::Response(response),
                None => FetchOutcome::NoResponse,
            },
        }
    }

    /// Wait for background store writes started by earlier fetches, including
    /// any started while waiting. Fetches are not held up by the wait.
    pub async fn wait_until_idle(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.background.lock().await);
            if pending.is_empty() {
                break;
            }
            while let Some(result) = pending.join_next().await {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "background write task failed");
                }
            }
        }
    }
}
