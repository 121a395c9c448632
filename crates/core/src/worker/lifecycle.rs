//! Install and activate phases.
//!
//! Install fills the static store from the manifest, all or nothing. Activate
//! drops every store the current release does not name and starts
//! controlling requests. A failed phase leaves the worker not controlling, so
//! requests keep passing straight to the network.

use std::fmt;

use futures::future::{join_all, try_join_all};
use serde::{Deserialize, Serialize};

use super::Worker;
use crate::Error;
use crate::net::Request;

/// Lifecycle position of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    /// Installed and waiting to activate.
    Installed,
    Activating,
    Activated,
    /// Install failed; a later install may retry.
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
pub(super) struct Lifecycle {
    pub(super) state: WorkerState,
    pub(super) skip_waiting: bool,
    pub(super) controlling: bool,
}

impl Lifecycle {
    pub(super) fn new() -> Self {
        Self { state: WorkerState::Parsed, skip_waiting: false, controlling: false }
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Installation {
    /// Manifest entries written to the static store.
    pub cached: usize,
    /// Present when install went straight on to activate.
    pub activation: Option<Activation>,
}

/// Result of a successful activation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Activation {
    /// Stale stores removed.
    pub deleted: Vec<String>,
    /// Stale stores whose deletion failed; retried on the next activation.
    pub failed: Vec<String>,
}

impl Worker {
    /// Populate the static store from the manifest.
    ///
    /// Every manifest URL is fetched before anything is written, and the
    /// entries go in with one atomic bulk insert. Any transport failure or
    /// non-2xx status fails the install and the worker becomes redundant.
    pub async fn install(&self) -> Result<Installation, Error> {
        {
            let mut lc = self.lifecycle.write().await;
            match lc.state {
                WorkerState::Parsed | WorkerState::Redundant => lc.state = WorkerState::Installing,
                other => return Err(Error::InvalidState(format!("cannot install while {other}"))),
            }
        }

        tracing::info!(tag = self.versions.tag(), "installing");

        let cached = match self.populate_static().await {
            Ok(cached) => cached,
            Err(e) => {
                self.lifecycle.write().await.state = WorkerState::Redundant;
                tracing::error!(error = %e, "install failed");
                return Err(e);
            }
        };

        let activate_now = {
            let mut lc = self.lifecycle.write().await;
            lc.state = WorkerState::Installed;
            lc.skip_waiting |= self.skip_waiting_on_install;
            lc.skip_waiting
        };

        tracing::info!(cached, store = self.versions.static_store(), "installed");

        let activation = if activate_now { Some(self.activate().await?) } else { None };

        Ok(Installation { cached, activation })
    }

    async fn populate_static(&self) -> Result<usize, Error> {
        let store = self.versions.static_store();
        self.storage.open(store).await?;

        let fetches = self.manifest.iter().map(|url| async move {
            let request = Request::get(url.clone());
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| Error::InstallFailed(format!("{url}: {e}")))?;
            if !response.is_ok() {
                return Err(Error::InstallFailed(format!("{url}: status {}", response.status)));
            }
            Ok((request, response))
        });
        let entries = try_join_all(fetches).await?;
        let cached = entries.len();

        self.storage.put_all(store, entries).await?;

        Ok(cached)
    }

    /// Delete stale stores, then claim clients.
    ///
    /// Allowed from `Installed`, and again from `Activated` (a re-run with an
    /// unchanged release deletes nothing). Each stale store is deleted on its
    /// own; one that cannot be removed is reported in `failed` and does not
    /// block activation.
    pub async fn activate(&self) -> Result<Activation, Error> {
        let previous = {
            let mut lc = self.lifecycle.write().await;
            match lc.state {
                WorkerState::Installed | WorkerState::Activated => {
                    let previous = lc.state;
                    lc.state = WorkerState::Activating;
                    previous
                }
                other => return Err(Error::InvalidState(format!("cannot activate while {other}"))),
            }
        };

        tracing::info!(tag = self.versions.tag(), "activating");

        let names = match self.storage.store_names().await {
            Ok(names) => names,
            Err(e) => {
                self.lifecycle.write().await.state = previous;
                tracing::error!(error = %e, "activation failed listing stores");
                return Err(e);
            }
        };

        let stale = self.versions.stale(&names);
        let results = join_all(stale.iter().map(|name| async move {
            tracing::info!(store = name, "deleting stale store");
            (*name, self.storage.delete_store(name).await)
        }))
        .await;

        let mut activation = Activation::default();
        for (name, result) in results {
            match result {
                Ok(_) => activation.deleted.push(name.to_string()),
                Err(e) => {
                    tracing::warn!(store = name, error = %e, "stale store deletion failed");
                    activation.failed.push(name.to_string());
                }
            }
        }

        {
            let mut lc = self.lifecycle.write().await;
            lc.state = WorkerState::Activated;
            lc.controlling = true;
        }

        tracing::info!(deleted = activation.deleted.len(), failed = activation.failed.len(), "activated, clients claimed");

        Ok(activation)
    }

    /// Force activation without waiting. A no-op once active; while an
    /// install is still running, activation follows it.
    pub async fn skip_waiting(&self) -> Result<(), Error> {
        let due = {
            let mut lc = self.lifecycle.write().await;
            lc.skip_waiting = true;
            lc.state == WorkerState::Installed
        };

        if due {
            self.activate().await?;
        }
        Ok(())
    }

    /// Delete every store, current ones included. Returns how many were removed.
    pub async fn clear_caches(&self) -> Result<usize, Error> {
        let names = self.storage.store_names().await?;
        let results = join_all(names.iter().map(|name| self.storage.delete_store(name))).await;

        let mut deleted = 0;
        for (name, result) in names.iter().zip(results) {
            match result {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(store = %name, error = %e, "store deletion failed"),
            }
        }
        Ok(deleted)
    }

    /// Bring the worker up for the configured release.
    ///
    /// When the current static store already holds every manifest entry the
    /// release counts as installed and only activation runs; otherwise a full
    /// install runs.
    pub async fn start(&self) -> Result<WorkerState, Error> {
        let keys = self.storage.keys(self.versions.static_store()).await?;
        let installed = self
            .manifest
            .iter()
            .all(|url| keys.iter().any(|key| key.url() == url));

        if installed {
            tracing::info!(store = self.versions.static_store(), "static store already warm");
            self.lifecycle.write().await.state = WorkerState::Installed;
            self.activate().await?;
        } else {
            self.install().await?;
        }

        Ok(self.state().await)
    }
}
