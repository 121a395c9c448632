//! Out-of-band control messages.
//!
//! Messages arrive as JSON objects with a `type` field and an optional reply
//! port. Unknown types are dropped without a reply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

use super::Worker;
use crate::Error;

/// Channel a reply is posted on.
pub type ReplyPort = oneshot::Sender<Reply>;

/// Recognized control commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SkipWaiting,
    GetVersion,
    CheckUpdate,
    ClearCaches,
}

impl Command {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "SKIP_WAITING" => Some(Command::SkipWaiting),
            "GET_VERSION" => Some(Command::GetVersion),
            "CHECK_UPDATE" => Some(Command::CheckUpdate),
            "CLEAR_CACHES" => Some(Command::ClearCaches),
            _ => None,
        }
    }

    /// Extract the command from a message payload.
    pub fn from_message(data: &Value) -> Option<Self> {
        data.get("type").and_then(Value::as_str).and_then(Self::parse)
    }
}

/// Reply payloads posted back over a [`ReplyPort`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum Reply {
    Version {
        version: String,
    },
    Update {
        #[serde(rename = "hasUpdate")]
        has_update: bool,
    },
}

/// External check for a newer release.
#[async_trait]
pub trait UpdateCheck: Send + Sync {
    /// Whether a release other than `current` is published.
    async fn check(&self, current: &str) -> Result<bool, Error>;
}

/// Update check used when no update endpoint is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUpdateCheck;

#[async_trait]
impl UpdateCheck for NoUpdateCheck {
    async fn check(&self, _current: &str) -> Result<bool, Error> {
        Ok(false)
    }
}

fn post(port: Option<ReplyPort>, reply: Reply) {
    match port {
        Some(port) => {
            if port.send(reply).is_err() {
                tracing::debug!("reply port closed before reply was posted");
            }
        }
        None => tracing::debug!(?reply, "no reply port; dropping reply"),
    }
}

impl Worker {
    /// Handle one control message. Failures are logged, never returned.
    pub async fn on_message(&self, data: &Value, port: Option<ReplyPort>) {
        let Some(command) = Command::from_message(data) else {
            tracing::debug!(message = %data, "ignoring unrecognized message");
            return;
        };

        tracing::info!(?command, "control message");

        match command {
            Command::SkipWaiting => {
                if let Err(e) = self.skip_waiting().await {
                    tracing::warn!(error = %e, "forced activation failed");
                }
            }
            Command::GetVersion => {
                post(port, Reply::Version { version: self.versions().tag().to_string() });
            }
            Command::CheckUpdate => {
                let has_update = match self.updates.check(self.versions().tag()).await {
                    Ok(found) => found,
                    Err(e) => {
                        tracing::warn!(error = %e, "update check failed");
                        false
                    }
                };
                post(port, Reply::Update { has_update });
            }
            Command::ClearCaches => match self.clear_caches().await {
                Ok(deleted) => tracing::info!(deleted, "cleared all stores"),
                Err(e) => tracing::warn!(error = %e, "clearing stores failed"),
            },
        }
    }
}
