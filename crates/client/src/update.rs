//! Release check against a published version endpoint.
//!
//! The endpoint answers with either `{"version": "v6.0.0"}` or the bare tag as
//! text. Any tag different from the running one counts as an update.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use stash_core::Error;
use stash_core::worker::UpdateCheck;

use crate::fetch::map_send_error;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct VersionDoc {
    version: String,
}

/// Parse the endpoint body into a release tag.
fn parse_tag(body: &str) -> Option<String> {
    let tag = match serde_json::from_str::<VersionDoc>(body) {
        Ok(doc) => doc.version,
        Err(_) => body.to_string(),
    };
    let tag = tag.trim();
    if tag.is_empty() { None } else { Some(tag.to_string()) }
}

/// [`UpdateCheck`] that polls a version endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct RemoteUpdateCheck {
    http: Client,
    url: Url,
}

impl RemoteUpdateCheck {
    pub fn new(url: &str, user_agent: &str) -> Result<Self, Error> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http, url })
    }

    /// Fetch the currently published tag.
    pub async fn latest(&self) -> Result<String, Error> {
        let response = self
            .http
            .get(self.url.clone())
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpdateCheckFailed(format!("status {}", status.as_u16())));
        }

        let body = response.text().await.map_err(map_send_error)?;
        parse_tag(&body).ok_or_else(|| Error::UpdateCheckFailed("empty version document".into()))
    }
}

#[async_trait]
impl UpdateCheck for RemoteUpdateCheck {
    async fn check(&self, current: &str) -> Result<bool, Error> {
        let latest = self.latest().await?;
        let found = latest != current;
        tracing::info!(current, latest = %latest, found, "update check");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag(r#"{"version":"v6.0.0"}"#), Some("v6.0.0".into()));
        assert_eq!(parse_tag("v6.0.0\n"), Some("v6.0.0".into()));
        assert_eq!(parse_tag("   "), None);
        assert_eq!(parse_tag(r#"{"version":""}"#), None);
    }

    #[test]
    fn test_new_rejects_bad_url() {
        assert!(matches!(RemoteUpdateCheck::new("::", "stash/0.1"), Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_check_detects_new_release() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/version.json");
                then.status(200).body(r#"{"version":"v6.0.0"}"#);
            })
            .await;

        let check = RemoteUpdateCheck::new(&server.url("/version.json"), "stash/0.1").unwrap();
        assert!(check.check("v5.0.0").await.unwrap());
        assert!(!check.check("v6.0.0").await.unwrap());
    }

    #[tokio::test]
    async fn test_check_server_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/version.json");
                then.status(503);
            })
            .await;

        let check = RemoteUpdateCheck::new(&server.url("/version.json"), "stash/0.1").unwrap();
        assert!(matches!(check.check("v5.0.0").await, Err(Error::UpdateCheckFailed(_))));
    }
}
