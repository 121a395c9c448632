//! Per-class response strategies.
//!
//! | class        | primary | fallback                         | write                    |
//! |--------------|---------|----------------------------------|--------------------------|
//! | navigation   | network | any store, then offline page     | dynamic, in background   |
//! | static-asset | stores  | network, then empty 404          | static, on miss only     |
//! | dynamic      | network | any store (may be absent)        | dynamic, then eviction   |
//!
//! None of these return an error: network and store failures end in one of
//! the fallbacks.

use super::Worker;
use crate::Error;
use crate::cache::enforce_limit;
use crate::net::{Request, Response};

/// Served on navigation when neither network nor any store can answer.
pub const OFFLINE_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Offline</title>
</head>
<body>
<h1>You are offline</h1>
<p>This page is not available without a network connection. Try again once you are back online.</p>
</body>
</html>
"#;

/// Transport failures are routine while offline; anything else is worth a warning.
fn log_fetch_failure(request: &Request, error: &Error, what: &str) {
    if error.is_network() {
        tracing::debug!(url = %request.url(), error = %error, "{what}");
    } else {
        tracing::warn!(url = %request.url(), error = %error, "{what}");
    }
}

impl Worker {
    pub(super) async fn handle_navigation(&self, request: &Request) -> Response {
        match self.network.fetch(request).await {
            Ok(response) => {
                if request.is_cacheable() {
                    self.spawn_dynamic_write(request.clone(), response.clone()).await;
                }
                response
            }
            Err(e) => {
                log_fetch_failure(request, &e, "navigation offline, trying stores");
                match self.lookup(request).await {
                    Some(cached) => cached,
                    None => self.offline_response().await,
                }
            }
        }
    }

    pub(super) async fn handle_static_asset(&self, request: &Request) -> Response {
        if let Some(cached) = self.lookup(request).await {
            return cached;
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if request.is_cacheable()
                    && let Err(e) = self.storage.put(self.versions.static_store(), request, &response).await
                {
                    tracing::warn!(url = %request.url(), error = %e, "static store write failed");
                }
                response
            }
            Err(e) => {
                log_fetch_failure(request, &e, "static asset unavailable");
                Response::empty(404)
            }
        }
    }

    pub(super) async fn handle_dynamic(&self, request: &Request) -> Option<Response> {
        match self.network.fetch(request).await {
            Ok(response) => {
                if request.is_cacheable() {
                    self.write_dynamic(request, &response).await;
                }
                Some(response)
            }
            Err(e) => {
                log_fetch_failure(request, &e, "dynamic request offline, trying stores");
                self.lookup(request).await
            }
        }
    }

    /// Cross-store match; a store error counts as a miss. Only GET requests
    /// are ever stored, so nothing else can match.
    async fn lookup(&self, request: &Request) -> Option<Response> {
        if !request.is_cacheable() {
            return None;
        }
        match self.storage.match_any(request).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(url = %request.url(), error = %e, "store lookup failed");
                None
            }
        }
    }

    async fn offline_response(&self) -> Response {
        let page = Request::get(self.offline_page.clone());
        match self.lookup(&page).await {
            Some(cached) => cached,
            None => Response::html(OFFLINE_HTML),
        }
    }

    async fn write_dynamic(&self, request: &Request, response: &Response) {
        let store = self.versions.dynamic_store();
        if let Err(e) = self.storage.put(store, request, response).await {
            tracing::warn!(url = %request.url(), error = %e, "dynamic store write failed");
            return;
        }
        if let Err(e) = enforce_limit(self.storage.as_ref(), store, self.dynamic_max_items).await {
            tracing::warn!(store, error = %e, "eviction failed");
        }
    }

    /// Write after the response has been handed back; tracked so
    /// `wait_until_idle` can await it.
    async fn spawn_dynamic_write(&self, request: Request, response: Response) {
        let storage = self.storage.clone();
        let store = self.versions.dynamic_store().to_string();
        let max_items = self.dynamic_max_items;

        let mut background = self.background.lock().await;
        while background.try_join_next().is_some() {}
        background.spawn(async move {
            if let Err(e) = storage.put(&store, &request, &response).await {
                tracing::warn!(url = %request.url(), error = %e, "dynamic store write failed");
                return;
            }
            if let Err(e) = enforce_limit(storage.as_ref(), &store, max_items).await {
                tracing::warn!(store = %store, error = %e, "eviction failed");
            }
        });
    }
}
