//! Request classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::net::{Request, RequestMode};

/// Path extensions served cache-first from the static store.
pub const STATIC_EXTENSIONS: &[&str] =
    &["css", "js", "png", "jpg", "jpeg", "gif", "svg", "ico", "woff", "woff2", "ttf", "eot"];

/// Strategy class of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestClass {
    Navigation,
    StaticAsset,
    Dynamic,
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RequestClass::Navigation => "navigation",
            RequestClass::StaticAsset => "static-asset",
            RequestClass::Dynamic => "dynamic",
        })
    }
}

/// Classify `request`, or `None` when it must pass through untouched
/// (any scheme other than http/https).
pub fn classify(request: &Request) -> Option<RequestClass> {
    match request.url().scheme() {
        "http" | "https" => {}
        _ => return None,
    }

    if request.mode() == RequestMode::Navigate {
        return Some(RequestClass::Navigation);
    }

    if is_static_asset(request.url().path()) {
        return Some(RequestClass::StaticAsset);
    }

    Some(RequestClass::Dynamic)
}

/// Case-sensitive extension check on a URL path (query already excluded).
pub fn is_static_asset(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| STATIC_EXTENSIONS.contains(&ext))
}
