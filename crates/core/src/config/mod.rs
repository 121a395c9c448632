//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (STASH_*)
//! 2. TOML config file (if STASH_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;
use crate::cache::VersionRegistry;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (STASH_*)
/// 2. TOML config file (if STASH_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite file backing every store.
    ///
    /// Set via STASH_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Base URL that manifest and offline paths resolve against.
    ///
    /// Set via STASH_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Release tag driving the store names.
    ///
    /// Set via STASH_VERSION_TAG environment variable.
    #[serde(default = "default_version_tag")]
    pub version_tag: String,

    /// Root-relative paths fetched into the static store at install.
    #[serde(default = "default_static_manifest")]
    pub static_manifest: Vec<String>,

    /// Root-relative path of the page served when navigation is offline.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Maximum entries kept in the dynamic store.
    #[serde(default = "default_dynamic_max_items")]
    pub dynamic_max_items: usize,

    /// Activate straight after a successful install instead of waiting for
    /// a SKIP_WAITING message.
    #[serde(default = "default_true")]
    pub skip_waiting_on_install: bool,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum response body bytes accepted from the network.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Network timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Endpoint consulted by CHECK_UPDATE. Disabled when unset.
    #[serde(default)]
    pub update_url: Option<String>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./stash-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_version_tag() -> String {
    "v5.0.0".into()
}

fn default_static_manifest() -> Vec<String> {
    [
        "/",
        "/offline.html",
        "/manifest.json",
        "/public/css/style.css",
        "/public/js/main.js",
        "/public/icons/icon-192x192-new.png",
        "/public/icons/icon-512x512-new.png",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_dynamic_max_items() -> usize {
    50
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    "stash/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            version_tag: default_version_tag(),
            static_manifest: default_static_manifest(),
            offline_page: default_offline_page(),
            dynamic_max_items: default_dynamic_max_items(),
            skip_waiting_on_install: true,
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            update_url: None,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Store names for the configured release.
    pub fn versions(&self) -> VersionRegistry {
        VersionRegistry::new(&self.version_tag)
    }

    /// Resolve a root-relative path against `origin`.
    pub fn resolve(&self, path: &str) -> Result<Url, Error> {
        let base = Url::parse(&self.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.origin)))?;
        base.join(path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `STASH_`
    /// 2. TOML file from `STASH_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed, or
    /// validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("STASH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("STASH_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./stash-cache.sqlite"));
        assert_eq!(config.origin, "http://localhost:3000");
        assert_eq!(config.version_tag, "v5.0.0");
        assert_eq!(config.static_manifest.len(), 7);
        assert_eq!(config.static_manifest[0], "/");
        assert_eq!(config.offline_page, "/offline.html");
        assert_eq!(config.dynamic_max_items, 50);
        assert!(config.skip_waiting_on_install);
        assert_eq!(config.user_agent, "stash/0.1");
        assert!(config.update_url.is_none());
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_versions_follow_tag() {
        let config = AppConfig { version_tag: "v6.0.0".into(), ..Default::default() };
        assert_eq!(config.versions().static_store(), "static-v6.0.0");
    }

    #[test]
    fn test_resolve_paths() {
        let config = AppConfig::default();
        assert_eq!(config.resolve("/").unwrap().as_str(), "http://localhost:3000/");
        assert_eq!(
            config.resolve("/public/js/main.js").unwrap().as_str(),
            "http://localhost:3000/public/js/main.js"
        );
    }

    #[test]
    fn test_load_from_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "stash.toml",
                r#"
                version_tag = "v7.1.0"
                dynamic_max_items = 10
                static_manifest = ["/", "/offline.html"]
                "#,
            )?;
            jail.set_env("STASH_CONFIG_FILE", "stash.toml");
            jail.set_env("STASH_ORIGIN", "https://app.example.com");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.version_tag, "v7.1.0");
            assert_eq!(config.dynamic_max_items, 10);
            assert_eq!(config.static_manifest, vec!["/", "/offline.html"]);
            assert_eq!(config.origin, "https://app.example.com");
            Ok(())
        });
    }
}
