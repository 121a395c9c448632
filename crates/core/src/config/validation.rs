//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;
use url::Url;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn check_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| invalid(field, format!("not a URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(field, format!("unsupported scheme: {scheme}"))),
    }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `version_tag` is empty or contains whitespace
    /// - `origin` or `update_url` is not an http(s) URL
    /// - a manifest path or `offline_page` is not root-relative
    /// - `dynamic_max_items` is 0
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version_tag.is_empty() {
            return Err(invalid("version_tag", "must not be empty"));
        }
        if self.version_tag.chars().any(char::is_whitespace) {
            return Err(invalid("version_tag", "must not contain whitespace"));
        }

        check_http_url("origin", &self.origin)?;
        if let Some(update_url) = &self.update_url {
            check_http_url("update_url", update_url)?;
        }

        if let Some(path) = self.static_manifest.iter().find(|p| !p.starts_with('/')) {
            return Err(invalid("static_manifest", format!("path must start with '/': {path}")));
        }
        if !self.offline_page.starts_with('/') {
            return Err(invalid("offline_page", "must start with '/'"));
        }

        if self.dynamic_max_items == 0 {
            return Err(invalid("dynamic_max_items", "must be greater than 0"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if !self.static_manifest.contains(&self.offline_page) {
            tracing::warn!(
                offline_page = %self.offline_page,
                "offline_page is not in static_manifest; \
                 offline navigation falls back to the built-in page"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: Result<(), ConfigError>) -> String {
        match result {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_version_tag() {
        let config = AppConfig { version_tag: String::new(), ..Default::default() };
        assert_eq!(field_of(config.validate()), "version_tag");

        let config = AppConfig { version_tag: "v 5".into(), ..Default::default() };
        assert_eq!(field_of(config.validate()), "version_tag");
    }

    #[test]
    fn test_validate_origin_scheme() {
        let config = AppConfig { origin: "ftp://example.com".into(), ..Default::default() };
        assert_eq!(field_of(config.validate()), "origin");

        let config = AppConfig { origin: "localhost".into(), ..Default::default() };
        assert_eq!(field_of(config.validate()), "origin");
    }

    #[test]
    fn test_validate_update_url() {
        let config = AppConfig { update_url: Some("not a url".into()), ..Default::default() };
        assert_eq!(field_of(config.validate()), "update_url");

        let config = AppConfig { update_url: Some("https://example.com/version.json".into()), ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_relative_manifest_path() {
        let config = AppConfig { static_manifest: vec!["/".into(), "style.css".into()], ..Default::default() };
        assert_eq!(field_of(config.validate()), "static_manifest");
    }

    #[test]
    fn test_validate_offline_page() {
        let config = AppConfig { offline_page: "offline.html".into(), ..Default::default() };
        assert_eq!(field_of(config.validate()), "offline_page");
    }

    #[test]
    fn test_validate_dynamic_max_items_zero() {
        let config = AppConfig { dynamic_max_items: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()), "dynamic_max_items");
    }

    #[test]
    fn test_validate_max_bytes() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()), "max_bytes");

        let config = AppConfig { max_bytes: 51 * 1024 * 1024, ..Default::default() };
        assert_eq!(field_of(config.validate()), "max_bytes");
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert_eq!(field_of(config.validate()), "timeout_ms");

        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert_eq!(field_of(config.validate()), "timeout_ms");
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        assert_eq!(field_of(config.validate()), "user_agent");
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig { max_bytes: 1, timeout_ms: 100, dynamic_max_items: 1, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_offline_page_outside_manifest_is_allowed() {
        let config = AppConfig { static_manifest: vec!["/".into()], ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
