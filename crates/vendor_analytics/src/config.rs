use std::{env, fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_ENDPOINT: &str = "https://go.startmyloveengine.com";
/// Versioned allowlist shipped with the site; what pages validate against.
pub const DEFAULT_SCHEMA_URL: &str = "https://startmyloveengine.com/config/analytics.json";
/// Schema served by the collection worker; the drift check compares against it.
pub const DEFAULT_LIVE_SCHEMA_URL: &str = "https://go.startmyloveengine.com/schema";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const ENDPOINT_ENV: &str = "ANALYTICS_ENDPOINT";
pub const SCHEMA_URL_ENV: &str = "ANALYTICS_SCHEMA_URL";
pub const SCHEMA_TOKEN_ENV: &str = "ANALYTICS_SCHEMA_TOKEN";

/// Where events go and where the allowlist schema comes from.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Collection worker base URL; `/visit` and `/click` are appended.
    pub endpoint: String,
    /// Location of the allowlist schema document.
    pub schema_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            schema_url: DEFAULT_SCHEMA_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl AnalyticsConfig {
    /// Parses a TOML config; missing keys fall back to the defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validated()
    }

    pub fn from_toml_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Defaults with `ANALYTICS_ENDPOINT` / `ANALYTICS_SCHEMA_URL` applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies `ANALYTICS_ENDPOINT` / `ANALYTICS_SCHEMA_URL` when set and non-blank.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(endpoint) = non_blank_env(ENDPOINT_ENV) {
            self.endpoint = endpoint;
        }
        if let Some(schema_url) = non_blank_env(SCHEMA_URL_ENV) {
            self.schema_url = schema_url;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn visit_url(&self) -> String {
        format!("{}/visit", self.endpoint.trim_end_matches('/'))
    }

    pub fn click_url(&self) -> String {
        format!("{}/click", self.endpoint.trim_end_matches('/'))
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Empty { field: "endpoint" });
        }
        if self.schema_url.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "schema_url",
            });
        }
        Ok(self)
    }
}

pub(crate) fn non_blank_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, MutexGuard, OnceLock};

    use super::*;

    fn env_guard() -> MutexGuard<'static, ()> {
        static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn env_overrides_replace_endpoint_and_schema_url() {
        let _guard = env_guard();
        env::set_var(ENDPOINT_ENV, " https://collect.staging.example ");
        env::set_var(SCHEMA_URL_ENV, "https://staging.example/config/analytics.json");

        let config = AnalyticsConfig::from_env();

        env::remove_var(ENDPOINT_ENV);
        env::remove_var(SCHEMA_URL_ENV);
        assert_eq!(config.endpoint, "https://collect.staging.example");
        assert_eq!(config.schema_url, "https://staging.example/config/analytics.json");
        assert_eq!(config.visit_url(), "https://collect.staging.example/visit");
    }

    #[test]
    fn blank_env_values_keep_defaults() {
        let _guard = env_guard();
        env::set_var(ENDPOINT_ENV, "   ");
        env::remove_var(SCHEMA_URL_ENV);

        let config = AnalyticsConfig::from_env();

        env::remove_var(ENDPOINT_ENV);
        assert_eq!(config, AnalyticsConfig::default());
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.schema_url, DEFAULT_SCHEMA_URL);
    }

    #[test]
    fn page_schema_and_live_schema_defaults_differ() {
        assert!(DEFAULT_SCHEMA_URL.ends_with("/config/analytics.json"));
        assert_ne!(DEFAULT_SCHEMA_URL, DEFAULT_LIVE_SCHEMA_URL);
    }

    #[test]
    fn toml_overrides_only_named_keys() {
        let config =
            AnalyticsConfig::from_toml_str("schema_url = \"https://example.test/config/analytics.json\"\n")
                .unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.schema_url, "https://example.test/config/analytics.json");
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn blank_endpoint_is_rejected() {
        let err = AnalyticsConfig::from_toml_str("endpoint = \"  \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Empty { field: "endpoint" }));
    }

    #[test]
    fn event_urls_tolerate_trailing_slash() {
        let config = AnalyticsConfig {
            endpoint: "https://collect.example/".to_string(),
            ..AnalyticsConfig::default()
        };
        assert_eq!(config.visit_url(), "https://collect.example/visit");
        assert_eq!(config.click_url(), "https://collect.example/click");
    }

    #[test]
    fn config_file_is_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.toml");
        std::fs::write(&path, "endpoint = \"https://collect.example\"\ntimeout_ms = 2500\n").unwrap();
        let config = AnalyticsConfig::from_toml_path(&path).unwrap();
        assert_eq!(config.endpoint, "https://collect.example");
        assert_eq!(config.timeout(), Duration::from_millis(2500));

        let missing = AnalyticsConfig::from_toml_path(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
