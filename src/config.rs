use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::error::{LogoVerifyError, Result};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_LOG_FILTER: &str = "logo_verify=info,tower_http=info";

/// Main configuration structure loaded from logo_verify.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub http: HttpConfig,
    /// Credentials, loaded from environment variables only
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Multimodal model settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub model: String,
    pub api_base: String,
    pub timeout_ms: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            timeout_ms: 60_000,
        }
    }
}

/// Document store location; credentials live in [`RuntimeConfig`]
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_url: String,
    pub database_ns: String,
    pub database_db: String,
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "127.0.0.1:8000".to_string(),
            database_ns: "logo_verify".to_string(),
            database_db: "reports".to_string(),
            table: "logo_reports".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: SocketAddr,
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8787)),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub gemini_api_key: Option<String>,
    pub database_user: Option<String>,
    pub database_pass: Option<String>,
}

/// Load environment variables: LOGO_ENV_FILE if set, otherwise ./.env.
/// Variables already present in the process environment win.
pub fn load_env_file() {
    if let Ok(env_path) = std::env::var("LOGO_ENV_FILE") {
        let _ = dotenvy::from_path(env_path);
    } else {
        let _ = dotenvy::dotenv();
    }
}

/// Everything needed to open a document-store session
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub table: String,
    pub username: String,
    pub password: String,
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses LOGO_VERIFY_CONFIG environment variable or defaults to "logo_verify.toml"
    pub fn load() -> Result<Self> {
        load_env_file();

        let config_path = std::env::var("LOGO_VERIFY_CONFIG")
            .unwrap_or_else(|_| "logo_verify.toml".to_string());

        let mut config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            Self::from_toml_str(&content)?
        } else {
            tracing::debug!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate();
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| LogoVerifyError::config(format!("invalid TOML: {e}")))
    }

    /// Apply environment overrides (env-first). Empty values count as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = get("GEMINI_MODEL") {
            self.inference.model = model;
        }
        if let Some(base) = get("GEMINI_API_BASE") {
            self.inference.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(timeout) = get("GEMINI_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok()) {
            self.inference.timeout_ms = timeout;
        }

        if let Some(url) = get("LOGO_DB_URL") {
            self.store.database_url = url;
        }
        if let Some(ns) = get("LOGO_DB_NS") {
            self.store.database_ns = ns;
        }
        if let Some(db) = get("LOGO_DB_DB") {
            self.store.database_db = db;
        }
        if let Some(table) = get("LOGO_DB_TABLE") {
            self.store.table = table;
        }

        if let Some(bind) = get("LOGO_HTTP_BIND").and_then(|v| v.parse::<SocketAddr>().ok()) {
            self.http.bind = bind;
        }
        if let Some(max) = get("LOGO_HTTP_MAX_BODY_BYTES").and_then(|v| v.parse::<usize>().ok()) {
            self.http.max_body_bytes = max;
        }

        self.runtime.gemini_api_key = get("GEMINI_API_KEY");
        self.runtime.database_user = get("LOGO_DB_USER");
        self.runtime.database_pass = get("LOGO_DB_PASS");
    }

    /// Clamp out-of-range values and warn about suspicious ones
    fn validate(&mut self) {
        if self.inference.timeout_ms == 0 {
            tracing::warn!("GEMINI_TIMEOUT_MS of 0 is invalid, using 60000");
            self.inference.timeout_ms = 60_000;
        }
        if self.http.max_body_bytes < 1024 {
            tracing::warn!(
                "max_body_bytes {} is too small, using 1024",
                self.http.max_body_bytes
            );
            self.http.max_body_bytes = 1024;
        }
        if self.runtime.gemini_api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY is not set; logo analysis will fail");
        }
        if self.runtime.database_user.is_none() || self.runtime.database_pass.is_none() {
            tracing::warn!("LOGO_DB_USER/LOGO_DB_PASS not set; report submission will fail");
        }
    }

    /// The inference API key, or a configuration error when it is absent
    pub fn gemini_api_key(&self) -> Result<&str> {
        self.runtime
            .gemini_api_key
            .as_deref()
            .ok_or_else(|| LogoVerifyError::config("GEMINI_API_KEY is not configured"))
    }

    /// Document-store settings, or a configuration error when credentials are absent
    pub fn store_settings(&self) -> Result<StoreSettings> {
        let username = self
            .runtime
            .database_user
            .clone()
            .ok_or_else(|| LogoVerifyError::config("LOGO_DB_USER is not configured"))?;
        let password = self
            .runtime
            .database_pass
            .clone()
            .ok_or_else(|| LogoVerifyError::config("LOGO_DB_PASS is not configured"))?;

        Ok(StoreSettings {
            url: self.store.database_url.clone(),
            namespace: self.store.database_ns.clone(),
            database: self.store.database_db.clone(),
            table: self.store.table.clone(),
            username,
            password,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.inference.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.store.table, "logo_reports");
        assert_eq!(config.http.bind.port(), 8787);
        assert_eq!(config.http.max_body_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = Config::default();
        let err = config.gemini_api_key().unwrap_err();
        assert!(matches!(err, LogoVerifyError::Config { .. }));
    }

    #[test]
    fn test_missing_db_password_is_config_error() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[("LOGO_DB_USER", "root")]));
        let err = config.store_settings().unwrap_err();
        assert!(err.to_string().contains("LOGO_DB_PASS"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[
            ("GEMINI_API_KEY", "k-123"),
            ("GEMINI_MODEL", "gemini-test"),
            ("GEMINI_API_BASE", "http://localhost:9000/v1beta/"),
            ("LOGO_DB_USER", "root"),
            ("LOGO_DB_PASS", "secret"),
            ("LOGO_DB_TABLE", "flagged"),
            ("LOGO_HTTP_BIND", "0.0.0.0:9999"),
        ]));

        assert_eq!(config.gemini_api_key().unwrap(), "k-123");
        assert_eq!(config.inference.model, "gemini-test");
        assert_eq!(config.inference.api_base, "http://localhost:9000/v1beta");
        assert_eq!(config.http.bind.port(), 9999);

        let settings = config.store_settings().unwrap();
        assert_eq!(settings.table, "flagged");
        assert_eq!(settings.password, "secret");
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[("GEMINI_API_KEY", "   ")]));
        assert!(config.gemini_api_key().is_err());
    }

    #[test]
    fn test_toml_sections_are_optional() {
        let config = Config::from_toml_str(
            r#"
[inference]
model = "gemini-2.0-flash"

[http]
bind = "127.0.0.1:3000"
"#,
        )
        .unwrap();
        assert_eq!(config.inference.model, "gemini-2.0-flash");
        assert_eq!(config.inference.timeout_ms, 60_000);
        assert_eq!(config.http.bind.port(), 3000);
        assert_eq!(config.store.database_ns, "logo_verify");
    }
}
