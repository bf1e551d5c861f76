// ============================================================
// APPLICATION CONFIG
// ============================================================
// Layered settings: defaults < TOML file < SALES_* environment

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::error::{AppError, Result};
use crate::domain::sales::ClassifierConfig;

pub const DEFAULT_CONFIG_FILE: &str = "sales-analytics.toml";

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "SALES_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = 1))]
    pub port: u16,

    /// Verbose logging
    pub debug: bool,

    /// Idle time after which a session is discarded
    #[validate(range(min = 1))]
    pub session_ttl_secs: u64,

    #[validate(range(min = 1))]
    pub sweep_interval_secs: u64,

    #[validate(range(min = 1))]
    pub max_upload_bytes: usize,

    /// Rows kept in ranked insights
    #[validate(range(min = 1, max = 100))]
    pub top_n: usize,

    /// Default page size of the raw data view
    #[validate(range(min = 1, max = 500))]
    pub preview_rows: usize,

    pub classifier: ClassifierConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            debug: false,
            session_ttl_secs: 3600,
            sweep_interval_secs: 60,
            max_upload_bytes: 50 * 1024 * 1024,
            top_n: 10,
            preview_rows: 10,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load and validate from all sources
    pub fn load() -> Result<Self> {
        let config: Self = Self::figment()
            .extract()
            .map_err(|e| AppError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Load `.env` first so its variables take part in the env layer
    pub fn load_with_dotenv() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let path = Self::config_path();
        if path.exists() {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("SALES_").only(&["host", "port", "debug"]))
    }

    fn config_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Run field rules and classifier checks
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        self.classifier.validate().map_err(AppError::Config)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.check().is_ok());
        assert_eq!(config.port, 5000);
        assert_eq!(config.max_upload_bytes, 52_428_800);
        assert_eq!(config.log_filter(), "info");
    }

    #[test]
    fn test_env_overrides_host_port_and_debug() {
        Jail::expect_with(|jail| {
            jail.set_env("SALES_PORT", "8080");
            jail.set_env("SALES_DEBUG", "true");
            jail.set_env("SALES_TOP_N", "3");

            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.port, 8080);
            assert!(config.debug);
            // Only host, port and debug come from the environment
            assert_eq!(config.top_n, 10);
            Ok(())
        });
    }

    #[test]
    fn test_toml_file_layer() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                    top_n = 5
                    preview_rows = 25

                    [classifier]
                    min_confidence = 0.3
                "#,
            )?;

            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.top_n, 5);
            assert_eq!(config.preview_rows, 25);
            assert_eq!(config.classifier.min_confidence, 0.3);
            assert_eq!(config.classifier.sample_rows, 1000);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_FILE, "top_n = 0")?;
            assert!(matches!(AppConfig::load(), Err(AppError::Config(_))));

            jail.create_file(DEFAULT_CONFIG_FILE, "[classifier]\nmin_confidence = 1.5")?;
            assert!(matches!(AppConfig::load(), Err(AppError::Config(_))));
            Ok(())
        });
    }
}
