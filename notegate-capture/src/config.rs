//! Configuration management for the capture service
//!
//! Settings sources priority:
//! 1. Command-line arguments (--port, --database, --gateway-url, ...)
//! 2. Environment variables (NOTEGATE_*)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! The TOML file is optional; a missing file means defaults, so the
//! service starts with zero configuration.

use notegate_common::categories::Category;
use notegate_common::{config as common_config, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Service configuration loaded from TOML plus overrides
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Path to SQLite database file (relative or absolute)
    #[serde(default = "common_config::default_database_path")]
    pub database_path: PathBuf,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Outbound chat gateway
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Classification oracle
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Confidence gate thresholds
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Stale clarification sweeping
    #[serde(default)]
    pub clarifications: ClarificationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chat gateway connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the outbound chat gateway
    #[serde(default = "default_gateway_url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_gateway_timeout_ms")]
    pub timeout_ms: u64,
}

/// Classification oracle connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Base URL of the classification oracle
    #[serde(default = "default_classifier_url")]
    pub base_url: String,

    /// Optional bearer token sent with classify calls
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-attempt request timeout in milliseconds
    #[serde(default = "default_classifier_timeout_ms")]
    pub timeout_ms: u64,

    /// Transient-failure retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Hard cap on total classification time per message, in milliseconds
    #[serde(default = "default_overall_deadline_ms")]
    pub overall_deadline_ms: u64,
}

/// Confidence gate thresholds.
///
/// A per-category value beats the default. Only dynamic categories pass
/// through the gate; user-declared captures always file at 1.0.
#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_threshold")]
    pub default: f64,

    #[serde(default)]
    pub people: Option<f64>,

    #[serde(default)]
    pub projects: Option<f64>,

    /// Ideas run noisier than the other categories, so the built-in
    /// override sits below the global default
    #[serde(default = "default_ideas_threshold")]
    pub ideas: Option<f64>,

    #[serde(default)]
    pub admin: Option<f64>,
}

/// Stale clarification sweeping
#[derive(Debug, Clone, Deserialize)]
pub struct ClarificationConfig {
    /// Age in days after which an unanswered clarification is swept
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: u32,

    /// Sweeper wakeup interval in seconds
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_port() -> u16 {
    5750
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:5760".to_string()
}

fn default_gateway_timeout_ms() -> u64 {
    10_000
}

fn default_classifier_url() -> String {
    "http://127.0.0.1:5770".to_string()
}

fn default_classifier_timeout_ms() -> u64 {
    15_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_overall_deadline_ms() -> u64 {
    30_000
}

fn default_threshold() -> f64 {
    0.6
}

fn default_ideas_threshold() -> Option<f64> {
    Some(0.5)
}

fn default_stale_after_days() -> u32 {
    7
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            database_path: common_config::default_database_path(),
            port: default_port(),
            gateway: GatewayConfig::default(),
            classifier: ClassifierConfig::default(),
            thresholds: ThresholdConfig::default(),
            clarifications: ClarificationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_gateway_url(),
            timeout_ms: default_gateway_timeout_ms(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: default_classifier_url(),
            api_key: None,
            timeout_ms: default_classifier_timeout_ms(),
            max_retries: default_max_retries(),
            overall_deadline_ms: default_overall_deadline_ms(),
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            default: default_threshold(),
            people: None,
            projects: None,
            ideas: default_ideas_threshold(),
            admin: None,
        }
    }
}

impl Default for ClarificationConfig {
    fn default() -> Self {
        Self {
            stale_after_days: default_stale_after_days(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Values that may override the TOML configuration (from CLI or env)
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub gateway_url: Option<String>,
    pub classifier_url: Option<String>,
}

impl CaptureConfig {
    /// Load from the given file, or from the platform default location,
    /// or fall back to built-in defaults when no file exists.
    pub fn load(path: Option<&Path>) -> Result<CaptureConfig> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(common_config::default_config_path);
        if path.exists() {
            common_config::load_toml(&path)
        } else {
            Ok(CaptureConfig::default())
        }
    }

    /// Apply command-line / environment overrides.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(database_path) = overrides.database_path {
            self.database_path = database_path;
        }
        if let Some(base_url) = overrides.gateway_url {
            self.gateway.base_url = base_url;
        }
        if let Some(base_url) = overrides.classifier_url {
            self.classifier.base_url = base_url;
        }
    }

    /// Confidence threshold for a category: per-category override when
    /// set, otherwise the global default.
    pub fn threshold_for(&self, category: Category) -> f64 {
        let t = &self.thresholds;
        let per_category = match category {
            Category::People => t.people,
            Category::Projects => t.projects,
            Category::Ideas => t.ideas,
            Category::Admin => t.admin,
            // Reference categories never pass through the gate
            Category::Decisions | Category::Howtos | Category::Snippets => None,
        };
        per_category.unwrap_or(t.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_defaults() {
        let config = CaptureConfig::default();
        assert_eq!(config.port, 5750);
        assert_eq!(config.thresholds.default, 0.6);
        assert_eq!(config.classifier.max_retries, 2);
        assert_eq!(config.clarifications.stale_after_days, 7);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_toml_keeps_defaults_for_the_rest() {
        let config: CaptureConfig = toml::from_str(
            r#"
            port = 6000

            [classifier]
            base_url = "http://oracle:9000"
            api_key = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 6000);
        assert_eq!(config.classifier.base_url, "http://oracle:9000");
        assert_eq!(config.classifier.api_key.as_deref(), Some("secret"));
        assert_eq!(config.classifier.timeout_ms, 15_000);
        assert_eq!(config.gateway.base_url, "http://127.0.0.1:5760");
    }

    #[test]
    fn threshold_prefers_per_category_override() {
        let mut config = CaptureConfig::default();
        assert_eq!(config.threshold_for(Category::People), 0.6);
        assert_eq!(config.threshold_for(Category::Ideas), 0.5);

        config.thresholds.people = Some(0.8);
        assert_eq!(config.threshold_for(Category::People), 0.8);

        // Reference categories fall back to the default (unused in practice)
        assert_eq!(config.threshold_for(Category::Decisions), 0.6);
    }

    #[test]
    fn overrides_beat_file_values() {
        let mut config = CaptureConfig::default();
        config.apply_overrides(ConfigOverrides {
            port: Some(7000),
            database_path: Some(PathBuf::from("/tmp/ng.db")),
            gateway_url: Some("http://gw:1".to_string()),
            classifier_url: None,
        });
        assert_eq!(config.port, 7000);
        assert_eq!(config.database_path, PathBuf::from("/tmp/ng.db"));
        assert_eq!(config.gateway.base_url, "http://gw:1");
        assert_eq!(config.classifier.base_url, "http://127.0.0.1:5770");
    }
}
