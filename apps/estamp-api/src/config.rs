//! API configuration module.
//!
//! Configuration is layered, later sources overriding earlier ones:
//!
//! ```text
//! built-in defaults ──► estamp.toml (optional) ──► ESTAMP__* environment
//!
//! ESTAMP__SERVER__PORT=9000          → server.port
//! ESTAMP__DATABASE__PATH=/data/e.db  → database.path
//! ESTAMP__GATEWAY__KEY_SECRET=...    → gateway.key_secret
//! ```

use std::net::SocketAddr;

use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};

use estamp_core::{Money, DEFAULT_DOORSTEP_CHARGE, MAX_AMOUNT};

/// Prefix and separator for environment overrides.
const ENV_PREFIX: &str = "ESTAMP";
const ENV_SEPARATOR: &str = "__";

/// Optional config file, looked up in the working directory.
const CONFIG_FILE: &str = "estamp";

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub gateway: GatewayConfig,
    pub pricing: PricingConfig,
    pub sweep: SweepConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (an IP, not a hostname)
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Filter used when `RUST_LOG` is unset
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`
    pub path: String,
}

/// Payment gateway credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: String,
    pub currency: String,
    /// Outbound request timeout in seconds
    pub timeout_secs: u64,
}

// Keeps the secret out of logs.
impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("key_id", &self.key_id)
            .field("key_secret", &"<redacted>")
            .field("currency", &self.currency)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Flat doorstep delivery surcharge in paise
    pub doorstep_charge: i64,
}

impl PricingConfig {
    pub fn doorstep_charge(&self) -> Money {
        Money::from_paise(self.doorstep_charge)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Age after which an unpaid `pending_payment` order is cancelled
    pub pending_max_age_minutes: i64,
}

impl AppConfig {
    /// Load configuration from defaults, `estamp.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Like [`AppConfig::load`], reading environment overrides from `env`
    /// instead of the process environment when given.
    pub fn load_with(env: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.log_level", "info")?
            .set_default("database.path", "./estamp.db")?
            .set_default("gateway.base_url", "https://api.razorpay.com")?
            .set_default("gateway.key_id", "")?
            .set_default("gateway.key_secret", "")?
            .set_default("gateway.currency", "INR")?
            .set_default("gateway.timeout_secs", 10)?
            .set_default("pricing.doorstep_charge", DEFAULT_DOORSTEP_CHARGE.paise())?
            .set_default("sweep.pending_max_age_minutes", 60)?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.key_id.trim().is_empty() {
            return Err(ConfigError::MissingRequired("gateway.key_id".to_string()));
        }

        if self.gateway.key_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("gateway.key_secret".to_string()));
        }

        if !(0..=MAX_AMOUNT.paise()).contains(&self.pricing.doorstep_charge) {
            return Err(ConfigError::InvalidValue("pricing.doorstep_charge".to_string()));
        }

        if self.sweep.pending_max_age_minutes <= 0 {
            return Err(ConfigError::InvalidValue(
                "sweep.pending_max_age_minutes".to_string(),
            ));
        }

        Ok(())
    }

    /// Socket address to bind the HTTP listener to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("server.host".to_string()))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    fn env(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn credentials() -> Vec<(&'static str, &'static str)> {
        vec![
            ("ESTAMP__GATEWAY__KEY_ID", "rzp_test_key"),
            ("ESTAMP__GATEWAY__KEY_SECRET", "rzp_test_secret"),
        ]
    }

    #[test]
    fn test_defaults_with_credentials() -> TestResult {
        let config = AppConfig::load_with(Some(env(&credentials())))?;

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.gateway.currency, "INR");
        assert_eq!(config.pricing.doorstep_charge(), DEFAULT_DOORSTEP_CHARGE);
        assert_eq!(config.sweep.pending_max_age_minutes, 60);
        assert_eq!(config.socket_addr()?.port(), 8080);
        Ok(())
    }

    #[test]
    fn test_environment_overrides() -> TestResult {
        let mut pairs = credentials();
        pairs.push(("ESTAMP__SERVER__PORT", "9000"));
        pairs.push(("ESTAMP__PRICING__DOORSTEP_CHARGE", "7500"));
        pairs.push(("ESTAMP__DATABASE__PATH", ":memory:"));

        let config = AppConfig::load_with(Some(env(&pairs)))?;

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.pricing.doorstep_charge, 7500);
        assert_eq!(config.database.path, ":memory:");
        Ok(())
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let result = AppConfig::load_with(Some(env(&[("ESTAMP__GATEWAY__KEY_ID", "rzp_test_key")])));

        assert!(matches!(result, Err(ConfigError::MissingRequired(field)) if field == "gateway.key_secret"));
    }

    #[test]
    fn test_out_of_range_surcharge_is_rejected() {
        for charge in ["-1", "9223372036854775807"] {
            let mut pairs = credentials();
            pairs.push(("ESTAMP__PRICING__DOORSTEP_CHARGE", charge));

            let result = AppConfig::load_with(Some(env(&pairs)));

            assert!(matches!(result, Err(ConfigError::InvalidValue(_))), "{charge}");
        }
    }

    #[test]
    fn test_secret_is_redacted_in_debug() -> TestResult {
        let config = AppConfig::load_with(Some(env(&credentials())))?;
        let debug = format!("{:?}", config.gateway);

        assert!(!debug.contains("rzp_test_secret"));
        Ok(())
    }
}
