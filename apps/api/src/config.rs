//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Placeholder gateway credentials for local development.
const DEV_RAZORPAY_KEY_ID: &str = "rzp_test_harvest_dev";
const DEV_RAZORPAY_KEY_SECRET: &str = "harvest-dev-secret-change-in-production";

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP port
    pub port: u16,

    /// SQLite file holding products, orders and images
    pub document_db_path: PathBuf,

    /// SQLite file holding user accounts
    pub account_db_path: PathBuf,

    /// Pool size for each store (default: 10)
    pub db_max_connections: u32,

    /// Razorpay key id (public half of the basic-auth pair)
    pub razorpay_key_id: String,

    /// Razorpay key secret, also the HMAC key for payment signatures
    #[serde(skip_serializing)]
    pub razorpay_key_secret: String,

    /// Razorpay REST base URL (overridable for tests and sandboxes)
    pub razorpay_base_url: String,

    /// Allowed browser origin
    pub cors_origin: String,

    pub environment: Environment,

    /// Max request body for multipart uploads (default: 5MB)
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "development" | "dev" => Environment::Development,
            "production" | "prod" => Environment::Production,
            _ => return Err(ConfigError::InvalidValue("APP_ENV".to_string())),
        };

        let razorpay_key_id = gateway_credential(
            "RAZORPAY_KEY_ID",
            DEV_RAZORPAY_KEY_ID,
            environment,
        )?;
        let razorpay_key_secret = gateway_credential(
            "RAZORPAY_KEY_SECRET",
            DEV_RAZORPAY_KEY_SECRET,
            environment,
        )?;

        let config = AppConfig {
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,

            document_db_path: env::var("DOCUMENT_DB_PATH")
                .unwrap_or_else(|_| "./data/documents.db".to_string())
                .into(),

            account_db_path: env::var("ACCOUNT_DB_PATH")
                .unwrap_or_else(|_| "./data/accounts.db".to_string())
                .into(),

            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,

            razorpay_key_id,
            razorpay_key_secret,

            razorpay_base_url: env::var("RAZORPAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com".to_string())
                .trim_end_matches('/')
                .to_string(),

            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),

            environment,

            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| "5242880".to_string()) // 5MB
                .parse()
                .map_err(|_| ConfigError::InvalidValue("MAX_UPLOAD_BYTES".to_string()))?,
        };

        Ok(config)
    }

    /// Development defaults with in-memory store paths.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        AppConfig {
            port: 0,
            document_db_path: PathBuf::from(":memory:"),
            account_db_path: PathBuf::from(":memory:"),
            db_max_connections: 1,
            razorpay_key_id: DEV_RAZORPAY_KEY_ID.to_string(),
            razorpay_key_secret: DEV_RAZORPAY_KEY_SECRET.to_string(),
            razorpay_base_url: "http://127.0.0.1:0".to_string(),
            cors_origin: "http://localhost:5173".to_string(),
            environment: Environment::Development,
            max_upload_bytes: 1024 * 1024,
        }
    }
}

/// Reads a gateway credential; only development may fall back to a placeholder.
fn gateway_credential(
    var: &str,
    dev_default: &str,
    environment: Environment,
) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ if environment.is_production() => Err(ConfigError::MissingRequired(var.to_string())),
        _ => {
            tracing::warn!(var = %var, "Gateway credential not set, using development placeholder");
            Ok(dev_default.to_string())
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
