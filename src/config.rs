use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub redis_url: String,
    pub storage: StorageBackend,
    pub catalog_file: String,
    pub alert_recipient: String,
    pub stock_gate_ratio: Decimal,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            redis_url: "redis://127.0.0.1/".to_string(),
            storage: StorageBackend::Redis,
            catalog_file: "static/catalog.json".to_string(),
            alert_recipient: "merchant@localhost".to_string(),
            stock_gate_ratio: Decimal::new(5, 1),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from a variable lookup, falling back to defaults.
    ///
    /// # Arguments
    /// * `lookup` - Returns the value of an environment variable, if set
    ///
    /// # Returns
    /// * `AppResult<Config>` - `Config` error when a value does not parse
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| AppError::Config(format!("PORT is not a valid port: {}", port)))?,
            None => defaults.port,
        };

        let storage = match lookup("STORAGE_BACKEND") {
            Some(backend) => serde_plain::from_str(&backend).map_err(|_| {
                AppError::Config(format!("unknown STORAGE_BACKEND: {}", backend))
            })?,
            None => defaults.storage,
        };

        let stock_gate_ratio = match lookup("STOCK_GATE_RATIO") {
            Some(ratio) => {
                let ratio = Decimal::from_str(&ratio).map_err(|_| {
                    AppError::Config(format!("STOCK_GATE_RATIO is not a decimal: {}", ratio))
                })?;
                if ratio.is_sign_negative() {
                    return Err(AppError::Config(
                        "STOCK_GATE_RATIO must not be negative".to_string(),
                    ));
                }
                ratio
            }
            None => defaults.stock_gate_ratio,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            redis_url: lookup("REDIS_URL").unwrap_or(defaults.redis_url),
            storage,
            catalog_file: lookup("CATALOG_FILE").unwrap_or(defaults.catalog_file),
            alert_recipient: lookup("ALERT_RECIPIENT").unwrap_or(defaults.alert_recipient),
            stock_gate_ratio,
        })
    }

    /// Socket address the server binds to.
    ///
    /// # Returns
    /// * `AppResult<SocketAddr>` - `Config` error when host and port do not form an address
    pub fn addr(&self) -> AppResult<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr)
            .map_err(|_| AppError::Config(format!("invalid address format: {}", addr)))
    }
}
