//! Environment-sourced daemon configuration.
//!
//! All settings come from `RCON_`-prefixed environment variables, read
//! once at startup. The struct is immutable afterwards and shared across
//! tasks as `Arc<Config>`.

use std::path::PathBuf;

use thiserror::Error;

use spyglass_telemetry::{CollectorEndpoint, decode_shared_key};

/// Prefix of every configuration variable.
const ENV_PREFIX: &str = "RCON_";

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that abort startup. Configuration problems are always fatal;
/// nothing here is recovered at runtime.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(String),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

/// Immutable process-wide settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Instance identifier reported in every snapshot.
    pub pod_name: String,
    /// Game server host to probe.
    pub host: String,
    /// Game server port to probe.
    pub port: u16,
    /// Remote-console password. Accepted and carried for the console
    /// collaborator; unused by the telemetry pipeline.
    pub password: Option<String>,
    /// Directory whose entry count is reported as the population.
    pub data_volume: PathBuf,
    /// Collector workspace (customer) id.
    pub customer_id: String,
    /// Base64-encoded shared key for request signing.
    pub shared_key: String,
    /// Optional collector endpoint override; the hosted endpoint derived
    /// from the customer id is used when absent.
    pub collector_url: Option<String>,
}

impl Config {
    /// Load the configuration from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration from an arbitrary variable lookup.
    ///
    /// The seam exists so tests can exercise loading without mutating
    /// process-global environment state.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| -> ConfigResult<String> {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let optional = |name: &str| -> Option<String> {
            lookup(&format!("{ENV_PREFIX}{name}")).filter(|value| !value.is_empty())
        };

        let port_raw = require("PORT")?;
        let port = port_raw
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| ConfigError::Invalid {
                key: format!("{ENV_PREFIX}PORT"),
                value: port_raw,
                reason: "expected a port number between 1 and 65535".to_string(),
            })?;

        Ok(Self {
            pod_name: require("POD_NAME")?,
            host: require("HOST")?,
            port,
            password: optional("PASSWORD"),
            data_volume: PathBuf::from(require("DATA_VOLUME")?),
            customer_id: require("AZURE_CUSTOMER_ID")?,
            shared_key: require("AZURE_SHARED_KEY")?,
            collector_url: optional("COLLECTOR_URL"),
        })
    }

    /// Startup validation: the shared key must be valid base64 and any
    /// endpoint override must parse. Run once before the first tick so
    /// bad credentials fail the process instead of every tick.
    pub fn validate(&self) -> ConfigResult<()> {
        self.decoded_shared_key()?;
        self.endpoint()?;
        Ok(())
    }

    /// The decoded signing key bytes.
    pub fn decoded_shared_key(&self) -> ConfigResult<Vec<u8>> {
        decode_shared_key(&self.shared_key).map_err(|e| ConfigError::Invalid {
            key: format!("{ENV_PREFIX}AZURE_SHARED_KEY"),
            value: "<redacted>".to_string(),
            reason: e.to_string(),
        })
    }

    /// The collector endpoint: the override when set, otherwise the
    /// hosted endpoint for this customer id.
    pub fn endpoint(&self) -> ConfigResult<CollectorEndpoint> {
        match &self.collector_url {
            Some(url) => CollectorEndpoint::parse(url).map_err(|e| ConfigError::Invalid {
                key: format!("{ENV_PREFIX}COLLECTOR_URL"),
                value: url.clone(),
                reason: e.to_string(),
            }),
            None => Ok(CollectorEndpoint::for_customer(&self.customer_id)),
        }
    }
}
