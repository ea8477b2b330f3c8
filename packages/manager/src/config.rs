use alloy_primitives::address;
use ens::Address;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Public ENS registry on mainnet.
pub const DEFAULT_REGISTRY_ADDRESS: Address = address!("314159265dd8dbb310642f98f50c066173c1259b");
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

pub const ENV_RPC_URL: &str = "ENS_RPC_URL";
pub const ENV_REGISTRY_ADDRESS: &str = "ENS_REGISTRY_ADDRESS";
pub const ENV_FROM: &str = "ENS_FROM";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    pub rpc_url: String,
    #[schemars(with = "String")]
    pub registry_address: Address,
    /// Sender of transactions; the ledger's first account when unset.
    #[schemars(with = "Option<String>")]
    pub from: Option<Address>,
    pub gas: u64,
    pub poll_interval_ms: u64,
    pub receipt_timeout_secs: u64,
    pub supported_tlds: Vec<String>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            registry_address: DEFAULT_REGISTRY_ADDRESS,
            from: None,
            gas: 1_000_000,
            poll_interval_ms: 500,
            receipt_timeout_secs: 60,
            supported_tlds: vec![String::from("eth"), String::from("test")],
        }
    }
}

fn parse_address(key: &str, value: &str) -> Result<Address, ConfigError> {
    ens::parse_address(value).map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

impl ManagerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Applies `ENS_RPC_URL`, `ENS_REGISTRY_ADDRESS` and `ENS_FROM` through
    /// `lookup`, so callers can pass `std::env::var` or a map.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rpc_url) = lookup(ENV_RPC_URL) {
            self.rpc_url = rpc_url;
        }
        if let Some(registry) = lookup(ENV_REGISTRY_ADDRESS) {
            self.registry_address = parse_address(ENV_REGISTRY_ADDRESS, &registry)?;
        }
        if let Some(from) = lookup(ENV_FROM) {
            self.from = Some(parse_address(ENV_FROM, &from)?);
        }
        Ok(self)
    }

    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if url::Url::parse(&self.rpc_url).is_err() {
            return Err(ConfigError::InvalidValue {
                key: String::from("rpc_url"),
                value: self.rpc_url.clone(),
            });
        }
        if self.registry_address.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: String::from("registry_address"),
                value: self.registry_address.to_string(),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: String::from("poll_interval_ms"),
                value: String::from("0"),
            });
        }
        if self.supported_tlds.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: String::from("supported_tlds"),
                value: String::from("[]"),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }
}
