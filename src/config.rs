//! Environment-driven settings.

use crate::models::{Address, AddressError};
use crate::registry::RegistryBackend;
use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x2d0c8CcF8524B7ffAdB78389CcdB75C875631F09";

/// 0.00001 ETH
pub const DEFAULT_CHECK_IN_FEE_WEI: u128 = 10_000_000_000_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Ledger state file
    pub data_path: PathBuf,
    /// Per-account habit lists for the local registry
    pub habits_path: PathBuf,
    pub registry: RegistryBackend,
    pub contract_address: Address,
    pub check_in_fee_wei: u128,
    pub tx_timeout: Duration,
    pub read_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("HABIT_REGISTRY: {0}")]
    Registry(String),

    #[error("CONTRACT_ADDRESS: {0}")]
    ContractAddress(#[from] AddressError),

    #[error("{name} must be a whole number, got `{value}`")]
    NotANumber { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);

        let data_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/ledger.json"));
        let habits_path = lookup("HABITS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/habits.json"));

        let registry = match lookup("HABIT_REGISTRY") {
            Some(value) => value.parse().map_err(ConfigError::Registry)?,
            None => RegistryBackend::Contract,
        };

        let contract_address = Address::parse(
            &lookup("CONTRACT_ADDRESS").unwrap_or_else(|| DEFAULT_CONTRACT_ADDRESS.to_string()),
        )?;

        Ok(Self {
            port,
            data_path,
            habits_path,
            registry,
            contract_address,
            check_in_fee_wei: number(&lookup, "CHECK_IN_FEE_WEI")?.unwrap_or(DEFAULT_CHECK_IN_FEE_WEI),
            tx_timeout: Duration::from_secs(number(&lookup, "TX_TIMEOUT_SECS")?.unwrap_or(60)),
            read_timeout: Duration::from_secs(number(&lookup, "READ_TIMEOUT_SECS")?.unwrap_or(10)),
        })
    }
}

fn number<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::NotANumber { name, value })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.registry, RegistryBackend::Contract);
        assert_eq!(config.check_in_fee_wei, DEFAULT_CHECK_IN_FEE_WEI);
        assert_eq!(config.tx_timeout, Duration::from_secs(60));
        assert_eq!(config.data_path, PathBuf::from("data/ledger.json"));
        assert_eq!(
            config.contract_address.as_str(),
            DEFAULT_CONTRACT_ADDRESS.to_ascii_lowercase()
        );
    }

    #[test]
    fn overrides_are_read() {
        let config = config_from(&[
            ("PORT", "9191"),
            ("HABIT_REGISTRY", "local"),
            ("CHECK_IN_FEE_WEI", "1"),
            ("READ_TIMEOUT_SECS", "2"),
        ])
        .unwrap();
        assert_eq!(config.port, 9191);
        assert_eq!(config.registry, RegistryBackend::Local);
        assert_eq!(config.check_in_fee_wei, 1);
        assert_eq!(config.read_timeout, Duration::from_secs(2));
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(matches!(
            config_from(&[("HABIT_REGISTRY", "cookies")]),
            Err(ConfigError::Registry(_))
        ));
        assert!(matches!(
            config_from(&[("CONTRACT_ADDRESS", "0x12")]),
            Err(ConfigError::ContractAddress(_))
        ));
        assert!(matches!(
            config_from(&[("TX_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::NotANumber { name: "TX_TIMEOUT_SECS", .. })
        ));
    }
}
