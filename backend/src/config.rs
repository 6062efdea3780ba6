//! Runtime configuration loaded from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub const DATA_DIR_VAR: &str = "GRIND_SOULS_DATA_DIR";
pub const BIND_ADDRESS_VAR: &str = "GRIND_SOULS_BIND_ADDRESS";
pub const LOG_FILTER_VAR: &str = "RUST_LOG";

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";
const DEFAULT_LOG_FILTER: &str = "info";
const APP_DIRECTORY_NAME: &str = "grind-souls";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub data_directory: PathBuf,
    pub bind_address: SocketAddr,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_directory = lookup(DATA_DIR_VAR)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_directory);

        let bind_address_str =
            lookup(BIND_ADDRESS_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue(BIND_ADDRESS_VAR.to_string(), e.to_string())
        })?;

        let log_filter = lookup(LOG_FILTER_VAR).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        EnvFilter::try_new(&log_filter).map_err(|e| {
            ConfigError::InvalidValue(LOG_FILTER_VAR.to_string(), e.to_string())
        })?;

        Ok(Self { data_directory, bind_address, log_filter })
    }
}

fn default_data_directory() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIRECTORY_NAME))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.log_filter, "info");
        assert!(config.data_directory.ends_with(APP_DIRECTORY_NAME) || config.data_directory.ends_with("data"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (DATA_DIR_VAR, "/tmp/souls"),
            (BIND_ADDRESS_VAR, "0.0.0.0:8080"),
            (LOG_FILTER_VAR, "grind_souls_backend=debug"),
        ]))
        .unwrap();
        assert_eq!(config.data_directory, PathBuf::from("/tmp/souls"));
        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(config.log_filter, "grind_souls_backend=debug");
    }

    #[test]
    fn test_invalid_bind_address() {
        let result = Config::from_lookup(lookup_from(&[(BIND_ADDRESS_VAR, "not an address")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue(var, _)) if var == BIND_ADDRESS_VAR));
    }
}
