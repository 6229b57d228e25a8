use std::{env, fs, net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    RocksDb,
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::RocksDb
    }
}

impl StoreBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "rocksdb" | "rocks" => Ok(Self::RocksDb),
            other => Err(anyhow!("unsupported store backend: {other}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,
    #[serde(default)]
    pub store_backend: StoreBackend,
    #[serde(default = "default_store_path")]
    pub store_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            store_backend: StoreBackend::default(),
            store_path: default_store_path(),
        }
    }
}

impl AppConfig {
    const CONFIG_ENV: &'static str = "VAULTD_CONFIG_FILE";
    const BIND_ADDRESS_ENV: &'static str = "VAULTD_BIND_ADDRESS";
    const STORE_BACKEND_ENV: &'static str = "VAULTD_STORE_BACKEND";
    const STORE_PATH_ENV: &'static str = "VAULTD_STORE_PATH";

    /// Load configuration from defaults layered with optional config files and
    /// environment variables.
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    pub fn load_with(config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::resolve_config_path(config_path)? {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file: {}", path.display()))?;
            let file_config: Self = toml::from_str(&contents)
                .with_context(|| format!("invalid config file: {}", path.display()))?;

            config = file_config;
        }

        if let Ok(addr) = env::var(Self::BIND_ADDRESS_ENV) {
            config.bind_address = addr
                .parse()
                .with_context(|| format!("invalid {name}", name = Self::BIND_ADDRESS_ENV))?;
        }

        if let Ok(backend) = env::var(Self::STORE_BACKEND_ENV) {
            config.store_backend = StoreBackend::parse(&backend)
                .with_context(|| format!("invalid {name}", name = Self::STORE_BACKEND_ENV))?;
        }

        if let Ok(path) = env::var(Self::STORE_PATH_ENV) {
            config.store_path = path;
        }

        Ok(config)
    }

    fn resolve_config_path(explicit: Option<PathBuf>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            return Self::validate_path(path);
        }

        if let Ok(path) = env::var(Self::CONFIG_ENV) {
            return Self::validate_path(PathBuf::from(path));
        }

        let mut candidates = vec![PathBuf::from("vaultd.toml")];
        if let Some(dir) = Self::default_config_dir() {
            candidates.push(dir.join("config.toml"));
        }

        for candidate in candidates {
            if candidate.exists() {
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }

    fn validate_path(path: PathBuf) -> Result<Option<PathBuf>> {
        if path.exists() {
            Ok(Some(path))
        } else {
            Err(anyhow!(
                "configuration file does not exist: {}",
                path.display()
            ))
        }
    }

    fn default_config_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".vaultd"))
    }
}

fn default_bind_address() -> SocketAddr {
    "127.0.0.1:8085"
        .parse()
        .expect("default bind address must be valid")
}

fn default_store_path() -> String {
    "./data/vaultd".to_owned()
}

fn home_dir() -> Option<PathBuf> {
    if let Some(path) = env::var_os("HOME") {
        return Some(PathBuf::from(path));
    }

    if let Some(path) = env::var_os("USERPROFILE") {
        return Some(PathBuf::from(path));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_rocksdb() {
        let config = AppConfig::default();
        assert_eq!(config.store_backend, StoreBackend::RocksDb);
        assert_eq!(config.store_path, "./data/vaultd");
        assert_eq!(config.bind_address.port(), 8085);
    }

    #[test]
    fn config_file_fields_are_optional() {
        let config: AppConfig = toml::from_str("store_backend = \"memory\"").unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.bind_address, default_bind_address());
    }

    #[test]
    fn backend_parsing_accepts_aliases() {
        assert_eq!(StoreBackend::parse("rocks").unwrap(), StoreBackend::RocksDb);
        assert_eq!(StoreBackend::parse("Memory").unwrap(), StoreBackend::Memory);
        assert!(StoreBackend::parse("sqlite").is_err());
    }
}
