//! Environment-driven configuration.

use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_CACHE_TTL_MS: u64 = 5_000;
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub debounce: Duration,
    pub cache_ttl: Duration,
    pub cache_max_entries: usize,
    /// Directory for file-backed cart storage; in-memory when unset.
    pub cart_dir: Option<PathBuf>,
    /// Optional JSON file seeding the product catalog.
    pub catalog_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            cache_ttl: Duration::from_millis(DEFAULT_CACHE_TTL_MS),
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            cart_dir: None,
            catalog_path: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load("STOREFRONT_PORT", DEFAULT_PORT)?,
            debounce: Duration::from_millis(try_load(
                "STOREFRONT_DEBOUNCE_MS",
                DEFAULT_DEBOUNCE_MS,
            )?),
            cache_ttl: Duration::from_millis(try_load_nonzero(
                "STOREFRONT_CACHE_TTL_MS",
                DEFAULT_CACHE_TTL_MS,
            )?),
            cache_max_entries: try_load("STOREFRONT_CACHE_MAX_ENTRIES", DEFAULT_CACHE_MAX_ENTRIES)?,
            cart_dir: optional_path("STOREFRONT_CART_DIR"),
            catalog_path: optional_path("STOREFRONT_CATALOG_PATH"),
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

/// Like [`try_load`], but zero is rejected. The cache sweeper ticks on a
/// multiple of its ttl and cannot run with an empty period.
fn try_load_nonzero(key: &str, default: u64) -> Result<u64, ConfigError> {
    match try_load(key, default)? {
        0 => {
            warn!("Invalid {key} value: must be greater than zero");
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: "must be greater than zero".to_string(),
            })
        }
        value => Ok(value),
    }
}

fn optional_path(key: &str) -> Option<PathBuf> {
    let path = var(key).map(PathBuf::from);
    if path.is_none() {
        info!("{key} not set");
    }
    path
}
