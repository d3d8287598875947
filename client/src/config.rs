//! Configuración del cliente: variables de entorno con defaults,
//! que después la CLI puede pisar con flags.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const BASE_URL_ENV: &str = "BATCH_API_URL";
pub const MOCK_FALLBACK_ENV: &str = "BATCH_MOCK_FALLBACK";
pub const TIMEOUT_ENV: &str = "BATCH_API_TIMEOUT_SECS";
pub const PAGE_SIZE_ENV: &str = "BATCH_PAGE_SIZE";
pub const DOWNLOAD_DIR_ENV: &str = "BATCH_DOWNLOAD_DIR";

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("valor inválido para {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base de la API de batch, ej: http://pagos.interno/api
    pub base_url: String,
    /// Si está activo, los fallos de la API se tapan con datos de demo
    pub mock_fallback_enabled: bool,
    pub request_timeout: Duration,
    pub page_size: u32,
    pub download_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            mock_fallback_enabled: false,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            download_dir: PathBuf::from("."),
        }
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        }),
    }
}

fn parse_positive<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match raw.trim().parse::<T>() {
        Ok(v) if v > T::default() => Ok(v),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        }),
    }
}

impl Config {
    /// Lee la configuración del entorno del proceso.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables inyectable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();

        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            cfg.base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(MOCK_FALLBACK_ENV) {
            cfg.mock_fallback_enabled = parse_bool(MOCK_FALLBACK_ENV, &raw)?;
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            cfg.request_timeout = Duration::from_secs(parse_positive(TIMEOUT_ENV, &raw)?);
        }
        if let Some(raw) = lookup(PAGE_SIZE_ENV) {
            cfg.page_size = parse_positive(PAGE_SIZE_ENV, &raw)?;
        }
        if let Some(dir) = lookup(DOWNLOAD_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            cfg.download_dir = PathBuf::from(dir);
        }

        Ok(cfg)
    }
}
