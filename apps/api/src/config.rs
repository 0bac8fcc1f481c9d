use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable is optional; unset ones take the defaults below.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Largest `source_text` accepted by the JSON endpoints, in bytes.
    pub max_source_text_bytes: usize,
    /// Largest request body (uploads included), in bytes.
    pub max_upload_bytes: usize,
    /// JSON file overriding the built-in heuristic tables.
    pub heuristics_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            max_source_text_bytes: 200_000,
            max_upload_bytes: 10 * 1024 * 1024,
            heuristics_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            port: env_or("PORT", defaults.port).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            max_source_text_bytes: env_or("MAX_SOURCE_TEXT_BYTES", defaults.max_source_text_bytes)
                .context("MAX_SOURCE_TEXT_BYTES must be a byte count")?,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            heuristics_path: std::env::var_os("HEURISTICS_PATH")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value '{raw}' for '{key}'")),
        Err(_) => Ok(default),
    }
}
