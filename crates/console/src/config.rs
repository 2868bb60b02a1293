//! # Console Configuration Module
//!
//! Loads the console's settings from environment variables, with defaults
//! for everything.
//!
//! ## Environment Variables
//!
//! - `API_URL`: Base URL of the school backend (default: "http://localhost:4000/api")
//! - `API_REQUEST_TIMEOUT_SECONDS`: Per-request timeout (default: 10)
//! - `LOG_LEVEL`: Logging level (default: "info")
//! - `SESSION_FILE`: Where the signed-in session is persisted (default: ".schooldesk-session.json")
//! - `PAGE_SIZE`: Rows per list page (default: 5)
//! - `SCAN_FPS`: QR decode rate, clamped to 10-30 (default: 10)
//! - `SCAN_BOX`: Side of the central capture region in pixels (default: 250)

use eyre::{Result, WrapErr};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

use crate::checkin::camera::ScanSettings;

pub const DEFAULT_API_URL: &str = "http://localhost:4000/api";
pub const DEFAULT_SESSION_FILE: &str = ".schooldesk-session.json";

/// Configuration for the SchoolDesk console
///
/// # Example
///
/// ```
/// use eyre::Result;
/// use schooldesk_console::config::ConsoleConfig;
///
/// fn example() -> Result<()> {
///     let config = ConsoleConfig::from_env()?;
///     println!("Talking to {}", config.api_url);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Base URL of the REST backend, without a trailing slash
    pub api_url: String,

    /// Request timeout in seconds
    pub request_timeout: u64,

    /// Log level for the application
    pub log_level: Level,

    /// File holding the persisted session
    pub session_file: PathBuf,

    /// Rows per page in list views
    pub page_size: usize,

    /// Camera decode settings for QR check-in
    pub scan: ScanSettings,
}

impl ConsoleConfig {
    /// Creates a new ConsoleConfig from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let request_timeout = parse_or(&lookup, "API_REQUEST_TIMEOUT_SECONDS", 10)?;

        let log_level = match lookup("LOG_LEVEL")
            .unwrap_or_else(|| "info".to_string())
            .to_lowercase()
            .as_str()
        {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        let session_file = lookup("SESSION_FILE")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE));

        let page_size = parse_or(&lookup, "PAGE_SIZE", 5usize)?;
        if page_size == 0 {
            eyre::bail!("PAGE_SIZE must be at least 1");
        }

        let fps = parse_or(&lookup, "SCAN_FPS", 10u32)?;
        let box_size = parse_or(&lookup, "SCAN_BOX", 250u32)?;

        Ok(Self {
            api_url,
            request_timeout,
            log_level,
            session_file,
            page_size,
            scan: ScanSettings::new(fps, box_size),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .wrap_err_with(|| format!("Invalid {} value", key)),
        None => Ok(default),
    }
}
