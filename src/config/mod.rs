use garde::Validate;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Value shipped in sample configs; treated the same as an unset key.
const PLACEHOLDER_API_KEY: &str = "YOUR_ZAMZAR_API_KEY_HERE";

#[derive(Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Server bind host
    #[serde(default = "default_host")]
    #[garde(length(min = 1))]
    pub host: String,

    /// Server bind port
    #[serde(default = "default_port")]
    #[garde(skip)]
    pub port: u16,

    /// Directory holding uploads and conversion artifacts while a request is in flight
    #[serde(default = "default_staging_dir")]
    #[garde(skip)]
    pub staging_dir: PathBuf,

    /// Zamzar API key. Absent means the CDR route serves the fallback notice.
    #[serde(default)]
    #[garde(skip)]
    pub zamzar_api_key: Option<String>,

    /// Zamzar API base URL (sandbox by default)
    #[serde(default = "default_zamzar_base_url")]
    #[garde(length(min = 1))]
    pub zamzar_base_url: String,

    /// Maximum number of job status queries
    #[serde(default = "default_poll_max_attempts")]
    #[garde(range(min = 1, max = 600))]
    pub poll_max_attempts: u32,

    /// Wait before each job status query, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    #[garde(range(min = 1, max = 60_000))]
    pub poll_interval_ms: u64,

    /// Timeout for job submission and result download, in seconds
    #[serde(default = "default_remote_timeout_secs")]
    #[garde(range(min = 1))]
    pub remote_timeout_secs: u64,

    /// Ghostscript binary override; defaults to the platform name
    #[serde(default)]
    #[garde(skip)]
    pub ghostscript_bin: Option<String>,

    /// Request body limit in bytes
    #[serde(default = "default_max_upload_bytes")]
    #[garde(range(min = 1))]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_zamzar_base_url() -> String {
    "https://sandbox.zamzar.com/v1".to_string()
}

fn default_poll_max_attempts() -> u32 {
    20
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_remote_timeout_secs() -> u64 {
    60
}

fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] garde::Report),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build a config from explicit key/value pairs (upper-case names, as in the environment).
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: AppConfig = envy::from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The remote credential, if one is genuinely configured.
    pub fn api_key(&self) -> Option<&str> {
        self.zamzar_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_API_KEY)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }
}
