use crate::core::retry::RetryPolicy;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fmt, fs, path::Path, path::PathBuf};
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://sandbox-api.coinmarketcap.com";
pub const API_KEY_ENV: &str = "CMC_API_KEY";
pub const API_URL_ENV: &str = "CMC_API_URL";

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

#[derive(Deserialize, Serialize, Clone, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: default_base_url(),
            key: None,
        }
    }
}

// Keeps the key out of debug logs
impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        RetryConfig {
            max_attempts: policy.max_attempts,
            initial_delay_ms: policy.initial_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            multiplier: policy.multiplier,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            multiplier: self.multiplier,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    /// Overall deadline for one conversion, across all attempts.
    pub timeout_secs: u64,
    pub retry: RetryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api: ApiConfig::default(),
            timeout_secs: 30,
            retry: RetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config file at the default location if there is one, then
    /// applies environment overrides.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };
        config.with_env_overrides().validated()
    }

    /// Loads `path`, which must exist, then applies environment overrides.
    pub fn load_with_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_from_path(path)?
            .with_env_overrides()
            .validated()
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "coinconv", "coinconv")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// `CMC_API_KEY` and `CMC_API_URL` win over the file when set and non-empty.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty(API_KEY_ENV) {
            debug!("Using API key from {}", API_KEY_ENV);
            self.api.key = Some(key.trim().to_string());
        }
        if let Some(url) = non_empty(API_URL_ENV) {
            debug!("Using API URL from {}", API_URL_ENV);
            self.api.base_url = url.trim().to_string();
        }
        self
    }

    fn validated(self) -> Result<Self> {
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }
        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            bail!(
                "retry.multiplier must be a finite number >= 1.0, got {}",
                self.retry.multiplier
            );
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            bail!("retry.initial_delay_ms must not exceed retry.max_delay_ms");
        }
        Ok(self)
    }

    /// The API key, required before any request is made.
    pub fn api_key(&self) -> Result<&str> {
        match self.api.key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => bail!("{} environment variable is required", API_KEY_ENV),
        }
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.to_policy()
    }
}
