//! Configuration loaded from environment variables at startup.
//!
//! Policy knobs (eligibility mode, threshold, debounce window) are fixed at
//! engine construction rather than read per call. Generator credentials are
//! injected into the generator collaborator only and never touch the
//! engine.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// How a slot qualifies for evolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibilityMode {
    /// Evolve the global favorite leader once total favorites across the
    /// whole store reach the threshold.
    ThresholdCount,
    /// A slot qualifies once it individually reaches the threshold.
    PerProduct,
}

impl EligibilityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThresholdCount => "threshold-count",
            Self::PerProduct => "per-product",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "threshold-count" => Some(Self::ThresholdCount),
            "per-product" => Some(Self::PerProduct),
            _ => None,
        }
    }
}

/// Engine policy plus the transport knobs that ride along with it.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub eligibility: EligibilityMode,
    /// The eligibility threshold N (meaning depends on the mode).
    pub favorites_to_evolve: u64,
    /// Minimum elapsed time between two non-forced evolutions.
    pub debounce: Duration,
    /// Allowed CORS origins; empty means any origin.
    pub cors_origins: Vec<String>,
    /// Override for the state file location. `None` uses the platform
    /// data directory.
    pub state_path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            eligibility: EligibilityMode::ThresholdCount,
            favorites_to_evolve: 5,
            debounce: Duration::from_secs(60),
            cors_origins: Vec::new(),
            state_path: None,
        }
    }
}

impl StoreConfig {
    /// Load from the environment, falling back to defaults.
    ///
    /// Variables: `EVOMART_ELIGIBILITY` (`threshold-count` | `per-product`),
    /// `EVOMART_FAVORITES_TO_EVOLVE`, `EVOMART_DEBOUNCE_SECONDS`,
    /// `EVOMART_CORS_ORIGINS` (comma-separated, `*` or unset for any),
    /// `EVOMART_STATE_PATH`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("EVOMART_ELIGIBILITY") {
            config.eligibility =
                EligibilityMode::from_str(&raw).ok_or(ConfigError::Invalid {
                    name: "EVOMART_ELIGIBILITY",
                    reason: format!("unknown mode '{raw}'"),
                })?;
        }

        if let Ok(raw) = std::env::var("EVOMART_FAVORITES_TO_EVOLVE") {
            config.favorites_to_evolve = parse(&raw, "EVOMART_FAVORITES_TO_EVOLVE")?;
        }

        if let Ok(raw) = std::env::var("EVOMART_DEBOUNCE_SECONDS") {
            config.debounce = Duration::from_secs(parse(&raw, "EVOMART_DEBOUNCE_SECONDS")?);
        }

        if let Ok(raw) = std::env::var("EVOMART_CORS_ORIGINS") {
            if raw.trim() != "*" {
                config.cors_origins = raw
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
        }

        if let Ok(raw) = std::env::var("EVOMART_STATE_PATH") {
            config.state_path = Some(PathBuf::from(raw));
        }

        Ok(config)
    }
}

/// Supported generator backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// OpenAI-compatible chat completions API.
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
}

impl BackendType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "openai" => Some(Self::OpenAi),
            "anthropic" => Some(Self::Anthropic),
            _ => None,
        }
    }
}

/// Configuration for the evolution generator backend.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    /// Hard deadline for one generation call.
    pub timeout: Duration,
}

impl GeneratorConfig {
    /// Load from the environment.
    ///
    /// Required: `EVOMART_GENERATOR_BACKEND` (`openai` | `anthropic`),
    /// `EVOMART_GENERATOR_API_URL`, `EVOMART_GENERATOR_API_KEY`,
    /// `EVOMART_GENERATOR_MODEL`.
    /// Optional: `EVOMART_GENERATOR_TIMEOUT_MS` (default 30000).
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = env_var("EVOMART_GENERATOR_BACKEND")?;
        let backend_type =
            BackendType::from_str(&backend).ok_or(ConfigError::Invalid {
                name: "EVOMART_GENERATOR_BACKEND",
                reason: format!("unknown backend '{backend}'"),
            })?;

        let timeout_ms: u64 = match std::env::var("EVOMART_GENERATOR_TIMEOUT_MS") {
            Ok(raw) => parse(&raw, "EVOMART_GENERATOR_TIMEOUT_MS")?,
            Err(_) => 30_000,
        };

        Ok(Self {
            backend_type,
            api_url: env_var("EVOMART_GENERATOR_API_URL")?,
            api_key: env_var("EVOMART_GENERATOR_API_KEY")?,
            model: env_var("EVOMART_GENERATOR_MODEL")?,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse<T: std::str::FromStr>(raw: &str, name: &'static str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}
