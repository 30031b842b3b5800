use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::assumptions::CallPolicy;
use crate::duration::{deserialize_duration, serialize_duration};
use crate::models::MarketInputs;
use crate::valuation::EngineConfig;

/// Valuation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    /// Number of explicit stage-1 projection years.
    pub horizon_years: usize,

    /// Minimum gap between cost of equity and perpetual growth, as a decimal.
    pub min_ke_g_spread: f64,

    /// Inclusive bounds for every stage-1 growth rate, as decimals.
    pub growth_lower_bound: f64,
    pub growth_upper_bound: f64,

    /// Defaults offered to the provider; a reply may override them.
    pub risk_free_rate: f64,
    pub equity_risk_premium: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            horizon_years: 5,
            min_ke_g_spread: 0.01,
            growth_lower_bound: -0.5,
            growth_upper_bound: 1.0,
            risk_free_rate: 0.045,
            equity_risk_premium: 0.045,
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Assumption provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Per-attempt timeout, e.g. "30s".
    #[serde(
        default = "default_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub timeout: Duration,

    /// Retries for transient failures. Values above 1 are treated as 1.
    pub max_retries: u32,

    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Override for the provider endpoint, mainly for testing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_retries: 1,
            model: "gemini-1.5-flash-latest".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            base_url: None,
        }
    }
}

impl ProviderConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<SecretString> {
        let value = std::env::var(&self.api_key_env)
            .with_context(|| format!("Environment variable {} is not set", self.api_key_env))?;
        if value.trim().is_empty() {
            anyhow::bail!("Environment variable {} is empty", self.api_key_env);
        }
        Ok(SecretString::from(value))
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub valuation: ValuationConfig,
    pub provider: ProviderConfig,
}

impl Config {
    /// Load and validate config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider.timeout.is_zero() {
            anyhow::bail!("provider.timeout must be greater than zero");
        }
        self.engine_config()
            .validate()
            .context("Invalid [valuation] section")
    }

    pub fn engine_config(&self) -> EngineConfig {
        let v = &self.valuation;
        EngineConfig {
            horizon_years: v.horizon_years,
            min_ke_g_spread: v.min_ke_g_spread,
            growth_lower_bound: v.growth_lower_bound,
            growth_upper_bound: v.growth_upper_bound,
            market: MarketInputs {
                risk_free_rate: v.risk_free_rate,
                equity_risk_premium: v.equity_risk_premium,
            },
            call_policy: CallPolicy::new(self.provider.timeout, self.provider.max_retries),
        }
    }
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./fairvalue.toml` if it exists in current directory
/// 2. `~/.local/share/fairvalue/fairvalue.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("fairvalue.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("fairvalue").join("fairvalue.toml");
    }

    local_config
}
