//! Orchestrator configuration
//!
//! Per-step timeout bounds, transport connection retry settings, and
//! registry retention. Loads from a TOML file under the user config
//! directory, falling back to defaults when absent.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    /// Emit per-step progress to stderr
    #[serde(default)]
    pub verbose: bool,
}

/// Wait bounds for each pipeline step, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_voice_timeout")]
    pub voice_ms: u64,

    #[serde(default = "default_brain_timeout")]
    pub brain_ms: u64,

    #[serde(default = "default_fraud_timeout")]
    pub fraud_ms: u64,

    #[serde(default = "default_executor_timeout")]
    pub executor_ms: u64,
}

/// Startup connection retry settings.
///
/// These apply only to the initial transport connection; individual
/// pipeline steps are never retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

/// Session registry retention
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Maximum retained sessions; oldest terminal sessions are evicted
    /// first once the store is full
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_voice_timeout() -> u64 {
    15_000
}

fn default_brain_timeout() -> u64 {
    20_000
}

fn default_fraud_timeout() -> u64 {
    15_000
}

fn default_executor_timeout() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    2_000
}

fn default_history_capacity() -> usize {
    1_000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            voice_ms: default_voice_timeout(),
            brain_ms: default_brain_timeout(),
            fraud_ms: default_fraud_timeout(),
            executor_ms: default_executor_timeout(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
        }
    }
}

impl TimeoutConfig {
    pub fn voice(&self) -> Duration {
        Duration::from_millis(self.voice_ms)
    }

    pub fn brain(&self) -> Duration {
        Duration::from_millis(self.brain_ms)
    }

    pub fn fraud(&self) -> Duration {
        Duration::from_millis(self.fraud_ms)
    }

    pub fn executor(&self) -> Duration {
        Duration::from_millis(self.executor_ms)
    }
}

impl OrchestratorConfig {
    /// Load configuration from file, creating the default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = OrchestratorConfig::default();
            config.save()?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let contents = fs::read_to_string(path).context("Failed to read config file")?;

        let config: OrchestratorConfig =
            toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, toml_string).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("rush-orchestrator").join("config.toml"))
    }
}
