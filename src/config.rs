use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as AnyhowContext, Result};
use serde::Deserialize;

use crate::logging::{Level, Logger, StderrSink};

pub const LOG_LEVEL_ENV: &str = "DUST_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub log_level: Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Level::Warn,
        }
    }
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("invalid helper configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    /// Defaults, overridden by `DUST_LOG_LEVEL` when it is set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(raw) = env::var(LOG_LEVEL_ENV) {
            if !raw.trim().is_empty() {
                self.log_level = raw
                    .parse()
                    .with_context(|| format!("invalid {LOG_LEVEL_ENV}"))?;
            }
        }
        Ok(())
    }

    pub fn logger(&self) -> Logger {
        Logger::new(self.log_level, Arc::new(StderrSink))
    }
}
