//! Configuration sources for `rehash conf`.

use std::path::{Path, PathBuf};

use tracing::info;

use super::error::ConfigResult;
use super::loader::ConfigLoader;
use super::schema::BotConfig;
use super::validation::validate_config;

/// Something that can produce a fresh [`BotConfig`] on demand.
pub trait ConfigSource: Send + Sync {
    /// Re-reads the configuration. The result is validated.
    fn reload_config(&self) -> ConfigResult<BotConfig>;
}

/// Re-reads one config file (plus `DEMIBOT_*` overrides) on every reload.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
    load_env: bool,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            load_env: true,
        }
    }

    /// Ignores environment overrides.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    fn reload_config(&self) -> ConfigResult<BotConfig> {
        let mut loader = ConfigLoader::new().file(&self.path);
        if !self.load_env {
            loader = loader.without_env();
        }
        let config = loader.load()?;
        validate_config(&config)?;
        info!(path = %self.path.display(), "Configuration reloaded");
        Ok(config)
    }
}

/// A fixed configuration. Reloading always yields the same value.
impl ConfigSource for BotConfig {
    fn reload_config(&self) -> ConfigResult<BotConfig> {
        validate_config(self)?;
        Ok(self.clone())
    }
}
