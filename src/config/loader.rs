use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Config, ConfigError, parse_config};

/// Trait for loading and merging configuration files.
pub trait ConfigLoader {
    fn load(&self, cwd: &Path) -> Result<Config, ConfigError>;
}

/// Default implementation that reads from the filesystem.
pub struct DefaultConfigLoader {
    global_config_path: Option<PathBuf>,
    explicit_path: Option<PathBuf>,
}

impl Default for DefaultConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultConfigLoader {
    pub fn new() -> Self {
        let global_config_path = std::env::var("HOME")
            .ok()
            .filter(|h| !h.is_empty())
            .map(|h| {
                PathBuf::from(h)
                    .join(".config")
                    .join("cmdgraph")
                    .join("cmdgraph.yml")
            });
        Self {
            global_config_path,
            explicit_path: None,
        }
    }

    /// Create a loader with an explicit global config path (for testing).
    pub fn with_global_path(path: PathBuf) -> Self {
        Self {
            global_config_path: Some(path),
            explicit_path: None,
        }
    }

    /// Use `path` instead of looking for a config file in the working
    /// directory. Unlike the lookup, a missing file is an error.
    pub fn with_explicit_path(mut self, path: PathBuf) -> Self {
        self.explicit_path = Some(path);
        self
    }

    /// Determine which local config file to use.
    /// `cmdgraph.yml` is preferred; `cmdgraph.yaml` is a fallback.
    fn local_config_path(cwd: &Path) -> Option<PathBuf> {
        let yml = cwd.join("cmdgraph.yml");
        if yml.exists() {
            return Some(yml);
        }
        let yaml = cwd.join("cmdgraph.yaml");
        if yaml.exists() {
            return Some(yaml);
        }
        None
    }

    fn read_and_parse(path: &Path) -> Result<Config, ConfigError> {
        debug!("reading config {}", path.display());
        let yaml = std::fs::read_to_string(path)?;
        parse_config(&yaml)
    }
}

impl ConfigLoader for DefaultConfigLoader {
    fn load(&self, cwd: &Path) -> Result<Config, ConfigError> {
        let global = self
            .global_config_path
            .as_ref()
            .filter(|p| p.exists())
            .map(|p| Self::read_and_parse(p))
            .transpose()?;

        let local = match &self.explicit_path {
            Some(path) => Some(Self::read_and_parse(path)?),
            None => Self::local_config_path(cwd)
                .map(|p| Self::read_and_parse(&p))
                .transpose()?,
        };

        let config = global.unwrap_or_default().merge(local.unwrap_or_default());

        config.validate()?;
        Ok(config)
    }
}
