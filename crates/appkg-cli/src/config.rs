//! Configuration file loading.
//!
//! Precedence, lowest first: built-in defaults, `appkg.toml` (or `--config`),
//! `APPKG_*` environment variables, command-line flags. The last two are
//! handled by clap and applied with [`ConfigOverrides`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use appkg_graph::{BackendKind, GraphConfig};
use appkg_qa::LlmConfig;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "appkg.toml";

/// Contents of `appkg.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub graph: GraphConfig,
    pub llm: LlmConfig,
}

/// Values given through flags or `APPKG_*` variables.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub uri: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub backend: Option<BackendKind>,
    pub llm_base_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
}

impl AppConfig {
    /// Load `explicit` if given (it must exist), else `appkg.toml` if present,
    /// else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
        };

        match path {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        fn set<T>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        set(&mut self.graph.uri, overrides.uri);
        set(&mut self.graph.user, overrides.user);
        set(&mut self.graph.password, overrides.password);
        set(&mut self.graph.database, overrides.database);
        set(&mut self.graph.backend, overrides.backend);
        set(&mut self.llm.base_url, overrides.llm_base_url);
        set(&mut self.llm.api_key, overrides.llm_api_key);
        set(&mut self.llm.model, overrides.llm_model);
        self
    }
}
