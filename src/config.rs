//! Server configuration.
//!
//! Values are layered: built-in defaults, then a JSON config file, then
//! `CLEANBOT_*` environment variables. Command-line flags are applied last by
//! the binary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{middleware::SecurityConfig, DEFAULT_MAX_TOTAL_STEPS};

const APP_NAME: &str = "cleanbot";
const CONFIG_FILE: &str = "config.json";
const HISTORY_FILE: &str = "session_history.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// History file. Defaults to the platform data directory.
    pub history_path: Option<PathBuf>,
    /// Upper bound on the total steps of one cleaning plan.
    pub max_total_steps: u64,
    pub api_key: Option<String>,
    pub cors_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            history_path: None,
            max_total_steps: DEFAULT_MAX_TOTAL_STEPS,
            api_key: None,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `path`, or from the user's config directory when
    /// no path is given, then apply environment overrides.
    ///
    /// An explicit path must exist; the default one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Override fields from `CLEANBOT_*` variables, looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = var("CLEANBOT_HOST") {
            self.host = host;
        }
        if let Some(port) = var("CLEANBOT_PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("CLEANBOT_PORT is not a valid port: {}", port))?;
        }
        if let Some(path) = var("CLEANBOT_HISTORY") {
            self.history_path = Some(PathBuf::from(path));
        }
        if let Some(max) = var("CLEANBOT_MAX_TOTAL_STEPS") {
            self.max_total_steps = max
                .parse()
                .with_context(|| format!("CLEANBOT_MAX_TOTAL_STEPS is not a number: {}", max))?;
        }
        if let Some(key) = var("CLEANBOT_API_KEY").filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(origins) = var("CLEANBOT_CORS_ORIGINS") {
            self.cors_origins = Some(
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }
        Ok(())
    }

    /// The history file to open: the configured one or the platform default.
    pub fn history_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.history_path {
            return Ok(path.clone());
        }
        let dirs = directories::ProjectDirs::from("", "", APP_NAME)
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join(HISTORY_FILE))
    }

    pub fn security(&self) -> SecurityConfig {
        SecurityConfig {
            api_key: self.api_key.clone(),
            cors_origins: self.cors_origins.clone(),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Some(path)
}
