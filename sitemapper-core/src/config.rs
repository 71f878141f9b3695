use crate::data::DEFAULT_RESULT_CAPACITY;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use sitemapper_scanner::crawler::DEFAULT_MAX_DEPTH;
use sitemapper_scanner::fetcher::DEFAULT_TIMEOUT_SECS;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DATABASE_FILE_NAME: &str = "sitemapper.db";

/// Settings read from `config.json` in the config directory.
///
/// Every field is optional in the file; command-line flags override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Maximum number of nested index hops to follow
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every fetch
    #[serde(default)]
    pub user_agent: Option<String>,

    /// How many crawl results to keep for later export
    #[serde(default = "default_result_capacity")]
    pub result_capacity: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_result_capacity() -> usize {
    DEFAULT_RESULT_CAPACITY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
            result_capacity: default_result_capacity(),
        }
    }
}

impl Config {
    /// Load `config.json` from `config_dir`, or the defaults if it is absent
    pub fn load(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config = serde_json::from_str(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, config_dir: &Path) -> Result<()> {
        fs::create_dir_all(config_dir)?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILE_NAME), content)?;
        Ok(())
    }
}

pub fn database_path(config_dir: &Path) -> PathBuf {
    config_dir.join(DATABASE_FILE_NAME)
}
