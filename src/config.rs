use crate::api::client::GITHUB_API_URL;
use crate::error::{Result, ToolboxError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the config file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Tokens shorter than this are rejected before any request is made
const MIN_TOKEN_LEN: usize = 20;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Account that owns the configured repositories
    #[serde(default)]
    pub github_username: String,

    /// Repositories to analyze, in display order
    #[serde(default)]
    pub repositories: Vec<String>,

    /// Base URL of the GitHub REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Directory holding cached API responses
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Enable the on-disk response cache
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Extra attempts after the first failed request
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Where the Markdown dashboard is written
    #[serde(default = "default_readme_output")]
    pub readme_output: PathBuf,

    /// Where the JSON index is written
    #[serde(default = "default_index_output")]
    pub index_output: PathBuf,

    /// GitHub token (GITHUB_TOKEN in the environment takes precedence)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
}

impl Config {
    /// Load configuration from a specific path (JSON, or TOML for `.toml` files)
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ToolboxError::config(format!(
                "Config file not found at: {}",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        let mut config: Config = if is_toml(path) {
            toml::from_str(&contents)?
        } else {
            serde_json::from_str(&contents)?
        };
        config.apply_env_username();
        Ok(config)
    }

    /// Load config from file, or fall back to built-in defaults if it doesn't exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load_from(path) {
            Ok(config) => Ok(config),
            Err(ToolboxError::Config(_)) => {
                tracing::warn!(
                    "Config file {} not found, using defaults",
                    path.display()
                );
                let mut config = Self::default();
                config.apply_env_username();
                Ok(config)
            }
            Err(e) => Err(e),
        }
    }

    /// Write a starter config file
    pub fn create_default(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut config = Self::default();
        config.github_username = String::from("your-github-username");
        config.repositories = vec![String::from("your-repository")];

        let contents = if is_toml(path) {
            toml::to_string_pretty(&config)?
        } else {
            serde_json::to_string_pretty(&config)?
        };
        fs::write(path, contents)?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.github_username.trim().is_empty() {
            return Err(ToolboxError::MissingConfig(
                "github_username is required (config file or GITHUB_USERNAME)".to_string(),
            ));
        }

        if self.repositories.iter().all(|r| r.trim().is_empty()) {
            return Err(ToolboxError::MissingConfig(
                "repositories must list at least one repository".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ToolboxError::config("request_timeout_secs must be > 0"));
        }

        Ok(())
    }

    /// Resolve the GitHub token from the environment or the config file
    pub fn get_token(&self) -> Result<String> {
        let token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.github_token.clone())
            .map(|t| t.trim().to_string())
            .ok_or_else(|| ToolboxError::MissingConfig("GITHUB_TOKEN is not set".to_string()))?;

        validate_token(&token)?;
        Ok(token)
    }

    fn apply_env_username(&mut self) {
        if self.github_username.trim().is_empty() {
            if let Ok(username) = std::env::var("GITHUB_USERNAME") {
                self.github_username = username.trim().to_string();
            }
        }
    }
}

/// Basic shape check; the API is the real judge of validity
pub fn validate_token(token: &str) -> Result<()> {
    if token.len() < MIN_TOKEN_LEN {
        return Err(ToolboxError::config(format!(
            "GitHub token looks invalid (expected at least {} characters)",
            MIN_TOKEN_LEN
        )));
    }
    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_username: String::new(),
            repositories: Vec::new(),
            api_base_url: default_api_base_url(),
            cache_dir: default_cache_dir(),
            cache_enabled: default_true(),
            retries: default_retries(),
            request_timeout_secs: default_timeout(),
            readme_output: default_readme_output(),
            index_output: default_index_output(),
            github_token: None,
        }
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "toml")
}

// Serde default functions
fn default_api_base_url() -> String {
    GITHUB_API_URL.to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("api_cache")
}

fn default_true() -> bool {
    true
}

fn default_retries() -> u32 {
    2
}

fn default_timeout() -> u64 {
    30
}

fn default_readme_output() -> PathBuf {
    PathBuf::from("README.md")
}

fn default_index_output() -> PathBuf {
    PathBuf::from("tools_index.json")
}
