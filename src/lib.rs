//! Goal-driven web agent
//!
//! A typed action catalog is compiled into a tool schema, a tool-calling model
//! picks one action per cycle, and the choice is validated and executed
//! against a Chromium page.

pub mod actions;
pub mod agent;
pub mod browser;
pub mod browser_setup;
pub mod llm;
mod manager;
pub mod page_extractor;
pub mod utils;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use agent::FreeTextPolicy;
pub use manager::BrowserManager;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub agent: AgentSettings,

    #[serde(default)]
    pub browser: BrowserConfig,
}

/// OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_model_timeout_secs")]
    pub timeout_secs: u64,
}

/// Run loop and termination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_max_cycles")]
    pub max_cycles: usize,

    /// Consecutive rejected decisions tolerated before giving up; 0 disables
    #[serde(default = "default_max_consecutive_rejections")]
    pub max_consecutive_rejections: usize,

    /// Offer finish_task / abandon_task to the model
    #[serde(default = "default_completion_actions")]
    pub completion_actions: bool,

    #[serde(default)]
    pub on_free_text: FreeTextPolicy,

    /// Previous cycles shown to the model
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Page text fragments are cut to this many characters; null keeps them whole
    #[serde(default = "default_max_text_len")]
    pub max_text_len: Option<usize>,

    /// Replacement for the built-in decision prompt
    #[serde(default)]
    pub prompt_path: Option<PathBuf>,

    /// Directory `write_to_file` is confined to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

/// Browser security and launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Disable web security features (Same-Origin Policy, etc.)
    /// WARNING: Only enable for trusted content
    #[serde(default = "default_disable_security")]
    pub disable_security: bool,

    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    #[serde(default = "default_interaction_timeout_ms")]
    pub interaction_timeout_ms: u64,

    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-3.5-turbo-0613".to_string()
}
fn default_api_key_env() -> String {
    utils::constants::DEFAULT_API_KEY_ENV.to_string()
}
fn default_temperature() -> f32 {
    0.5
}
fn default_model_timeout_secs() -> u64 {
    120
}

fn default_max_cycles() -> usize {
    10
}
fn default_max_consecutive_rejections() -> usize {
    3
}
fn default_completion_actions() -> bool {
    true
}
fn default_history_window() -> usize {
    5
}
fn default_max_text_len() -> Option<usize> {
    Some(500)
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(utils::constants::DEFAULT_OUTPUT_DIR)
}

fn default_headless() -> bool {
    true
}
fn default_disable_security() -> bool {
    false
}
fn default_navigation_timeout_ms() -> u64 {
    30_000
}
fn default_interaction_timeout_ms() -> u64 {
    5_000
}
fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    720
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_model_timeout_secs(),
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_cycles: default_max_cycles(),
            max_consecutive_rejections: default_max_consecutive_rejections(),
            completion_actions: default_completion_actions(),
            on_free_text: FreeTextPolicy::default(),
            history_window: default_history_window(),
            max_text_len: default_max_text_len(),
            prompt_path: None,
            output_dir: default_output_dir(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            disable_security: default_disable_security(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            interaction_timeout_ms: default_interaction_timeout_ms(),
            window: WindowConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Load config from `path`, else `config.yaml` in the working directory,
/// else defaults. An explicit path that does not exist is an error.
pub fn load_yaml_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(utils::constants::DEFAULT_CONFIG_FILE);
            if !fallback.exists() {
                return Ok(Config::default());
            }
            fallback
        }
    };

    let contents = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
        path: config_path.clone(),
        source,
    })?;

    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: config_path,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "model:\n  model: gpt-4o-mini\nagent:\n  max_cycles: 3\n  on_free_text: complete\nbrowser:\n  headless: false"
        )
        .unwrap();

        let config = load_yaml_config(Some(file.path())).unwrap();
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(config.model.temperature, 0.5);
        assert_eq!(config.model.endpoint, "https://api.openai.com/v1");
        assert_eq!(config.agent.max_cycles, 3);
        assert_eq!(config.agent.on_free_text, FreeTextPolicy::Complete);
        assert_eq!(config.agent.max_consecutive_rejections, 3);
        assert!(!config.browser.headless);
        assert_eq!(config.browser.window.width, 1280);
        assert_eq!(config.browser.navigation_timeout_ms, 30_000);
    }

    #[test]
    fn empty_sections_use_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.agent.history_window, 5);
        assert_eq!(config.agent.output_dir, PathBuf::from("agent_output"));
        assert!(config.agent.completion_actions);
        assert_eq!(config.agent.max_text_len, Some(500));
        assert_eq!(config.model.max_tokens, None);
    }

    #[test]
    fn null_text_cap_keeps_fragments_whole() {
        let config: Config = serde_yaml::from_str("agent:\n  max_text_len: null").unwrap();
        assert_eq!(config.agent.max_text_len, None);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_yaml_config(Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_yaml_is_reported_with_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "agent:\n  max_cycles: lots").unwrap();
        let err = load_yaml_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
