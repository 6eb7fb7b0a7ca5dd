use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::filter::NavigationFilterConfig;

/// Configuration for the extension's background, popup and remote service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionConfig {
    /// Bearer credential for the completion service
    #[serde(default)]
    pub api_key: String,

    /// Chat-completion endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Decoding temperature; kept low to favour repeatable verdicts
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// File holding the persisted last-analysis slot
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Which page loads trigger an automatic analysis
    #[serde(default)]
    pub auto_analysis: NavigationFilterConfig,
}

/// Default value for api_url
fn default_api_url() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

/// Default value for model
fn default_model() -> String {
    "llama3-70b-8192".to_string()
}

/// Default value for temperature
fn default_temperature() -> f32 {
    0.2
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

/// Default value for state_file
fn default_state_file() -> PathBuf {
    PathBuf::from("stride-review-state.json")
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            webdriver_url: default_webdriver_url(),
            state_file: default_state_file(),
            auto_analysis: NavigationFilterConfig::default(),
        }
    }
}

impl ExtensionConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Apply `GROQ_API_KEY` and `WEBDRIVER_URL` from the environment when set
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var("GROQ_API_KEY").ok(),
            std::env::var("WEBDRIVER_URL").ok(),
        )
    }

    fn with_overrides(mut self, api_key: Option<String>, webdriver_url: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.api_key = key;
        }
        if let Some(url) = webdriver_url.filter(|u| !u.is_empty()) {
            self.webdriver_url = url;
        }
        if self.api_key.is_empty() {
            ::log::warn!("No API key configured; analysis requests will be rejected");
        }
        self
    }
}
