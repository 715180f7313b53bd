//! Configuration management
//!
//! Settings come from an optional `settings.json` in the finsight directory,
//! with environment variables taking precedence:
//! ```json
//! {
//!   "llm": { "apiKey": "sk-...", "model": "gpt-4o", "baseUrl": "...", "temperature": 0.65, "timeoutSecs": 60 },
//!   "server": { "host": "0.0.0.0", "port": 5000 },
//!   "insights": { "utcOffsetMinutes": 330, "maxPromptTransactions": 300 },
//!   "demoMode": false
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize, Serializer};
use url::Url;

use crate::domain::period::{utc_offset, DEFAULT_UTC_OFFSET_MINUTES};
use crate::domain::result::Error;

pub const SETTINGS_FILE: &str = "settings.json";

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TEMPERATURE: f32 = 0.65;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_PROMPT_TRANSACTIONS: usize = 300;

/// Largest accepted UTC offset, in minutes
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Raw settings.json structure; every field optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    llm: LlmSettings,
    #[serde(default)]
    server: ServerSettings,
    #[serde(default)]
    insights: InsightSettings,
    #[serde(default)]
    demo_mode: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmSettings {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsightSettings {
    utc_offset_minutes: Option<i32>,
    max_prompt_transactions: Option<usize>,
}

/// LLM connection settings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    #[serde(serialize_with = "mask_api_key")]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Knobs for digest and prompt building
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightConfig {
    /// Offset used to turn instants into calendar months (IST by default)
    pub utc_offset_minutes: i32,
    pub max_prompt_transactions: usize,
}

/// Finsight configuration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub insights: InsightConfig,
    pub demo_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                api_key: None,
                model: DEFAULT_MODEL.to_string(),
                base_url: DEFAULT_BASE_URL.to_string(),
                temperature: DEFAULT_TEMPERATURE,
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
            server: ServerConfig {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
            },
            insights: InsightConfig {
                utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
                max_prompt_transactions: DEFAULT_MAX_PROMPT_TRANSACTIONS,
            },
            demo_mode: false,
        }
    }
}

impl Config {
    /// Load config from the finsight directory and the process environment
    ///
    /// Environment overrides:
    /// - `OPENAI_API_KEY`, `FINSIGHT_MODEL`, `FINSIGHT_BASE_URL`
    /// - `HOST`, `PORT`
    /// - `FINSIGHT_DEMO_MODE` (for CI/testing)
    pub fn load(finsight_dir: &Path) -> Result<Self> {
        Self::load_with_env(finsight_dir, |key| std::env::var(key).ok())
    }

    /// Load config with an explicit environment lookup
    pub fn load_with_env<F>(finsight_dir: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings_path = finsight_dir.join(SETTINGS_FILE);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)
                .with_context(|| format!("Failed to read {}", settings_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid settings file {}", settings_path.display()))?
        } else {
            SettingsFile::default()
        };

        let defaults = Config::default();
        let env_text = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let llm = LlmConfig {
            api_key: env_text("OPENAI_API_KEY").or(raw.llm.api_key.filter(|k| !k.trim().is_empty())),
            model: env_text("FINSIGHT_MODEL")
                .or(raw.llm.model)
                .unwrap_or(defaults.llm.model),
            base_url: env_text("FINSIGHT_BASE_URL")
                .or(raw.llm.base_url)
                .unwrap_or(defaults.llm.base_url),
            temperature: raw.llm.temperature.unwrap_or(defaults.llm.temperature),
            timeout_secs: raw.llm.timeout_secs.unwrap_or(defaults.llm.timeout_secs),
        };

        let server = ServerConfig {
            host: env_text("HOST")
                .or(raw.server.host)
                .unwrap_or(defaults.server.host),
            port: env_text("PORT")
                .and_then(|v| v.parse().ok())
                .or(raw.server.port)
                .unwrap_or(defaults.server.port),
        };

        let insights = InsightConfig {
            utc_offset_minutes: raw
                .insights
                .utc_offset_minutes
                .unwrap_or(defaults.insights.utc_offset_minutes),
            max_prompt_transactions: raw
                .insights
                .max_prompt_transactions
                .unwrap_or(defaults.insights.max_prompt_transactions),
        };

        let demo_mode = match env_text("FINSIGHT_DEMO_MODE").as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => false,
            _ => raw.demo_mode.unwrap_or(false),
        };

        Ok(Self {
            llm,
            server,
            insights,
            demo_mode,
        })
    }

    /// Check the loaded values before anything is started with them
    pub fn validate(&self) -> crate::domain::result::Result<()> {
        let url = Url::parse(&self.llm.base_url)
            .map_err(|e| Error::config(format!("Invalid LLM base URL '{}': {}", self.llm.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "LLM base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::config(format!(
                "temperature must be between 0 and 2, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(Error::config("timeoutSecs must be greater than 0"));
        }

        if self.insights.max_prompt_transactions == 0 {
            return Err(Error::config("maxPromptTransactions must be greater than 0"));
        }

        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&self.insights.utc_offset_minutes) {
            return Err(Error::config(format!(
                "utcOffsetMinutes must be within ±{}, got {}",
                MAX_OFFSET_MINUTES, self.insights.utc_offset_minutes
            )));
        }

        if !self.demo_mode && self.llm.api_key.is_none() {
            return Err(Error::config(
                "OPENAI_API_KEY is not set (set it, add llm.apiKey to settings.json, or enable demo mode)",
            ));
        }

        Ok(())
    }

    /// Offset used for period extraction
    pub fn utc_offset(&self) -> crate::domain::result::Result<FixedOffset> {
        utc_offset(self.insights.utc_offset_minutes).ok_or_else(|| {
            Error::config(format!(
                "Invalid UTC offset: {} minutes",
                self.insights.utc_offset_minutes
            ))
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Enable demo mode
    pub fn enable_demo_mode(&mut self) {
        self.demo_mode = true;
    }
}

/// Show only the last four characters of the key
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

fn mask_api_key<S: Serializer>(key: &Option<String>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match key {
        Some(key) => serializer.serialize_some(&mask_key(key)),
        None => serializer.serialize_none(),
    }
}
