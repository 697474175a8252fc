//! Centralized configuration (environment variables + defaults).
//!
//! Call `dotenv::dotenv().ok()` before `AppConfig::from_env()` so a local `.env`
//! file is honoured.

use crate::error::{Nl2SqlError, Result};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Settings for the OpenAI-compatible generator.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub schema_file: Option<PathBuf>,
    pub examples_file: Option<PathBuf>,
    /// Present only when `OPENAI_API_KEY` is set.
    pub llm: Option<LlmConfig>,
    pub max_result_rows: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database_url: None,
            schema_file: None,
            examples_file: None,
            llm: None,
            max_result_rows: 100,
        }
    }
}

impl AppConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm = match non_empty("OPENAI_API_KEY") {
            Some(api_key) => Some(LlmConfig {
                api_key,
                model: non_empty("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: non_empty("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                max_tokens: parse_var(&non_empty, "LLM_MAX_TOKENS", 512)?,
                temperature: parse_var(&non_empty, "LLM_TEMPERATURE", 0.7)?,
            }),
            None => None,
        };

        Ok(Self {
            host: non_empty("API_HOST").unwrap_or(defaults.host),
            port: parse_var(&non_empty, "API_PORT", defaults.port)?,
            database_url: non_empty("DATABASE_URL"),
            schema_file: non_empty("SCHEMA_FILE").map(PathBuf::from),
            examples_file: non_empty("EXAMPLES_FILE").map(PathBuf::from),
            llm,
            max_result_rows: parse_var(&non_empty, "MAX_RESULT_ROWS", defaults.max_result_rows)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| {
            Nl2SqlError::Config(format!("{} must be a valid value (got '{}'): {}", key, raw, e))
        }),
        None => Ok(default),
    }
}
