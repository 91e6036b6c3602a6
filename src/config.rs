use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, ReviewError};

fn default_temperature() -> f32 {
    0.2
}

fn default_context_window() -> usize {
    10
}

fn default_prompt_path() -> PathBuf {
    PathBuf::from("prompt.json")
}

fn default_credential_path() -> PathBuf {
    PathBuf::from(".srt-translator/credentials.json")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Chat completions endpoint URL
    pub endpoint: String,
    /// Model identifier sent with every request
    pub model: String,
    /// Sampling temperature, kept low so repeated clicks give stable output
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Which neighbouring entries are sent along as context
    #[serde(default)]
    pub context_policy: ContextPolicy,
    /// Maximum number of context entries on each side of the target
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

/// Context selection strategy. Only one is active for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextPolicy {
    /// Original text of the entries strictly before and strictly after the target
    #[default]
    Symmetric,
    /// Already translated entries before the target, untranslated entries after it
    TrailingTranslations,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Prompt configuration (JSON)
    #[serde(default = "default_prompt_path")]
    pub prompt_path: PathBuf,
    /// Client-side credential store
    #[serde(default = "default_credential_path")]
    pub credential_path: PathBuf,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: default_temperature(),
            context_policy: ContextPolicy::default(),
            context_window: default_context_window(),
        }
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            prompt_path: default_prompt_path(),
            credential_path: default_credential_path(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ReviewError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| ReviewError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ReviewError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ReviewError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [translate]
            endpoint = "http://localhost:8080/v1/chat/completions"
            model = "local-model"
            context_policy = "trailing-translations"
            "#,
        )
        .unwrap();

        assert_eq!(config.translate.model, "local-model");
        assert_eq!(config.translate.context_policy, ContextPolicy::TrailingTranslations);
        assert_eq!(config.translate.context_window, 10);
        assert!((config.translate.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.review.prompt_path, PathBuf::from("prompt.json"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.translate.context_window = 4;
        config.save_to_file(&path).unwrap();

        let reloaded = Config::from_file(&path).unwrap();
        assert_eq!(reloaded.translate.context_window, 4);
        assert_eq!(reloaded.translate.context_policy, ContextPolicy::Symmetric);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::from_file("/nonexistent/config.toml").unwrap_err();
        assert!(matches!(err, ReviewError::Config(_)));
    }
}
