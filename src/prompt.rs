use std::path::Path;
use std::sync::LazyLock;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Result, ReviewError};

/// Placeholder substituted with the target language, matched case-insensitively
pub const LANGUAGE_PLACEHOLDER: &str = "{language}";

static LANGUAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i){}", regex::escape(LANGUAGE_PLACEHOLDER)))
        .expect("language placeholder pattern is valid")
});

/// User supplied prompt configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Instruction template, may contain the language placeholder
    pub prompt: String,
    /// Target language
    pub language: String,
    /// Short description of the subtitle source (topic, speakers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Any other fields, forwarded to the model untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PromptConfig {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReviewError::Config(format!("Failed to read prompt file {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// The instruction text with every language placeholder replaced
    pub fn resolved_instruction(&self) -> String {
        substitute_language(&self.prompt, &self.language)
    }
}

/// Replace all occurrences of the language placeholder, ignoring case
pub fn substitute_language(template: &str, language: &str) -> String {
    LANGUAGE_PATTERN
        .replace_all(template, NoExpand(language))
        .into_owned()
}

/// What is shown in place of the prompt configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PromptPreview {
    Loaded(PromptConfig),
    /// Malformed or unreadable configuration; shown as `{"error": "..."}`
    Invalid { error: String },
}

impl PromptPreview {
    pub fn from_json(content: &str) -> Self {
        match PromptConfig::from_json(content) {
            Ok(config) => Self::Loaded(config),
            Err(e) => {
                warn!("Prompt configuration is malformed: {}", e);
                Self::Invalid { error: e.to_string() }
            }
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        debug!("Loading prompt configuration from {}", path.display());
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_json(&content),
            Err(e) => Self::Invalid {
                error: format!("Failed to read {}: {}", path.display(), e),
            },
        }
    }

    pub fn config(&self) -> Option<&PromptConfig> {
        match self {
            Self::Loaded(config) => Some(config),
            Self::Invalid { .. } => None,
        }
    }

    /// Pretty JSON for display. Loaded configurations show the resolved instruction.
    pub fn render(&self) -> String {
        let value = match self {
            Self::Loaded(config) => {
                let mut resolved = config.clone();
                resolved.prompt = config.resolved_instruction();
                serde_json::to_value(&resolved)
            }
            Self::Invalid { .. } => serde_json::to_value(self),
        };

        match value.and_then(|v| serde_json::to_string_pretty(&v)) {
            Ok(text) => text,
            Err(e) => format!("{{\"error\": \"{}\"}}", e),
        }
    }
}
