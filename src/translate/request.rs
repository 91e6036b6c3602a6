use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::TranslateConfig;
use crate::error::Result;
use crate::prompt::PromptConfig;
use super::context::{ContextEntry, RequestContext};

/// Fixed system instruction describing the only accepted reply shape
pub const SYSTEM_INSTRUCTION: &str = "You are a professional subtitle translator.\n\
\n\
You receive a JSON object with an \"instruction\", the \"target\" subtitle entry to translate, \
the \"next\" entry that follows it (if any), and surrounding \"context\" entries that are for \
reference only and must not be translated.\n\
\n\
Translate the target entry. When the target is an incomplete sentence that continues into the \
following entries, you may translate those consecutive entries together as one text.\n\
\n\
Reply with ONLY a JSON object of the form {\"translation\": \"...\", \"entriesCovered\": 1} where \
\"translation\" is the translated text and \"entriesCovered\" is the number of consecutive source \
entries, starting at the target, that the translation covers (at least 1).\n\
Do not add explanations, alternatives, or markdown.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryText {
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextBlock {
    pub before: Vec<ContextEntry>,
    pub after: Vec<ContextEntry>,
}

/// User message content, serialized as JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationPayload {
    pub instruction: String,
    pub target: EntryText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<EntryText>,
    pub context: ContextBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Additional prompt configuration fields, forwarded as given
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Body of one chat completions call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
}

impl TranslationPayload {
    pub fn new(context: RequestContext<'_>, prompt: &PromptConfig) -> Self {
        Self {
            instruction: prompt.resolved_instruction(),
            target: EntryText {
                label: context.target.label.clone(),
                text: context.target.text.clone(),
            },
            next: context.next.map(|entry| EntryText {
                label: entry.label.clone(),
                text: entry.text.clone(),
            }),
            context: ContextBlock {
                before: context.before,
                after: context.after,
            },
            summary: prompt
                .summary
                .as_ref()
                .filter(|s| !s.trim().is_empty())
                .cloned(),
            extra: prompt.extra.clone(),
        }
    }
}

/// Assemble the chat request for one click
pub fn build_chat_request(
    context: RequestContext<'_>,
    prompt: &PromptConfig,
    config: &TranslateConfig,
) -> Result<ChatRequest> {
    let payload = TranslationPayload::new(context, prompt);

    Ok(ChatRequest {
        model: config.model.clone(),
        temperature: config.temperature,
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: SYSTEM_INSTRUCTION.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: serde_json::to_string(&payload)?,
            },
        ],
    })
}
