// Translation request pipeline
//
// - context: which neighbouring entries accompany a request
// - request: prompt resolution, payload and chat request construction
// - response: three-branch parsing of the model's reply
// - openai: the chat completions client

pub mod context;
pub mod openai;
pub mod request;
pub mod response;

use async_trait::async_trait;

pub use context::{select_context, ContextEntry, RequestContext};
pub use request::{build_chat_request, ChatMessage, ChatRequest, TranslationPayload, SYSTEM_INSTRUCTION};
pub use response::{parse_reply, ParsedReply, TranslationReply, UNPARSEABLE_TRANSLATION};
use crate::error::Result;

/// A chat endpoint able to answer one translation request
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send the request and return the raw text of the model's reply
    async fn complete(&self, request: &ChatRequest, api_key: &str) -> Result<String>;
}
