//! srt-translator - Subtitle review with on-demand LLM translation
//!
//! Parses SRT files into timed entries, shows them as a table, and translates
//! selected entries through a chat completions API, sending the neighbouring
//! entries and a configurable prompt along as context.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod prompt;
pub mod review;
pub mod session;
pub mod subtitle;
pub mod table;
pub mod translate;
