use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Translation written when the reply cannot be understood at all
pub const UNPARSEABLE_TRANSLATION: &str = "Error: could not parse translation response";

/// The reply object the system instruction asks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationReply {
    pub translation: String,
    #[serde(default)]
    pub merged_with_next_entry: bool,
    #[serde(default, alias = "numberOfEntries", deserialize_with = "lenient_count")]
    pub entries_covered: Option<usize>,
}

/// Accepts `2`, `2.0` or `"2"`; anything else (negative, fractional, other
/// types) reads as absent rather than rejecting the reply.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let count = match value {
        Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().and_then(whole_count)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| s.parse::<f64>().ok().and_then(whole_count))
        }
        _ => None,
    };
    Ok(count.map(|n| usize::try_from(n).unwrap_or(usize::MAX)))
}

fn whole_count(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0).then_some(f as u64)
}

impl TranslationReply {
    /// Number of consecutive entries the translation covers, at least 1
    pub fn covered(&self) -> usize {
        let from_flag = if self.merged_with_next_entry { 2 } else { 1 };
        self.entries_covered.unwrap_or(0).max(from_flag)
    }
}

/// How a reply body was understood
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedReply {
    /// The whole body is the reply object
    Structured(TranslationReply),
    /// The reply object was found embedded in surrounding text
    RecoveredFromText(TranslationReply),
    /// Nothing usable in the body
    Unparseable,
}

impl ParsedReply {
    /// Translation text and covered count; unparseable replies cover one entry
    pub fn into_parts(self) -> (String, usize) {
        match self {
            Self::Structured(reply) | Self::RecoveredFromText(reply) => {
                let covered = reply.covered();
                (reply.translation, covered)
            }
            Self::Unparseable => (UNPARSEABLE_TRANSLATION.to_string(), 1),
        }
    }
}

/// Parse a reply body: whole body first, then the first balanced `{...}` in it.
pub fn parse_reply(body: &str) -> ParsedReply {
    let body = body.trim();

    if let Ok(reply) = serde_json::from_str::<TranslationReply>(body) {
        return ParsedReply::Structured(reply);
    }

    if let Some(candidate) = first_json_object(body) {
        debug!("Extracted JSON from mixed text: {}", candidate);
        match serde_json::from_str::<TranslationReply>(candidate) {
            Ok(reply) => return ParsedReply::RecoveredFromText(reply),
            Err(e) => debug!("Embedded JSON is not a translation reply: {}", e),
        }
    }

    warn!("Failed to parse translation response: {}", body);
    ParsedReply::Unparseable
}

/// First balanced brace-delimited substring, ignoring braces inside string literals
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
