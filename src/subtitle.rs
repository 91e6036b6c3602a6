use std::path::Path;
use std::sync::LazyLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, ReviewError};
use crate::session::{TranslationCell, TranslationState};

/// Separator between the start and end timestamps on an SRT timing line
pub const TIMING_SEPARATOR: &str = " --> ";

static BLOCK_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("block separator pattern is valid"));

/// One timed caption unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    /// Sequence label as written in the source; not necessarily numeric
    pub label: String,
    pub start: String,
    pub end: String,
    /// Caption body, multi-line captions joined with a single space
    pub text: String,
}

impl SubtitleEntry {
    /// Render the entry back as an SRT block (without the trailing blank line)
    pub fn to_block(&self) -> String {
        format!("{}\n{}{}{}\n{}", self.label, self.start, TIMING_SEPARATOR, self.end, self.text)
    }
}

/// Parse SRT text into entries, in source order.
///
/// Blocks with fewer than three lines are skipped. Labels and timestamps are
/// kept verbatim; nothing is validated.
pub fn parse_srt(content: &str) -> Vec<SubtitleEntry> {
    let mut entries = Vec::new();

    for block in BLOCK_SEPARATOR.split(content) {
        let lines: Vec<&str> = block.trim().lines().collect();
        if lines.len() < 3 {
            continue;
        }

        let (start, end) = match lines[1].split_once(TIMING_SEPARATOR) {
            Some((start, end)) => (start, end),
            None => (lines[1], ""),
        };

        entries.push(SubtitleEntry {
            label: lines[0].to_string(),
            start: start.to_string(),
            end: end.to_string(),
            text: lines[2..].join(" "),
        });
    }

    entries
}

/// Read and parse an SRT file
pub async fn load_srt<P: AsRef<Path>>(path: P) -> Result<Vec<SubtitleEntry>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ReviewError::FileNotFound(path.display().to_string()));
    }

    let content = fs::read_to_string(path).await?;
    let entries = parse_srt(&content);
    info!("Loaded {} subtitle entries from {}", entries.len(), path.display());
    Ok(entries)
}

/// Render the entries as SRT, substituting translations where present.
///
/// An entry followed by merged entries takes over their end time and the merged
/// entries are left out. Untranslated and failed entries keep their source text.
pub fn render_translated_srt(entries: &[SubtitleEntry], state: &TranslationState) -> String {
    let mut srt_content = String::new();
    let mut idx = 0;

    while idx < entries.len() {
        let entry = &entries[idx];
        let mut span_end = idx;
        while span_end + 1 < entries.len()
            && matches!(state.get(span_end + 1), Some(TranslationCell::Merged))
        {
            span_end += 1;
        }

        let text = match state.get(idx) {
            Some(TranslationCell::Translated(text)) => text.as_str(),
            _ => entry.text.as_str(),
        };

        let rendered = SubtitleEntry {
            label: entry.label.clone(),
            start: entry.start.clone(),
            end: entries[span_end].end.clone(),
            text: text.trim().to_string(),
        };
        srt_content.push_str(&rendered.to_block());
        srt_content.push_str("\n\n");

        idx = span_end + 1;
    }

    srt_content
}

/// Export the session as a translated SRT file
pub async fn write_translated_srt<P: AsRef<Path>>(
    entries: &[SubtitleEntry],
    state: &TranslationState,
    output_path: P,
) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Writing translated SRT file: {}", output_path.display());

    let srt_content = render_translated_srt(entries, state);
    debug!("Rendered {} bytes of SRT", srt_content.len());

    fs::write(output_path, srt_content).await?;

    info!("SRT file written successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:03,000\nHello there.\n\n\
                          2\n00:00:04,000 --> 00:00:06,000\nHow are\nyou today?\n\n\
                          3\n00:00:07,000 --> 00:00:08,500\nFine.\n";

    #[test]
    fn test_parse_srt_in_source_order() {
        let entries = parse_srt(SAMPLE);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].label, "1");
        assert_eq!(entries[1].text, "How are you today?");
        assert_eq!(entries[2].label, "3");
    }

    #[test]
    fn test_timing_line_split() {
        let entries = parse_srt(SAMPLE);
        assert_eq!(entries[0].start, "00:00:01,000");
        assert_eq!(entries[0].end, "00:00:03,000");
    }

    #[test]
    fn test_short_blocks_are_dropped() {
        let content = "1\n00:00:01,000 --> 00:00:02,000\n\n\
                       2\n00:00:03,000 --> 00:00:04,000\nKept\n\n\
                       lonely line";
        let entries = parse_srt(content);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "2");
        assert_eq!(entries[0].text, "Kept");
    }

    #[test]
    fn test_crlf_and_padded_separators() {
        let content = "a\r\n00:00:01,000 --> 00:00:02,000\r\nfirst\r\n  \r\n\r\nb\r\n00:00:03,000 --> 00:00:04,000\r\nsecond\r\nline\r\n";
        let entries = parse_srt(content);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, "a");
        assert_eq!(entries[0].text, "first");
        assert_eq!(entries[1].text, "second line");
    }

    #[test]
    fn test_malformed_timestamps_propagate() {
        let content = "7\nnot a timing line\nstill text\n";
        let entries = parse_srt(content);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].start, "not a timing line");
        assert_eq!(entries[0].end, "");
        assert_eq!(entries[0].text, "still text");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_srt("").is_empty());
        assert!(parse_srt("\n\n\n").is_empty());
    }

    #[test]
    fn test_render_merges_spans() {
        let entries = parse_srt(SAMPLE);
        let mut state = TranslationState::default();
        state.set(0, TranslationCell::Translated("Hola, ¿cómo estás hoy?".to_string()));
        state.set(1, TranslationCell::Merged);
        state.set(2, TranslationCell::Failed);

        let rendered = render_translated_srt(&entries, &state);
        assert_eq!(
            rendered,
            "1\n00:00:01,000 --> 00:00:06,000\nHola, ¿cómo estás hoy?\n\n\
             3\n00:00:07,000 --> 00:00:08,500\nFine.\n\n"
        );
    }

    #[tokio::test]
    async fn test_load_srt_from_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("movie.srt");
        file.write_str(SAMPLE).unwrap();

        let entries = load_srt(file.path()).await.unwrap();
        assert_eq!(entries.len(), 3);

        let missing = load_srt(temp.path().join("missing.srt")).await;
        assert!(matches!(missing, Err(ReviewError::FileNotFound(_))));
    }
}
