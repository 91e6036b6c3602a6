use crate::session::{Session, TranslationCell};
use crate::subtitle::SubtitleEntry;

/// Shown for entries covered by the previous entry's translation
pub const MERGED_MARKER: &str = "↑ (merged with previous)";
/// Shown for entries whose request failed
pub const ERROR_MARKER: &str = "[translation failed]";
/// Shown for the entry currently being translated
pub const LOADING_MARKER: &str = "…translating";

/// Translation column text for one row
pub fn translation_cell(session: &Session, index: usize) -> String {
    if session.loading() == Some(index) {
        return LOADING_MARKER.to_string();
    }
    match session.translations().get(index) {
        Some(TranslationCell::Translated(text)) => text.clone(),
        Some(TranslationCell::Merged) => MERGED_MARKER.to_string(),
        Some(TranslationCell::Failed) => ERROR_MARKER.to_string(),
        None => String::new(),
    }
}

fn format_row(row: usize, entry: &SubtitleEntry, translation: &str) -> String {
    format!(
        "{:<5} {:<8} {:<31} {:<50} {}",
        row,
        entry.label,
        format!("{} → {}", entry.start, entry.end),
        entry.text,
        translation
    )
}

/// One row as printed in the table; `index` is zero-based
pub fn render_row(session: &Session, index: usize) -> Option<String> {
    let entry = session.entries().get(index)?;
    Some(format_row(index + 1, entry, &translation_cell(session, index)))
}

/// The whole table with a header
pub fn render_table(session: &Session) -> String {
    let mut lines = vec![
        format!(
            "{:<5} {:<8} {:<31} {:<50} {}",
            "Row", "#", "Timestamps", "Content", "Translated Content"
        ),
        "-".repeat(120),
    ];
    lines.extend((0..session.entries().len()).filter_map(|idx| render_row(session, idx)));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{OutcomeKind, RequestOutcome};
    use crate::subtitle::parse_srt;
    use crate::translate::parse_reply;

    #[test]
    fn test_cells_render_distinctly() {
        let mut session = Session::new(parse_srt(
            "1\n00:00:01,000 --> 00:00:02,000\nOne\n\n\
             2\n00:00:03,000 --> 00:00:04,000\nTwo\n\n\
             3\n00:00:05,000 --> 00:00:06,000\nThree\n\n\
             4\n00:00:07,000 --> 00:00:08,000\nFour\n",
        ));
        let generation = session.generation();
        session.reconcile(RequestOutcome {
            index: 0,
            generation,
            result: OutcomeKind::Replied(parse_reply(r#"{"translation": "Uno dos", "entriesCovered": 2}"#)),
        });
        session.reconcile(RequestOutcome {
            index: 2,
            generation,
            result: OutcomeKind::Failed("boom".to_string()),
        });
        session.begin(3);

        assert_eq!(translation_cell(&session, 0), "Uno dos");
        assert_eq!(translation_cell(&session, 1), MERGED_MARKER);
        assert_eq!(translation_cell(&session, 2), ERROR_MARKER);
        assert_eq!(translation_cell(&session, 3), LOADING_MARKER);

        let table = render_table(&session);
        assert_eq!(table.lines().count(), 6);
        assert!(table.contains("00:00:01,000 → 00:00:02,000"));
        assert!(render_row(&session, 4).is_none());
    }
}
