use serde::Serialize;

use crate::config::ContextPolicy;
use crate::session::TranslationState;
use crate::subtitle::SubtitleEntry;

/// One neighbouring entry supplied to the model for coherence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextEntry {
    #[serde(skip)]
    pub index: usize,
    pub label: String,
    pub text: String,
    /// Present only for already translated entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

/// Everything one click sends along with the target entry
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    pub index: usize,
    pub target: &'a SubtitleEntry,
    pub next: Option<&'a SubtitleEntry>,
    pub before: Vec<ContextEntry>,
    pub after: Vec<ContextEntry>,
}

impl ContextEntry {
    fn source(index: usize, entry: &SubtitleEntry) -> Self {
        Self {
            index,
            label: entry.label.clone(),
            text: entry.text.clone(),
            translation: None,
        }
    }
}

/// Build the context for a click on `index`.
///
/// Neither side ever includes `index` itself, and each side holds at most
/// `window` entries. Returns `None` when `index` is outside the entries.
pub fn select_context<'a>(
    entries: &'a [SubtitleEntry],
    index: usize,
    translations: &TranslationState,
    policy: ContextPolicy,
    window: usize,
) -> Option<RequestContext<'a>> {
    let target = entries.get(index)?;
    let before_range = index.saturating_sub(window)..index;
    let after_range = (index + 1)..(index + 1).saturating_add(window).min(entries.len());

    let (before, after) = match policy {
        ContextPolicy::Symmetric => {
            let before = before_range
                .map(|i| ContextEntry::source(i, &entries[i]))
                .collect();
            let after = after_range
                .map(|i| ContextEntry::source(i, &entries[i]))
                .collect();
            (before, after)
        }
        ContextPolicy::TrailingTranslations => {
            let before = before_range
                .filter_map(|i| {
                    translations.translated_text(i).map(|translated| ContextEntry {
                        translation: Some(translated.to_string()),
                        ..ContextEntry::source(i, &entries[i])
                    })
                })
                .collect();
            let after = after_range
                .filter(|i| translations.get(*i).is_none())
                .map(|i| ContextEntry::source(i, &entries[i]))
                .collect();
            (before, after)
        }
    };

    Some(RequestContext {
        index,
        target,
        next: entries.get(index + 1),
        before,
        after,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TranslationCell;

    fn entries(count: usize) -> Vec<SubtitleEntry> {
        (0..count)
            .map(|i| SubtitleEntry {
                label: (i + 1).to_string(),
                start: "00:00:00,000".to_string(),
                end: "00:00:01,000".to_string(),
                text: format!("line {}", i),
            })
            .collect()
    }

    fn indices(context: &[ContextEntry]) -> Vec<usize> {
        context.iter().map(|c| c.index).collect()
    }

    #[test]
    fn test_symmetric_window_in_the_middle() {
        let entries = entries(30);
        let ctx = select_context(&entries, 15, &TranslationState::default(), ContextPolicy::Symmetric, 10).unwrap();

        assert_eq!(indices(&ctx.before), (5..15).collect::<Vec<_>>());
        assert_eq!(indices(&ctx.after), (16..26).collect::<Vec<_>>());
        assert_eq!(ctx.target.text, "line 15");
        assert_eq!(ctx.next.map(|e| e.text.as_str()), Some("line 16"));
    }

    #[test]
    fn test_symmetric_window_at_the_edges() {
        let entries = entries(4);
        let state = TranslationState::default();

        let first = select_context(&entries, 0, &state, ContextPolicy::Symmetric, 10).unwrap();
        assert!(first.before.is_empty());
        assert_eq!(indices(&first.after), vec![1, 2, 3]);

        let last = select_context(&entries, 3, &state, ContextPolicy::Symmetric, 10).unwrap();
        assert_eq!(indices(&last.before), vec![0, 1, 2]);
        assert!(last.after.is_empty());
        assert!(last.next.is_none());
    }

    #[test]
    fn test_window_bounds_hold_for_every_index() {
        let entries = entries(25);
        let mut state = TranslationState::default();
        for i in (0..25).step_by(2) {
            state.set(i, TranslationCell::Translated(format!("t{}", i)));
        }

        for policy in [ContextPolicy::Symmetric, ContextPolicy::TrailingTranslations] {
            for index in 0..entries.len() {
                let ctx = select_context(&entries, index, &state, policy, 10).unwrap();
                assert!(ctx.before.len() <= 10);
                assert!(ctx.after.len() <= 10);
                assert!(ctx.before.iter().all(|c| c.index < index));
                assert!(ctx.after.iter().all(|c| c.index > index && c.index < entries.len()));
            }
        }
    }

    #[test]
    fn test_trailing_translations_policy() {
        let entries = entries(8);
        let mut state = TranslationState::default();
        state.set(1, TranslationCell::Translated("uno".to_string()));
        state.set(2, TranslationCell::Merged);
        state.set(3, TranslationCell::Failed);
        state.set(6, TranslationCell::Translated("seis".to_string()));

        let ctx = select_context(&entries, 4, &state, ContextPolicy::TrailingTranslations, 10).unwrap();

        assert_eq!(indices(&ctx.before), vec![1]);
        assert_eq!(ctx.before[0].translation.as_deref(), Some("uno"));
        assert_eq!(indices(&ctx.after), vec![5, 7]);
    }

    #[test]
    fn test_unbounded_window() {
        let entries = entries(3);
        let state = TranslationState::default();
        for policy in [ContextPolicy::Symmetric, ContextPolicy::TrailingTranslations] {
            let ctx = select_context(&entries, 1, &state, policy, usize::MAX).unwrap();
            assert_eq!(indices(&ctx.after), vec![2]);
            if policy == ContextPolicy::Symmetric {
                assert_eq!(indices(&ctx.before), vec![0]);
            }
        }
    }

    #[test]
    fn test_out_of_range_index() {
        let entries = entries(2);
        assert!(select_context(&entries, 2, &TranslationState::default(), ContextPolicy::Symmetric, 10).is_none());
    }
}
