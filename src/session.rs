//! Session-scoped review state.
//!
//! A [`Session`] owns the loaded entries together with everything learned about
//! them while the file stays loaded. Loading another file replaces the entries
//! and discards every translation.

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::subtitle::SubtitleEntry;
use crate::translate::response::ParsedReply;

/// What is known about one entry's translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationCell {
    Translated(String),
    /// Covered by the translation of a preceding entry
    Merged,
    /// The request for this entry failed
    Failed,
}

/// Translations keyed by zero-based entry position. Absent means untranslated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationState {
    cells: BTreeMap<usize, TranslationCell>,
}

impl TranslationState {
    pub fn get(&self, index: usize) -> Option<&TranslationCell> {
        self.cells.get(&index)
    }

    pub fn set(&mut self, index: usize, cell: TranslationCell) {
        self.cells.insert(index, cell);
    }

    /// Translated text at `index`, if that entry holds one
    pub fn translated_text(&self, index: usize) -> Option<&str> {
        match self.cells.get(&index) {
            Some(TranslationCell::Translated(text)) => Some(text),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &TranslationCell)> {
        self.cells.iter().map(|(idx, cell)| (*idx, cell))
    }
}

/// Result of one translation request, tagged with the load it belongs to
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub index: usize,
    pub generation: u64,
    pub result: OutcomeKind,
}

#[derive(Debug, Clone)]
pub enum OutcomeKind {
    /// The endpoint answered; the body has already been parsed
    Replied(ParsedReply),
    /// Transport error, non-success status, or unreadable body
    Failed(String),
}

/// Review state for one loaded subtitle file
#[derive(Debug, Default)]
pub struct Session {
    entries: Vec<SubtitleEntry>,
    translations: TranslationState,
    loading: Option<usize>,
    generation: u64,
}

impl Session {
    pub fn new(entries: Vec<SubtitleEntry>) -> Self {
        let mut session = Self::default();
        session.load(entries);
        session
    }

    /// Replace the entries wholesale and discard all translations
    pub fn load(&mut self, entries: Vec<SubtitleEntry>) {
        self.generation += 1;
        if !self.translations.is_empty() {
            info!("Discarding {} translations from the previous file", self.translations.len());
        }
        self.entries = entries;
        self.translations = TranslationState::default();
        self.loading = None;
    }

    pub fn entries(&self) -> &[SubtitleEntry] {
        &self.entries
    }

    pub fn translations(&self) -> &TranslationState {
        &self.translations
    }

    /// Index currently shown as loading (the most recent click)
    pub fn loading(&self) -> Option<usize> {
        self.loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record a click on `index`; the loading indicator moves to it
    pub fn begin(&mut self, index: usize) {
        self.loading = Some(index);
    }

    /// Apply a finished request to the translation state.
    ///
    /// Returns the indices that were written. Outcomes from an earlier load are
    /// dropped.
    pub fn reconcile(&mut self, outcome: RequestOutcome) -> Vec<usize> {
        if outcome.generation != self.generation {
            debug!(
                "Dropping response for row {} from an earlier load (generation {} != {})",
                outcome.index + 1,
                outcome.generation,
                self.generation
            );
            return Vec::new();
        }

        if self.loading == Some(outcome.index) {
            self.loading = None;
        }

        if outcome.index >= self.entries.len() {
            warn!("Response for row {} is outside the table", outcome.index + 1);
            return Vec::new();
        }

        match outcome.result {
            OutcomeKind::Replied(parsed) => self.apply_reply(outcome.index, parsed),
            OutcomeKind::Failed(reason) => {
                warn!("Translation of row {} failed: {}", outcome.index + 1, reason);
                self.translations.set(outcome.index, TranslationCell::Failed);
                vec![outcome.index]
            }
        }
    }

    fn apply_reply(&mut self, index: usize, parsed: ParsedReply) -> Vec<usize> {
        let (translation, covered) = parsed.into_parts();

        // Covered spans never run past the last entry
        let last = index.saturating_add(covered.max(1)).min(self.entries.len());
        if covered > self.entries.len() - index {
            debug!(
                "Reply covers {} entries from row {}, clamped to {}",
                covered,
                index + 1,
                last - index
            );
        }

        self.translations.set(index, TranslationCell::Translated(translation));
        for merged in index + 1..last {
            self.translations.set(merged, TranslationCell::Merged);
        }

        (index..last).collect()
    }
}
