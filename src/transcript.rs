use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryKind {
    /// What the user typed, never the augmented prompt.
    User { text: String },
    /// Formatted model reply. `pending` while the stream is still open.
    Advisor { html: String, pending: bool },
    /// Advisor reply slot replaced by a failure notice.
    Failure { message: String },
    Suggestions { prompts: Vec<String> },
    /// Outcome of a file upload; `count` of zero means nothing usable was found.
    Upload { file_name: String, count: usize, message: String },
    Notice { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EntryKind,
}

/// Append-only log of the visible conversation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: EntryKind) -> usize {
        self.entries.push(Entry {
            at: Utc::now(),
            kind,
        });
        self.entries.len() - 1
    }

    /// Rewrites the entry at `index` in place, keeping its timestamp.
    pub(crate) fn replace(&mut self, index: usize, kind: EntryKind) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.kind = kind;
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn user_turns(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.kind, EntryKind::User { .. }))
            .count()
    }

    pub fn suggestion_blocks(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.kind, EntryKind::Suggestions { .. }))
            .count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }
}
