//! Display log of the onboarding chat.
//!
//! The transcript is presentation only; flow decisions never read it.

use serde::Serialize;

/// One chat bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptEntry {
    Question { text: String },
    Answer { text: String },
    Clarification { text: String },
}

impl TranscriptEntry {
    pub fn text(&self) -> &str {
        match self {
            Self::Question { text } | Self::Answer { text } | Self::Clarification { text } => text,
        }
    }

    pub fn is_clarification(&self) -> bool {
        matches!(self, Self::Clarification { .. })
    }
}

/// Append-only sequence of chat bubbles.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn push_question(&mut self, text: impl Into<String>) {
        self.entries.push(TranscriptEntry::Question { text: text.into() });
    }

    pub fn push_answer(&mut self, text: impl Into<String>) {
        self.entries.push(TranscriptEntry::Answer { text: text.into() });
    }

    pub fn push_clarification(&mut self, text: impl Into<String>) {
        self.entries
            .push(TranscriptEntry::Clarification { text: text.into() });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of clarification bubbles so far.
    pub fn clarification_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_clarification()).count()
    }

    /// Drop every entry. Only the completed search clears the chat.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
