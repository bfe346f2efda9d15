//! Transcript assembly: finalized segments plus an ephemeral trailing partial.
//!
//! The recognizer emits two kinds of text:
//! - *final segments*, which are permanent and never revised
//! - *partials*, which preview the in-progress segment and are superseded by
//!   the next event
//!
//! Only finalized text is ever persisted. The partial exists purely so live
//! observers can render something before the current segment settles.

/// Ordered finalized segments with an optional trailing partial.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    finalized: Vec<String>,
    partial: Option<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized segment. Finalized text is never revised.
    pub fn push_final(&mut self, text: impl Into<String>) {
        self.finalized.push(text.into());
    }

    /// Replace the trailing partial preview.
    pub fn set_partial(&mut self, text: impl Into<String>) {
        self.partial = Some(text.into());
    }

    /// Drop the trailing partial (a final segment has settled it).
    pub fn clear_partial(&mut self) {
        self.partial = None;
    }

    /// The authoritative text: finalized segments joined by single spaces, trimmed.
    ///
    /// This is the only form that may be persisted to the cache at resolution.
    pub fn finalized_text(&self) -> String {
        self.finalized.join(" ").trim().to_owned()
    }

    /// The display text: finalized segments with the partial appended as one
    /// more space-joined trailing segment, trimmed.
    pub fn rendered_text(&self) -> String {
        match &self.partial {
            Some(partial) => {
                let mut text = self.finalized.join(" ");
                text.push(' ');
                text.push_str(partial);
                text.trim().to_owned()
            }
            None => self.finalized_text(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.finalized.is_empty() && self.partial.is_none()
    }
}
