//! Paragraph type.

use serde::{Deserialize, Serialize};

/// A paragraph of text: one visual line of non-tabular text on a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Text content
    pub text: String,

    /// Dominant font size in points (0 when unknown)
    pub font_size: f32,
}

impl Paragraph {
    /// Create a paragraph with plain text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: 0.0,
        }
    }

    /// Set the font size and return self.
    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    /// Get plain text content of the paragraph.
    pub fn plain_text(&self) -> &str {
        &self.text
    }

    /// Check if the paragraph is empty.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
