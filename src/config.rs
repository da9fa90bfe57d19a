//! Formatter options and configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Options shared by every layout component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// Keep capital letters; when false, text is lower-cased before translation
    pub mark_capital_letters: bool,

    /// Character used for indents, padding and margins
    pub space_char: char,

    /// Text rendered for a page reference that is not resolved yet
    pub unresolved_placeholder: String,

    /// Maximum number of pagination passes before giving up
    pub max_passes: usize,
}

impl FormatterConfig {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep or fold capital letters.
    pub fn with_capital_letters(mut self, mark: bool) -> Self {
        self.mark_capital_letters = mark;
        self
    }

    /// Set the space character.
    pub fn with_space_char(mut self, space: char) -> Self {
        self.space_char = space;
        self
    }

    /// Set the placeholder for unresolved references.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.unresolved_placeholder = placeholder.into();
        self
    }

    /// Set the maximum number of passes.
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes.max(1);
        self
    }

    /// Case-fold text unless capitals are marked.
    pub fn fold_case(&self, text: &str) -> String {
        if self.mark_capital_letters {
            text.to_string()
        } else {
            text.to_lowercase()
        }
    }

    /// Parse options from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load options from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            mark_capital_letters: true,
            space_char: ' ',
            unresolved_placeholder: "??".to_string(),
            max_passes: 8,
        }
    }
}
