//! Translator interface consumed by the row builder.
//!
//! A [`Translator`] turns a [`TranslationRequest`] into a chunked
//! [`TranslatorResult`] from which the row builder pulls one row's worth of
//! output at a time. The crate ships [`PlainTranslator`], which passes text
//! through unchanged and breaks rows at whitespace and hyphens.

mod aggregate;
mod plain;

pub use aggregate::AggregatedResult;
pub use plain::{PlainResult, PlainTranslator};

use std::fmt;

use crate::error::Result;
use crate::model::Marker;

/// A request to translate a piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationRequest {
    /// Text to translate
    pub text: String,
    /// Locale of the text
    pub locale: Option<String>,
    /// Whether hyphenation is allowed
    pub hyphenate: bool,
    /// Opaque style attributes
    pub attributes: Option<String>,
}

impl TranslationRequest {
    /// Create a request for plain text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set the locale.
    pub fn with_locale(mut self, locale: Option<String>) -> Self {
        self.locale = locale;
        self
    }

    /// Allow or forbid hyphenation.
    pub fn with_hyphenate(mut self, hyphenate: bool) -> Self {
        self.hyphenate = hyphenate;
        self
    }

    /// Set the attributes.
    pub fn with_attributes(mut self, attributes: Option<String>) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Translated text, consumed one row chunk at a time.
pub trait TranslatorResult: fmt::Debug {
    /// Take the next chunk of at most `limit` characters.
    ///
    /// When nothing fits and `force` is set, the chunk is broken mid-word so
    /// that the caller always makes progress. Without `force` an empty
    /// string is returned instead.
    fn next_row(&mut self, limit: usize, force: bool) -> String;

    /// Check if there is output left.
    fn has_next(&self) -> bool;

    /// Number of characters left.
    fn count_remaining(&self) -> usize;

    /// Everything left, without consuming it.
    fn translated_remainder(&self) -> String;

    /// Number of forced (mid-word) breaks, if the result tracks them.
    fn forced_break_count(&self) -> Option<usize> {
        None
    }

    /// Take markers and anchors passed since the last call.
    fn take_pending(&mut self) -> (Vec<Marker>, Vec<String>) {
        (Vec::new(), Vec::new())
    }

    /// Independent copy of this result and its position.
    fn box_clone(&self) -> Box<dyn TranslatorResult>;
}

impl Clone for Box<dyn TranslatorResult> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Translates text into output cells.
pub trait Translator: fmt::Debug {
    /// Translate a request.
    fn translate(&self, request: &TranslationRequest) -> Result<Box<dyn TranslatorResult>>;

    /// Translate a request and return all of it at once.
    fn translate_whole(&self, request: &TranslationRequest) -> Result<String> {
        Ok(self.translate(request)?.translated_remainder())
    }
}
