//! Pass-through translator with whitespace and hyphen line breaking.

use super::{TranslationRequest, Translator, TranslatorResult};
use crate::error::Result;

const SOFT_HYPHEN: char = '\u{00AD}';

/// Translator that keeps text as-is and only performs row chunking.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTranslator;

impl PlainTranslator {
    /// Create a plain translator.
    pub fn new() -> Self {
        Self
    }
}

impl Translator for PlainTranslator {
    fn translate(&self, request: &TranslationRequest) -> Result<Box<dyn TranslatorResult>> {
        Ok(Box::new(PlainResult::new(&request.text, request.hyphenate)))
    }
}

/// Chunked plain text.
#[derive(Debug, Clone)]
pub struct PlainResult {
    chars: Vec<char>,
    pos: usize,
    hyphenate: bool,
    forced_breaks: usize,
}

impl PlainResult {
    /// Create a result over the given text.
    ///
    /// Soft hyphens are dropped up front when hyphenation is not allowed.
    pub fn new(text: &str, hyphenate: bool) -> Self {
        let chars = if hyphenate {
            text.chars().collect()
        } else {
            text.chars().filter(|&c| c != SOFT_HYPHEN).collect()
        };
        Self {
            chars,
            pos: 0,
            hyphenate,
            forced_breaks: 0,
        }
    }

    fn skip_whitespace(&self, mut i: usize) -> usize {
        while i < self.chars.len() && self.chars[i].is_whitespace() {
            i += 1;
        }
        i
    }

    /// Find the last break opportunity within `limit` characters.
    ///
    /// Returns (end of chunk, resume position, append a hyphen).
    fn find_break(&self, limit: usize) -> Option<(usize, usize, bool)> {
        let end = (self.pos + limit).min(self.chars.len());
        for i in (self.pos + 1..=end).rev() {
            if i < self.chars.len() && self.chars[i].is_whitespace() {
                return Some((i, self.skip_whitespace(i), false));
            }
            let before = self.chars[i - 1];
            if before == '-' {
                return Some((i, self.skip_whitespace(i), false));
            }
            if self.hyphenate && before == SOFT_HYPHEN {
                return Some((i - 1, i, true));
            }
        }
        None
    }

    fn chunk(&self, start: usize, mut end: usize) -> String {
        while end > start && self.chars[end - 1].is_whitespace() {
            end -= 1;
        }
        self.chars[start..end].iter().collect()
    }
}

impl TranslatorResult for PlainResult {
    fn next_row(&mut self, limit: usize, force: bool) -> String {
        if !self.has_next() {
            return String::new();
        }
        let remaining = self.count_remaining();
        if remaining <= limit {
            let chunk: String = self.chars[self.pos..].iter().collect();
            self.pos = self.chars.len();
            return chunk;
        }
        if let Some((end, resume, hyphen)) = self.find_break(limit) {
            let mut chunk = self.chunk(self.pos, end);
            if hyphen {
                chunk.push('-');
            }
            self.pos = resume;
            return chunk;
        }
        if force {
            let take = limit.max(1).min(remaining);
            let chunk: String = self.chars[self.pos..self.pos + take].iter().collect();
            self.pos += take;
            self.forced_breaks += 1;
            return chunk;
        }
        String::new()
    }

    fn has_next(&self) -> bool {
        self.pos < self.chars.len()
    }

    fn count_remaining(&self) -> usize {
        self.chars.len() - self.pos
    }

    fn translated_remainder(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }

    fn forced_break_count(&self) -> Option<usize> {
        Some(self.forced_breaks)
    }

    fn box_clone(&self) -> Box<dyn TranslatorResult> {
        Box::new(self.clone())
    }
}
