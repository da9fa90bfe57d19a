//! Concatenation of translated results with interleaved markers and anchors.

use std::mem;

use super::TranslatorResult;
use crate::model::{char_len, Marker};

#[derive(Debug, Clone)]
enum Item {
    Text(Box<dyn TranslatorResult>),
    Marker(Marker),
    Anchor(String),
}

/// Several translated results read as one, keeping markers and anchors in
/// position between them.
///
/// Markers and anchors are released through [`TranslatorResult::take_pending`]
/// once the text before them has been consumed.
#[derive(Debug, Clone, Default)]
pub struct AggregatedResult {
    items: Vec<Item>,
    current: usize,
    pending_markers: Vec<Marker>,
    pending_anchors: Vec<String>,
}

impl AggregatedResult {
    /// Create an empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a translated result.
    pub fn add_result(&mut self, result: Box<dyn TranslatorResult>) {
        self.items.push(Item::Text(result));
    }

    /// Append a marker.
    pub fn add_marker(&mut self, marker: Marker) {
        self.items.push(Item::Marker(marker));
    }

    /// Append an anchor.
    pub fn add_anchor(&mut self, anchor: String) {
        self.items.push(Item::Anchor(anchor));
    }

    /// Check if nothing was added.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Move past exhausted results, releasing markers and anchors on the way.
    fn advance(&mut self) {
        while let Some(item) = self.items.get(self.current) {
            match item {
                Item::Marker(m) => self.pending_markers.push(m.clone()),
                Item::Anchor(a) => self.pending_anchors.push(a.clone()),
                Item::Text(r) if !r.has_next() => {}
                Item::Text(_) => break,
            }
            self.current += 1;
        }
    }

    fn texts(&self) -> impl Iterator<Item = &dyn TranslatorResult> + '_ {
        self.items[self.current.min(self.items.len())..]
            .iter()
            .filter_map(|item| match item {
                Item::Text(r) => Some(r.as_ref()),
                _ => None,
            })
    }
}

impl TranslatorResult for AggregatedResult {
    fn next_row(&mut self, limit: usize, force: bool) -> String {
        let mut row = String::new();
        loop {
            self.advance();
            let used = char_len(&row);
            let first = row.is_empty();
            let Some(Item::Text(result)) = self.items.get_mut(self.current) else {
                break;
            };
            if used >= limit && !(force && first) {
                break;
            }
            let chunk = result.next_row(limit.saturating_sub(used), force && first);
            if chunk.is_empty() {
                break;
            }
            row.push_str(&chunk);
            if result.has_next() {
                break;
            }
        }
        if !self.has_next() {
            self.advance();
        }
        row
    }

    fn has_next(&self) -> bool {
        self.texts().any(|r| r.has_next())
    }

    fn count_remaining(&self) -> usize {
        self.texts().map(|r| r.count_remaining()).sum()
    }

    fn translated_remainder(&self) -> String {
        self.texts().map(|r| r.translated_remainder()).collect()
    }

    fn forced_break_count(&self) -> Option<usize> {
        self.items
            .iter()
            .filter_map(|item| match item {
                Item::Text(r) => r.forced_break_count(),
                _ => None,
            })
            .reduce(|a, b| a + b)
    }

    fn take_pending(&mut self) -> (Vec<Marker>, Vec<String>) {
        (
            mem::take(&mut self.pending_markers),
            mem::take(&mut self.pending_anchors),
        )
    }

    fn box_clone(&self) -> Box<dyn TranslatorResult> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::PlainResult;

    fn text(s: &str) -> Box<dyn TranslatorResult> {
        Box::new(PlainResult::new(s, true))
    }

    #[test]
    fn test_concatenates_results() {
        let mut agg = AggregatedResult::new();
        agg.add_result(text("Hello "));
        agg.add_result(text("world"));
        assert_eq!(agg.count_remaining(), 11);
        assert_eq!(agg.next_row(20, false), "Hello world");
        assert!(!agg.has_next());
    }

    #[test]
    fn test_markers_released_in_position() {
        let mut agg = AggregatedResult::new();
        agg.add_marker(Marker::new("before", "1"));
        agg.add_result(text("one two"));
        agg.add_anchor("after".into());
        agg.add_result(text("three"));

        assert_eq!(agg.next_row(4, true), "one");
        let (markers, anchors) = agg.take_pending();
        assert_eq!(markers.len(), 1);
        assert!(anchors.is_empty());

        assert_eq!(agg.next_row(20, true), "twothree");
        let (markers, anchors) = agg.take_pending();
        assert!(markers.is_empty());
        assert_eq!(anchors, vec!["after".to_string()]);
    }

    #[test]
    fn test_trailing_markers_released_when_done() {
        let mut agg = AggregatedResult::new();
        agg.add_result(text("ab"));
        agg.add_marker(Marker::new("end", "x"));
        assert_eq!(agg.next_row(10, false), "ab");
        assert_eq!(agg.take_pending().0.len(), 1);
    }

    #[test]
    fn test_empty_aggregate() {
        let mut agg = AggregatedResult::new();
        assert!(agg.is_empty());
        assert!(!agg.has_next());
        assert_eq!(agg.next_row(5, true), "");
        assert_eq!(agg.forced_break_count(), None);
    }
}
