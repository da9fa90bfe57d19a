//! Row-level types: finished output lines and their builder.

use serde::{Deserialize, Serialize};

use super::Marker;

/// Horizontal alignment of a row's text within the flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Left-aligned (default)
    #[default]
    Left,
    /// Centered
    Center,
    /// Right-aligned
    Right,
}

impl Alignment {
    /// Offset from the left for the given amount of free space.
    pub fn offset(&self, space: usize) -> usize {
        match self {
            Alignment::Left => 0,
            Alignment::Center => space / 2,
            Alignment::Right => space,
        }
    }
}

/// A rendered margin: its content and whether it is whitespace only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginProperties {
    content: String,
    space_only: bool,
}

impl MarginProperties {
    /// Create margin properties.
    pub fn new(content: impl Into<String>, space_only: bool) -> Self {
        Self {
            content: content.into(),
            space_only,
        }
    }

    /// An empty, whitespace-only margin.
    pub fn empty() -> Self {
        Self::new("", true)
    }

    /// Margin content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// True if the margin holds nothing but the space character.
    pub fn is_space_only(&self) -> bool {
        self.space_only
    }

    /// Margin width in characters.
    pub fn len(&self) -> usize {
        char_len(&self.content)
    }

    /// True if the margin has zero width.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// This margin extended by `indent` space characters.
    pub fn indented(&self, space: char, indent: usize) -> Self {
        let mut content = self.content.clone();
        content.extend(std::iter::repeat(space).take(indent));
        Self::new(content, self.space_only)
    }
}

impl Default for MarginProperties {
    fn default() -> Self {
        Self::empty()
    }
}

/// One finished line of output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    text: String,
    left_margin: MarginProperties,
    right_margin: MarginProperties,
    alignment: Alignment,
    row_spacing: Option<f32>,
    adjusted_for_margin: bool,
    markers: Vec<Marker>,
    anchors: Vec<String>,
    leader_space: usize,
}

impl Row {
    /// An empty row with no margins.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a row builder with the given text.
    pub fn builder(text: impl Into<String>) -> RowBuilder {
        RowBuilder::new(text)
    }

    /// Row text, margins excluded.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text width in characters.
    pub fn width(&self) -> usize {
        char_len(&self.text)
    }

    /// Left margin.
    pub fn left_margin(&self) -> &MarginProperties {
        &self.left_margin
    }

    /// Right margin.
    pub fn right_margin(&self) -> &MarginProperties {
        &self.right_margin
    }

    /// Alignment of the text between the margins.
    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// Row spacing multiplier, if the row overrides the default.
    pub fn row_spacing(&self) -> Option<f32> {
        self.row_spacing
    }

    /// Height of this row given the default spacing.
    pub fn height(&self, default_spacing: f32) -> f32 {
        self.row_spacing.unwrap_or(default_spacing).max(1.0)
    }

    /// True if the text already accounts for the margins.
    pub fn is_adjusted_for_margin(&self) -> bool {
        self.adjusted_for_margin
    }

    /// Markers attached to the row, in document order.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Anchors attached to the row, in document order.
    pub fn anchors(&self) -> &[String] {
        &self.anchors
    }

    /// Number of characters produced by leader fills.
    pub fn leader_space(&self) -> usize {
        self.leader_space
    }

    /// Total width: margins plus text.
    pub fn total_width(&self) -> usize {
        self.left_margin.len() + self.width() + self.right_margin.len()
    }

    /// This row with markers and anchors placed before its own.
    pub fn with_leading(mut self, markers: Vec<Marker>, anchors: Vec<String>) -> Self {
        if !markers.is_empty() {
            self.markers.splice(0..0, markers);
        }
        if !anchors.is_empty() {
            self.anchors.splice(0..0, anchors);
        }
        self
    }

    /// The row as a full line: left margin, aligned text and right margin.
    pub fn render(&self, flow_width: usize, space: char) -> String {
        let used = self.total_width();
        let free = flow_width.saturating_sub(used);
        let offset = self.alignment.offset(free);
        let mut line = String::with_capacity(flow_width);
        line.push_str(self.left_margin.content());
        line.extend(std::iter::repeat(space).take(offset));
        line.push_str(&self.text);
        if !self.right_margin.is_empty() {
            line.extend(std::iter::repeat(space).take(free - offset));
            line.push_str(self.right_margin.content());
        }
        line
    }
}

/// Mutable accumulator for a row in progress.
#[derive(Debug, Clone, Default)]
pub struct RowBuilder {
    row: Row,
}

impl RowBuilder {
    /// Create a builder with the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            row: Row {
                text: text.into(),
                ..Row::default()
            },
        }
    }

    /// Set the left margin.
    pub fn left_margin(mut self, margin: MarginProperties) -> Self {
        self.row.left_margin = margin;
        self
    }

    /// Set the right margin.
    pub fn right_margin(mut self, margin: MarginProperties) -> Self {
        self.row.right_margin = margin;
        self
    }

    /// Set the alignment.
    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.row.alignment = alignment;
        self
    }

    /// Set the row spacing multiplier.
    pub fn row_spacing(mut self, spacing: Option<f32>) -> Self {
        self.row.row_spacing = spacing;
        self
    }

    /// Mark the text as already adjusted for the margins.
    pub fn adjusted_for_margin(mut self, adjusted: bool) -> Self {
        self.row.adjusted_for_margin = adjusted;
        self
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.row.text
    }

    /// Replace the text.
    pub fn set_text(&mut self, text: String) {
        self.row.text = text;
    }

    /// Current left margin.
    pub fn current_left_margin(&self) -> &MarginProperties {
        &self.row.left_margin
    }

    /// Current leader space count.
    pub fn leader_space(&self) -> usize {
        self.row.leader_space
    }

    /// Replace the leader space count.
    pub fn set_leader_space(&mut self, value: usize) {
        self.row.leader_space = value;
    }

    /// Append a marker.
    pub fn add_marker(&mut self, marker: Marker) {
        self.row.markers.push(marker);
    }

    /// Append markers.
    pub fn add_markers(&mut self, markers: impl IntoIterator<Item = Marker>) {
        self.row.markers.extend(markers);
    }

    /// Append an anchor.
    pub fn add_anchor(&mut self, anchor: String) {
        self.row.anchors.push(anchor);
    }

    /// Append anchors.
    pub fn add_anchors(&mut self, anchors: impl IntoIterator<Item = String>) {
        self.row.anchors.extend(anchors);
    }

    /// Finish the row.
    pub fn build(self) -> Row {
        self.row
    }
}

/// Length in characters.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Repeat `pattern` until `len` characters are produced.
///
/// An empty pattern yields an empty string.
pub fn fill(pattern: &str, len: usize) -> String {
    if pattern.is_empty() {
        return String::new();
    }
    pattern.chars().cycle().take(len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill() {
        assert_eq!(fill(".", 4), "....");
        assert_eq!(fill("-=", 5), "-=-=-");
        assert_eq!(fill("", 5), "");
        assert_eq!(fill("ab", 0), "");
    }

    #[test]
    fn test_alignment_offset() {
        assert_eq!(Alignment::Left.offset(6), 0);
        assert_eq!(Alignment::Center.offset(7), 3);
        assert_eq!(Alignment::Right.offset(6), 6);
    }

    #[test]
    fn test_row_builder() {
        let mut builder = Row::builder("abc")
            .left_margin(MarginProperties::new("  ", true))
            .alignment(Alignment::Right)
            .row_spacing(Some(2.0));
        builder.add_marker(Marker::new("m", "1"));
        builder.add_anchor("a".into());
        let row = builder.build();

        assert_eq!(row.text(), "abc");
        assert_eq!(row.total_width(), 5);
        assert_eq!(row.height(1.0), 2.0);
        assert_eq!(row.markers().len(), 1);
        assert_eq!(row.anchors(), ["a".to_string()]);
    }

    #[test]
    fn test_row_with_leading() {
        let mut builder = Row::builder("x");
        builder.add_anchor("own".into());
        let row = builder
            .build()
            .with_leading(vec![Marker::new("g", "1")], vec!["group".into()]);
        assert_eq!(row.anchors(), ["group".to_string(), "own".to_string()]);
        assert_eq!(row.markers()[0].name, "g");
    }

    #[test]
    fn test_row_render() {
        let row = Row::builder("ab")
            .left_margin(MarginProperties::new(":", false))
            .right_margin(MarginProperties::new(":", false))
            .alignment(Alignment::Center)
            .build();
        assert_eq!(row.render(8, ' '), ":  ab  :");
        assert_eq!(row.render(8, ' ').chars().count(), 8);
    }
}
