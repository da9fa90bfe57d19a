//! Segment-level types: the smallest units of block content.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::context::Context;

/// A unit of block content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    /// A run of text to translate
    Text {
        /// The text content
        text: String,
        /// Translation properties
        #[serde(default)]
        properties: TextProperties,
        /// Opaque style attributes forwarded to the translator
        #[serde(default)]
        attributes: Option<String>,
    },

    /// A fill pattern aligning the following content at a column
    Leader(Leader),

    /// The page number of an anchor, resolved through the cross-reference store
    Reference {
        /// Anchor identifier
        ref_id: String,
        /// How to format the number
        #[serde(default)]
        numeral_style: NumeralStyle,
    },

    /// A marker attached to the row (or page) where it lands
    Marker(Marker),

    /// An anchor attached to the row where it lands
    Anchor {
        /// Anchor identifier
        id: String,
    },

    /// An expression rendered against the layout context
    Evaluate {
        /// The expression
        expression: Expression,
        /// Translation properties
        #[serde(default)]
        properties: TextProperties,
    },

    /// A forced line break
    NewLine,
}

impl Segment {
    /// Create a text segment with default properties.
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text {
            text: text.into(),
            properties: TextProperties::default(),
            attributes: None,
        }
    }

    /// Create a leader segment.
    pub fn leader(pattern: impl Into<String>, position: Position, alignment: LeaderAlignment) -> Self {
        Segment::Leader(Leader {
            pattern: pattern.into(),
            position,
            alignment,
        })
    }

    /// Create a page number reference with decimal numerals.
    pub fn reference(ref_id: impl Into<String>) -> Self {
        Segment::Reference {
            ref_id: ref_id.into(),
            numeral_style: NumeralStyle::Decimal,
        }
    }

    /// Create a marker segment.
    pub fn marker(name: impl Into<String>, value: impl Into<String>) -> Self {
        Segment::Marker(Marker::new(name, value))
    }

    /// Create an anchor segment.
    pub fn anchor(id: impl Into<String>) -> Self {
        Segment::Anchor { id: id.into() }
    }

    /// Create an evaluate segment.
    pub fn evaluate(expression: impl Into<String>) -> Self {
        Segment::Evaluate {
            expression: Expression::new(expression),
            properties: TextProperties::default(),
        }
    }

    /// Create a forced line break.
    pub fn new_line() -> Self {
        Segment::NewLine
    }

    /// Check if processing this segment could start or extend a row.
    ///
    /// Markers, anchors, empty text and empty evaluations never do.
    pub fn could_produce_row(&self, context: &Context) -> bool {
        match self {
            Segment::Marker(_) | Segment::Anchor { .. } => false,
            Segment::Evaluate { expression, .. } => !expression.render(context).is_empty(),
            Segment::Text { text, .. } => !text.is_empty(),
            Segment::Leader(_) | Segment::Reference { .. } | Segment::NewLine => true,
        }
    }
}

/// Properties controlling how a text segment is translated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextProperties {
    /// Locale of the text (e.g. "en-US")
    pub locale: Option<String>,

    /// Whether the translator may hyphenate
    pub hyphenate: bool,
}

impl Default for TextProperties {
    fn default() -> Self {
        Self {
            locale: None,
            hyphenate: true,
        }
    }
}

/// A tab-like fill run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leader {
    /// Fill pattern, repeated (and truncated) to the fill length
    pub pattern: String,

    /// Target column
    pub position: Position,

    /// Alignment of the content following the leader at the target column
    #[serde(default)]
    pub alignment: LeaderAlignment,
}

impl Leader {
    /// Target column for a row of the given width.
    pub fn target_column(&self, width: usize) -> usize {
        self.position.make_absolute(width)
    }
}

/// A column position, absolute or relative to the available width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Column counted from the start of the flow
    Absolute(usize),
    /// Fraction (0.0-1.0) of the available width
    Relative(f64),
}

impl Position {
    /// Resolve to an absolute column.
    pub fn make_absolute(&self, width: usize) -> usize {
        match *self {
            Position::Absolute(col) => col,
            Position::Relative(fraction) => (fraction.clamp(0.0, 1.0) * width as f64) as usize,
        }
    }
}

/// Where content after a leader sits relative to the leader's target column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderAlignment {
    /// Content starts at the target column
    #[default]
    Left,
    /// Content is centered on the target column
    Center,
    /// Content ends at the target column
    Right,
}

impl LeaderAlignment {
    /// Columns to pull the leader back by for content of the given length.
    pub fn adjustment(&self, content_len: usize) -> usize {
        match self {
            LeaderAlignment::Left => 0,
            LeaderAlignment::Center => content_len / 2,
            LeaderAlignment::Right => content_len,
        }
    }
}

/// Numeral style for page number references and fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumeralStyle {
    /// 1, 2, 3
    #[default]
    Decimal,
    /// I, II, III
    UpperRoman,
    /// i, ii, iii
    LowerRoman,
    /// A, B, ..., Z, AA
    UpperAlpha,
    /// a, b, ..., z, aa
    LowerAlpha,
}

impl NumeralStyle {
    /// Format a number.
    pub fn format(&self, value: u32) -> String {
        match self {
            NumeralStyle::Decimal => value.to_string(),
            NumeralStyle::UpperRoman => to_roman(value),
            NumeralStyle::LowerRoman => to_roman(value).to_lowercase(),
            NumeralStyle::UpperAlpha => to_alpha(value),
            NumeralStyle::LowerAlpha => to_alpha(value).to_lowercase(),
        }
    }
}

/// Convert number to Roman numerals.
fn to_roman(mut num: u32) -> String {
    let numerals = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    let mut result = String::new();
    for (value, symbol) in numerals {
        while num >= value {
            result.push_str(symbol);
            num -= value;
        }
    }
    result
}

/// Bijective base-26: 1 = A, 26 = Z, 27 = AA.
fn to_alpha(mut num: u32) -> String {
    let mut letters = Vec::new();
    while num > 0 {
        num -= 1;
        letters.push((b'A' + (num % 26) as u8) as char);
        num /= 26;
    }
    letters.iter().rev().collect()
}

/// A named value attached to the row or page where it lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// Marker class
    pub name: String,
    /// Marker value
    pub value: String,
}

impl Marker {
    /// Create a marker.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A text template whose `{name}` placeholders resolve against a [`Context`].
///
/// Unknown names render as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expression(String);

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_-]*)\}").expect("static pattern"))
}

impl Expression {
    /// Create an expression from its template text.
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// The template text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render the expression.
    pub fn render(&self, context: &Context) -> String {
        placeholder_regex()
            .replace_all(&self.0, |caps: &regex::Captures<'_>| {
                context.lookup(&caps[1]).unwrap_or_default()
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeral_styles() {
        assert_eq!(NumeralStyle::Decimal.format(42), "42");
        assert_eq!(NumeralStyle::UpperRoman.format(14), "XIV");
        assert_eq!(NumeralStyle::LowerRoman.format(9), "ix");
        assert_eq!(NumeralStyle::UpperAlpha.format(1), "A");
        assert_eq!(NumeralStyle::UpperAlpha.format(27), "AA");
        assert_eq!(NumeralStyle::LowerAlpha.format(26), "z");
    }

    #[test]
    fn test_position_make_absolute() {
        assert_eq!(Position::Absolute(8).make_absolute(20), 8);
        assert_eq!(Position::Relative(0.5).make_absolute(20), 10);
        assert_eq!(Position::Relative(1.0).make_absolute(30), 30);
    }

    #[test]
    fn test_leader_alignment_adjustment() {
        assert_eq!(LeaderAlignment::Left.adjustment(4), 0);
        assert_eq!(LeaderAlignment::Center.adjustment(5), 2);
        assert_eq!(LeaderAlignment::Right.adjustment(4), 4);
    }

    #[test]
    fn test_expression_render() {
        let ctx = Context::new().at_page(3).with_variable("title", "Notes");
        let expr = Expression::new("{title}, page {page}{unknown}");
        assert_eq!(expr.render(&ctx), "Notes, page 3");
        assert_eq!(Expression::new("{nothing}").render(&ctx), "");
    }

    #[test]
    fn test_could_produce_row() {
        let ctx = Context::new();
        assert!(!Segment::marker("m", "v").could_produce_row(&ctx));
        assert!(!Segment::anchor("a").could_produce_row(&ctx));
        assert!(!Segment::text("").could_produce_row(&ctx));
        assert!(!Segment::evaluate("{missing}").could_produce_row(&ctx));
        assert!(Segment::evaluate("{volume}").could_produce_row(&ctx));
        assert!(Segment::new_line().could_produce_row(&ctx));
    }

    #[test]
    fn test_segment_serde_tagged() {
        let json = r#"[{"type":"text","text":"Hi"},{"type":"new_line"},{"type":"anchor","id":"a1"}]"#;
        let segments: Vec<Segment> = serde_json::from_str(json).unwrap();
        assert_eq!(segments[0], Segment::text("Hi"));
        assert_eq!(segments[1], Segment::NewLine);
        assert_eq!(segments[2], Segment::anchor("a1"));
    }
}
