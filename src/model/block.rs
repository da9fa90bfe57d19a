//! Block-level types: content plus the configuration that frames it.

use serde::{Deserialize, Serialize};

use super::{Alignment, MarginProperties, RowBuilder, Segment};
use crate::context::Context;

/// A unit of document content framed with its own spacing and decoration rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Content segments, in document order
    #[serde(default)]
    pub segments: Vec<Segment>,

    /// Row layout configuration
    #[serde(default)]
    pub layout: RowDataProperties,

    /// Pagination properties
    #[serde(default)]
    pub properties: BlockProperties,
}

impl Block {
    /// Create a block from segments with default configuration.
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            ..Default::default()
        }
    }

    /// Create a block holding a single text segment.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(vec![Segment::text(text)])
    }

    /// Set the row layout configuration.
    pub fn with_layout(mut self, layout: RowDataProperties) -> Self {
        self.layout = layout;
        self
    }

    /// Set the pagination properties.
    pub fn with_properties(mut self, properties: BlockProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Set the block identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.properties.id = Some(id.into());
        self
    }

    /// Check if the segments (or an underline) can produce any row.
    pub fn has_significant_content(&self, context: &Context) -> bool {
        self.segments.iter().any(|s| s.could_produce_row(context)) || self.layout.underline.is_some()
    }

    /// Check if laying out the block yields at least one row, framing included.
    pub fn produces_rows(&self, context: &Context) -> bool {
        self.has_significant_content(context) || self.layout.has_framing()
    }

    /// Check if the block belongs in the page area rather than the flow.
    pub fn is_page_area(&self) -> bool {
        self.properties.placement == Placement::PageArea
    }
}

/// Which side of the flow a margin sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Left side
    Left,
    /// Right side
    Right,
}

/// One nesting level of a margin: outer spacing, a border string and inner spacing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginComponent {
    /// Border text (may be empty)
    pub border: String,
    /// Spaces outside the border
    pub outer_space: usize,
    /// Spaces inside the border
    pub inner_space: usize,
}

/// A margin made of nested components, outermost first.
///
/// The last component belongs to the block itself; the others belong to
/// enclosing blocks and make up the parent margin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Margin {
    /// Components, outermost first
    pub components: Vec<MarginComponent>,
}

impl Margin {
    /// A margin of plain spaces owned by the block.
    pub fn spaces(count: usize) -> Self {
        Self {
            components: vec![MarginComponent {
                border: String::new(),
                outer_space: count,
                inner_space: 0,
            }],
        }
    }

    /// Add an innermost component.
    pub fn nest(mut self, component: MarginComponent) -> Self {
        self.components.push(component);
        self
    }

    /// Build the full (content) margin.
    pub fn build(&self, side: Side, space: char) -> MarginProperties {
        build_components(&self.components, side, space)
    }

    /// Build the parent margin, i.e. without the block's own component.
    pub fn build_parent(&self, side: Side, space: char) -> MarginProperties {
        let parents = match self.components.split_last() {
            Some((_, parents)) => parents,
            None => &[],
        };
        build_components(parents, side, space)
    }
}

fn build_components(components: &[MarginComponent], side: Side, space: char) -> MarginProperties {
    let spaces = |n: usize| std::iter::repeat(space).take(n).collect::<String>();
    let mut content = String::new();
    match side {
        Side::Left => {
            for c in components {
                content.push_str(&spaces(c.outer_space));
                content.push_str(&c.border);
                content.push_str(&spaces(c.inner_space));
            }
        }
        Side::Right => {
            for c in components.iter().rev() {
                content.push_str(&spaces(c.inner_space));
                content.push_str(&c.border);
                content.push_str(&spaces(c.outer_space));
            }
        }
    }
    let space_only = content.chars().all(|ch| ch == space);
    MarginProperties::new(content, space_only)
}

/// A single decoration row: corners around a repeated fill pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleLineDecoration {
    /// Left corner text
    #[serde(default)]
    pub left_corner: String,
    /// Repeated fill pattern
    pub line_pattern: String,
    /// Right corner text
    #[serde(default)]
    pub right_corner: String,
}

impl SingleLineDecoration {
    /// Create a decoration.
    pub fn new(
        left_corner: impl Into<String>,
        line_pattern: impl Into<String>,
        right_corner: impl Into<String>,
    ) -> Self {
        Self {
            left_corner: left_corner.into(),
            line_pattern: line_pattern.into(),
            right_corner: right_corner.into(),
        }
    }
}

/// List item label placed on the first row of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// Label text
    pub label: String,
    /// List style
    #[serde(default)]
    pub style: ListStyle,
}

impl ListItem {
    /// Create a list item.
    pub fn new(label: impl Into<String>, style: ListStyle) -> Self {
        Self {
            label: label.into(),
            style,
        }
    }
}

/// List style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStyle {
    /// Ordered list
    #[default]
    Ol,
    /// Unordered list
    Ul,
    /// Preformatted label, placed at the parent block indent
    Pl,
}

/// Row layout configuration of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowDataProperties {
    /// Left margin
    pub left_margin: Margin,
    /// Right margin
    pub right_margin: Margin,
    /// Indent of rows following a forced or leader break
    pub text_indent: usize,
    /// Indent of the first row
    pub first_line_indent: usize,
    /// Indent of every row
    pub block_indent: usize,
    /// Block indent of the enclosing block
    pub block_indent_parent: usize,
    /// Empty rows before the block, dropped at the top of a page
    pub outer_space_before: usize,
    /// Empty rows before the content, inside decorations
    pub inner_space_before: usize,
    /// Empty rows after the content, inside decorations
    pub inner_space_after: usize,
    /// Empty rows after the block
    pub outer_space_after: usize,
    /// Decoration row before the content
    pub leading_decoration: Option<SingleLineDecoration>,
    /// Decoration row after the content
    pub trailing_decoration: Option<SingleLineDecoration>,
    /// Underline fill pattern for a row after the content
    pub underline: Option<String>,
    /// Text alignment
    pub alignment: Alignment,
    /// Row spacing multiplier (defaults to the layout master's)
    pub row_spacing: Option<f32>,
    /// List item label for the first row
    pub list_item: Option<ListItem>,
}

impl RowDataProperties {
    /// Create default properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set plain space margins on both sides.
    pub fn with_margins(mut self, left: usize, right: usize) -> Self {
        self.left_margin = Margin::spaces(left);
        self.right_margin = Margin::spaces(right);
        self
    }

    /// Set the first line indent.
    pub fn with_first_line_indent(mut self, indent: usize) -> Self {
        self.first_line_indent = indent;
        self
    }

    /// Set the text indent.
    pub fn with_text_indent(mut self, indent: usize) -> Self {
        self.text_indent = indent;
        self
    }

    /// Set the block indent.
    pub fn with_block_indent(mut self, indent: usize) -> Self {
        self.block_indent = indent;
        self
    }

    /// Set outer spacing before and after.
    pub fn with_outer_space(mut self, before: usize, after: usize) -> Self {
        self.outer_space_before = before;
        self.outer_space_after = after;
        self
    }

    /// Set inner spacing before and after.
    pub fn with_inner_space(mut self, before: usize, after: usize) -> Self {
        self.inner_space_before = before;
        self.inner_space_after = after;
        self
    }

    /// Set the leading decoration.
    pub fn with_leading_decoration(mut self, decoration: SingleLineDecoration) -> Self {
        self.leading_decoration = Some(decoration);
        self
    }

    /// Set the trailing decoration.
    pub fn with_trailing_decoration(mut self, decoration: SingleLineDecoration) -> Self {
        self.trailing_decoration = Some(decoration);
        self
    }

    /// Set the underline pattern.
    pub fn with_underline(mut self, pattern: impl Into<String>) -> Self {
        self.underline = Some(pattern.into());
        self
    }

    /// Set the alignment.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Set the row spacing.
    pub fn with_row_spacing(mut self, spacing: f32) -> Self {
        self.row_spacing = Some(spacing);
        self
    }

    /// Set the list item.
    pub fn with_list_item(mut self, item: ListItem) -> Self {
        self.list_item = Some(item);
        self
    }

    /// Check if the block is framed by any spacing or decoration rows.
    pub fn has_framing(&self) -> bool {
        self.outer_space_before > 0
            || self.inner_space_before > 0
            || self.inner_space_after > 0
            || self.outer_space_after > 0
            || self.leading_decoration.is_some()
            || self.trailing_decoration.is_some()
    }

    /// A new, empty row builder carrying this block's alignment and spacing.
    pub fn configure_new_empty_row_builder(
        &self,
        left: MarginProperties,
        right: MarginProperties,
    ) -> RowBuilder {
        RowBuilder::new("")
            .left_margin(left)
            .right_margin(right)
            .alignment(self.alignment)
            .row_spacing(self.row_spacing)
            .adjusted_for_margin(true)
    }
}

impl Default for RowDataProperties {
    fn default() -> Self {
        Self {
            left_margin: Margin::default(),
            right_margin: Margin::default(),
            text_indent: 0,
            first_line_indent: 0,
            block_indent: 0,
            block_indent_parent: 0,
            outer_space_before: 0,
            inner_space_before: 0,
            inner_space_after: 0,
            outer_space_after: 0,
            leading_decoration: None,
            trailing_decoration: None,
            underline: None,
            alignment: Alignment::Left,
            row_spacing: None,
            list_item: None,
        }
    }
}

/// Whether a block must start on a new page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakBefore {
    /// Continue on the current page
    #[default]
    Auto,
    /// Start on a new page
    Page,
}

/// Where a block is placed on the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// In the text flow
    #[default]
    Flow,
    /// In the page area of the page being filled
    PageArea,
}

/// Pagination properties of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockProperties {
    /// Block identifier, registered with the page it starts on
    pub id: Option<String>,
    /// Page break behaviour before the block
    pub break_before: BreakBefore,
    /// Keep all rows of the block on one page when possible
    pub keep_together: bool,
    /// Number of preceding sheets that must stay in the same volume
    pub keep_with_previous_sheets: usize,
    /// Whether a volume may break on pages holding this block
    pub allow_volume_break: bool,
    /// Priority for avoiding a volume break after pages holding this block
    pub avoid_volume_break_after: Option<i32>,
    /// Flow or page-area placement
    pub placement: Placement,
}

impl Default for BlockProperties {
    fn default() -> Self {
        Self {
            id: None,
            break_before: BreakBefore::Auto,
            keep_together: false,
            keep_with_previous_sheets: 0,
            allow_volume_break: true,
            avoid_volume_break_after: None,
            placement: Placement::Flow,
        }
    }
}
