//! Fixed spacing and decoration rows around a block's content.

use crate::model::{fill, MarginProperties, Row, RowDataProperties, Side, SingleLineDecoration};

/// Rows framing a block, computed once from its configuration.
///
/// Collapsible rows (outer space before) may be dropped when the block
/// starts a page. Skippable rows (whitespace-only space after) may be
/// dropped when the block ends a page. Decoration rows are never dropped.
#[derive(Debug, Clone)]
pub struct BlockFraming {
    flow_width: usize,
    left_parent: MarginProperties,
    right_parent: MarginProperties,
    left_margin: MarginProperties,
    right_margin: MarginProperties,
    collapsible_pre: Vec<Row>,
    inner_pre: Vec<Row>,
    post: Vec<Row>,
    skippable_post: Vec<Row>,
    min_width: usize,
}

impl BlockFraming {
    /// Compute the framing of a block laid out in `flow_width` columns.
    pub fn new(flow_width: usize, rdp: &RowDataProperties, space: char) -> Self {
        let left_parent = rdp.left_margin.build_parent(Side::Left, space);
        let right_parent = rdp.right_margin.build_parent(Side::Right, space);
        let left_margin = rdp.left_margin.build(Side::Left, space);
        let right_margin = rdp.right_margin.build(Side::Right, space);
        let min_width = flow_width.saturating_sub(left_margin.len() + right_margin.len());

        let empty_row = |left: &MarginProperties, right: &MarginProperties| {
            rdp.configure_new_empty_row_builder(left.clone(), right.clone())
                .build()
        };
        let indented = left_margin.indented(space, rdp.text_indent);

        let collapsible_pre = (0..rdp.outer_space_before)
            .map(|_| {
                Row::builder("")
                    .left_margin(left_parent.clone())
                    .right_margin(right_parent.clone())
                    .row_spacing(rdp.row_spacing)
                    .adjusted_for_margin(true)
                    .build()
            })
            .collect();

        let mut inner_pre = Vec::new();
        if let Some(decoration) = &rdp.leading_decoration {
            inner_pre.push(decoration_row(flow_width, rdp, decoration, &left_parent, &right_parent));
        }
        for _ in 0..rdp.inner_space_before {
            inner_pre.push(empty_row(&indented, &right_margin));
        }

        let mut post = Vec::new();
        let mut skippable_post = Vec::new();
        match &rdp.trailing_decoration {
            None => {
                let target = if left_margin.is_space_only() && right_margin.is_space_only() {
                    &mut skippable_post
                } else {
                    &mut post
                };
                for _ in 0..rdp.inner_space_after {
                    target.push(empty_row(&indented, &right_margin));
                }
            }
            Some(decoration) => {
                for _ in 0..rdp.inner_space_after {
                    post.push(empty_row(&indented, &right_margin));
                }
                post.push(decoration_row(flow_width, rdp, decoration, &left_parent, &right_parent));
            }
        }

        let target = if left_parent.is_space_only() && right_parent.is_space_only() {
            &mut skippable_post
        } else {
            &mut post
        };
        for _ in 0..rdp.outer_space_after {
            target.push(empty_row(&left_parent, &right_parent));
        }

        Self {
            flow_width,
            left_parent,
            right_parent,
            left_margin,
            right_margin,
            collapsible_pre,
            inner_pre,
            post,
            skippable_post,
            min_width,
        }
    }

    /// Flow width the framing was computed for.
    pub fn flow_width(&self) -> usize {
        self.flow_width
    }

    /// Margins of enclosing blocks (left).
    pub fn left_margin_parent(&self) -> &MarginProperties {
        &self.left_parent
    }

    /// Margins of enclosing blocks (right).
    pub fn right_margin_parent(&self) -> &MarginProperties {
        &self.right_parent
    }

    /// Full left margin.
    pub fn left_margin(&self) -> &MarginProperties {
        &self.left_margin
    }

    /// Full right margin.
    pub fn right_margin(&self) -> &MarginProperties {
        &self.right_margin
    }

    pub fn collapsible_pre_content_rows(&self) -> &[Row] {
        &self.collapsible_pre
    }

    pub fn has_collapsible_pre_content_rows(&self) -> bool {
        !self.collapsible_pre.is_empty()
    }

    pub fn inner_pre_content_rows(&self) -> &[Row] {
        &self.inner_pre
    }

    pub fn has_inner_pre_content_rows(&self) -> bool {
        !self.inner_pre.is_empty()
    }

    pub fn post_content_rows(&self) -> &[Row] {
        &self.post
    }

    pub fn has_post_content_rows(&self) -> bool {
        !self.post.is_empty()
    }

    pub fn skippable_post_content_rows(&self) -> &[Row] {
        &self.skippable_post
    }

    pub fn has_skippable_post_content_rows(&self) -> bool {
        !self.skippable_post.is_empty()
    }

    /// Columns left for text once both margins are taken.
    pub fn minimum_available_width(&self) -> usize {
        self.min_width
    }
}

fn decoration_row(
    flow_width: usize,
    rdp: &RowDataProperties,
    decoration: &SingleLineDecoration,
    left_parent: &MarginProperties,
    right_parent: &MarginProperties,
) -> Row {
    let width = flow_width.saturating_sub(left_parent.len() + right_parent.len());
    let corners = decoration.left_corner.chars().count() + decoration.right_corner.chars().count();
    let text = format!(
        "{}{}{}",
        decoration.left_corner,
        fill(&decoration.line_pattern, width.saturating_sub(corners)),
        decoration.right_corner
    );
    Row::builder(text)
        .left_margin(left_parent.clone())
        .right_margin(right_parent.clone())
        .alignment(rdp.alignment)
        .row_spacing(rdp.row_spacing)
        .adjusted_for_margin(true)
        .build()
}
