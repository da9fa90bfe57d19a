//! Static rows around the page area, and block rendering for it.

use std::rc::Rc;

use crate::context::Context;
use crate::error::Result;
use crate::formatter::FormatterContext;
use crate::layout::BlockContentManager;
use crate::model::{Block, LayoutMaster, Row};
use crate::refs::CrossReferences;

use super::page::rows_needed;

/// Rows placed before and after the page-area content of every page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageAreaContent {
    before: Vec<Row>,
    after: Vec<Row>,
}

impl PageAreaContent {
    /// Render the static page-area blocks of `master`.
    pub fn new(
        master: &LayoutMaster,
        fcontext: &Rc<FormatterContext>,
        refs: &mut dyn CrossReferences,
        context: &Context,
    ) -> Result<Self> {
        let Some(area) = &master.page_area else {
            return Ok(Self::default());
        };
        let width = master.flow_width();
        Ok(Self {
            before: render_rows(&area.before, width, fcontext, refs, context)?,
            after: render_rows(&area.after, width, fcontext, refs, context)?,
        })
    }

    /// Wrap rows that are already rendered.
    pub fn from_rows(before: Vec<Row>, after: Vec<Row>) -> Self {
        Self { before, after }
    }

    pub fn before(&self) -> &[Row] {
        &self.before
    }

    pub fn after(&self) -> &[Row] {
        &self.after
    }

    /// Height of the static rows.
    pub fn space_needed(&self, default_spacing: f32) -> f32 {
        rows_needed(&self.before, default_spacing) + rows_needed(&self.after, default_spacing)
    }
}

/// Content rows of `blocks`, laid out in full.
pub fn render_rows(
    blocks: &[Block],
    flow_width: usize,
    fcontext: &Rc<FormatterContext>,
    refs: &mut dyn CrossReferences,
    context: &Context,
) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for block in blocks {
        let mut bcm = BlockContentManager::new(block, flow_width, Rc::clone(fcontext), refs, context)?;
        let count = bcm.row_count(refs, context)?;
        for i in 0..count {
            rows.push(bcm.row(i, refs, context)?.clone());
        }
    }
    Ok(rows)
}
