//! Fills pages of one section with block rows.

use std::mem;
use std::rc::Rc;

use crate::context::{Context, DocumentSpace};
use crate::error::{Error, Result};
use crate::formatter::FormatterContext;
use crate::layout::BlockContentManager;
use crate::model::{Block, BlockProperties, BlockSequence, BreakBefore, LayoutMaster, Marker, Row};
use crate::refs::CrossReferences;

use super::area::{render_rows, PageAreaContent};
use super::fields::{DefaultFieldResolver, FieldResolver};
use super::page::{rows_needed, Page, PageDetails};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    /// Dropped at the top of a page or when it does not fit
    Collapsible,
    Fixed,
    /// Dropped when it does not fit
    Skippable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    CollapsiblePre,
    InnerPre,
    Content,
    Post,
    SkippablePost,
    Done,
}

/// Position within the framing and content rows of one block.
#[derive(Debug, Clone)]
struct BlockCursor {
    block_index: usize,
    bcm: BlockContentManager,
    phase: Phase,
    index: usize,
    placed: bool,
}

impl BlockCursor {
    fn new(block_index: usize, bcm: BlockContentManager) -> Self {
        Self {
            block_index,
            bcm,
            phase: Phase::CollapsiblePre,
            index: 0,
            placed: false,
        }
    }

    fn next_item(
        &mut self,
        refs: &mut dyn CrossReferences,
        context: &Context,
    ) -> Result<Option<(Row, RowKind)>> {
        loop {
            let (kind, next) = match self.phase {
                Phase::Done => return Ok(None),
                Phase::Content => {
                    if self.bcm.has_next(refs, context)? {
                        return Ok(Some((self.bcm.next_row(refs, context)?, RowKind::Fixed)));
                    }
                    self.phase = Phase::Post;
                    continue;
                }
                Phase::CollapsiblePre => (RowKind::Collapsible, Phase::InnerPre),
                Phase::InnerPre => (RowKind::Fixed, Phase::Content),
                Phase::Post => (RowKind::Fixed, Phase::SkippablePost),
                Phase::SkippablePost => (RowKind::Skippable, Phase::Done),
            };
            let framing = self.bcm.framing();
            let rows = match self.phase {
                Phase::CollapsiblePre => framing.collapsible_pre_content_rows(),
                Phase::InnerPre => framing.inner_pre_content_rows(),
                Phase::Post => framing.post_content_rows(),
                _ => framing.skippable_post_content_rows(),
            };
            if let Some(row) = rows.get(self.index) {
                let row = row.clone();
                self.index += 1;
                return Ok(Some((row, kind)));
            }
            self.phase = next;
            self.index = 0;
        }
    }

    /// Height of the rows left in the block, droppable rows excluded.
    fn remaining_height(
        &self,
        refs: &mut dyn CrossReferences,
        context: &Context,
        default_spacing: f32,
    ) -> Result<f32> {
        let mut copy = self.clone();
        let mut height = 0.0;
        while let Some((row, kind)) = copy.next_item(refs, context)? {
            if kind == RowKind::Fixed {
                height += row.height(default_spacing);
            }
        }
        Ok(height)
    }
}

/// A row that did not fit and opens the next page.
#[derive(Debug, Clone)]
struct Carried {
    row: Row,
    block_index: usize,
    first: bool,
}

/// Content of the page being filled.
#[derive(Debug)]
struct PageFill {
    flow_height: f32,
    spacing: f32,
    static_area: f32,
    max_area: f32,
    rows: Vec<Row>,
    height: f32,
    area: Vec<Row>,
    markers: Vec<Marker>,
    identifiers: Vec<String>,
    allows_volume_break: bool,
    keep_previous_sheets: usize,
    avoid_volume_break_after: Option<i32>,
}

impl PageFill {
    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn area_height(&self) -> f32 {
        if self.area.is_empty() {
            0.0
        } else {
            self.static_area + rows_needed(&self.area, self.spacing)
        }
    }

    fn fits_height(&self, height: f32) -> bool {
        self.height + height + self.area_height() <= self.flow_height
    }

    fn fits(&self, row: &Row) -> bool {
        self.fits_height(row.height(self.spacing))
    }

    fn fits_area(&self, rows: &[Row]) -> bool {
        let area = self.static_area + rows_needed(self.area.iter().chain(rows), self.spacing);
        area <= self.max_area && self.height + area <= self.flow_height
    }

    fn place(&mut self, row: Row, properties: &BlockProperties, first: bool) {
        if first {
            if let Some(id) = &properties.id {
                self.identifiers.push(id.clone());
            }
        }
        self.allows_volume_break &= properties.allow_volume_break;
        self.keep_previous_sheets = self.keep_previous_sheets.max(properties.keep_with_previous_sheets);
        self.avoid_volume_break_after = properties.avoid_volume_break_after;
        self.height += row.height(self.spacing);
        self.rows.push(row);
    }
}

/// Produces the pages of one section on demand.
///
/// Cloning gives an independent builder positioned at the same page.
#[derive(Debug, Clone)]
pub struct PageSequenceBuilder {
    fcontext: Rc<FormatterContext>,
    master: Rc<LayoutMaster>,
    blocks: Rc<[Block]>,
    resolver: Rc<dyn FieldResolver>,
    area: Rc<PageAreaContent>,
    context: Context,
    sequence: usize,
    global_start_index: usize,
    page_offset: usize,
    pages_produced: usize,
    block_index: usize,
    cursor: Option<BlockCursor>,
    carry: Option<Carried>,
    pending_area: Vec<Row>,
    inherited_markers: Vec<Marker>,
    inherited_anchors: Vec<String>,
}

impl PageSequenceBuilder {
    /// Create a builder for `section`.
    ///
    /// `page_offset` is the index of the first page, so its number is
    /// `page_offset + 1`. `global_start_index` counts the pages produced
    /// before this section.
    pub fn new(
        section: &BlockSequence,
        sequence: usize,
        global_start_index: usize,
        page_offset: usize,
        fcontext: Rc<FormatterContext>,
        refs: &mut dyn CrossReferences,
        context: &Context,
    ) -> Result<Self> {
        let master = Rc::clone(&section.master);
        let area = PageAreaContent::new(&master, &fcontext, refs, context)?;
        let resolver = Rc::new(DefaultFieldResolver::new(
            Rc::clone(&master),
            context.clone(),
            fcontext.config().clone(),
        ));
        Ok(Self {
            fcontext,
            master,
            blocks: section.blocks.clone().into(),
            resolver,
            area: Rc::new(area),
            context: context.clone(),
            sequence,
            global_start_index,
            page_offset,
            pages_produced: 0,
            block_index: 0,
            cursor: None,
            carry: None,
            pending_area: Vec::new(),
            inherited_markers: Vec::new(),
            inherited_anchors: Vec::new(),
        })
    }

    /// Use another resolver for header and footer fields.
    pub fn with_field_resolver(mut self, resolver: Rc<dyn FieldResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn master(&self) -> &Rc<LayoutMaster> {
        &self.master
    }

    /// Check if another page is available.
    pub fn has_next(&self) -> bool {
        self.cursor.is_some()
            || self.carry.is_some()
            || !self.pending_area.is_empty()
            || self.block_index < self.blocks.len()
    }

    /// Number of pages produced before this section.
    pub fn global_start_index(&self) -> usize {
        self.global_start_index
    }

    /// Index after the last page produced, section offset included.
    pub fn to_index(&self) -> usize {
        self.page_offset + self.pages_produced
    }

    /// Pages produced so far.
    pub fn page_count(&self) -> usize {
        self.pages_produced
    }

    fn space(&self) -> DocumentSpace {
        self.context.space
    }

    /// Fill and return the next page.
    ///
    /// Anchors and block ids on the page are registered with `refs`. When one
    /// of them was read earlier in this pass with another value, the page is
    /// dropped and [`Error::RestartPagination`] is returned.
    pub fn next_page(&mut self, refs: &mut dyn CrossReferences, context: &Context) -> Result<Page> {
        if !self.has_next() {
            return Err(Error::protocol("no more pages in section"));
        }
        let page_index = self.page_offset + self.pages_produced;
        let details = PageDetails::new(page_index, self.pages_produced, self.sequence);
        let ctx = context.at_page(details.page_number());
        let template = self.master.template(details.page_number());
        let spacing = self.master.row_spacing;
        let mut fill = PageFill {
            flow_height: self.master.flow_height(template) as f32,
            spacing,
            static_area: self.area.space_needed(spacing),
            max_area: self.master.page_area.as_ref().map_or(0.0, |a| a.max_height as f32),
            rows: Vec::new(),
            height: 0.0,
            area: mem::take(&mut self.pending_area),
            markers: Vec::new(),
            identifiers: Vec::new(),
            allows_volume_break: true,
            keep_previous_sheets: 0,
            avoid_volume_break_after: None,
        };

        if let Some(carried) = self.carry.take() {
            let blocks = Rc::clone(&self.blocks);
            fill.place(carried.row, &blocks[carried.block_index].properties, carried.first);
        }

        loop {
            if self.cursor.is_none() && !self.open_next_block(&mut fill, refs, &ctx)? {
                break;
            }
            let Some(cursor) = self.cursor.as_mut() else {
                break;
            };
            let block_index = cursor.block_index;
            let first = !cursor.placed;
            let Some((row, kind)) = cursor.next_item(refs, &ctx)? else {
                self.finish_block(&mut fill);
                continue;
            };
            if kind != RowKind::Fixed && (fill.is_empty() || !fill.fits(&row)) {
                continue;
            }
            if let Some(cursor) = self.cursor.as_mut() {
                cursor.placed = true;
            }
            let row = row.with_leading(
                mem::take(&mut self.inherited_markers),
                mem::take(&mut self.inherited_anchors),
            );
            if fill.is_empty() || fill.fits(&row) {
                fill.place(row, &self.blocks[block_index].properties, first);
            } else {
                self.carry = Some(Carried {
                    row,
                    block_index,
                    first,
                });
                break;
            }
        }

        if !self.has_next() {
            fill.markers.append(&mut self.inherited_markers);
            fill.identifiers.append(&mut self.inherited_anchors);
        }
        self.pages_produced += 1;
        self.build_page(details, fill, refs)
    }

    /// Open the next flow block, placing page-area blocks on the way.
    ///
    /// Returns false when the page must end here.
    fn open_next_block(
        &mut self,
        fill: &mut PageFill,
        refs: &mut dyn CrossReferences,
        context: &Context,
    ) -> Result<bool> {
        let blocks = Rc::clone(&self.blocks);
        while self.cursor.is_none() {
            let Some(block) = blocks.get(self.block_index) else {
                return Ok(false);
            };
            self.block_index += 1;

            if block.is_page_area() && self.master.page_area.is_some() {
                let rows = render_rows(
                    std::slice::from_ref(block),
                    self.master.flow_width(),
                    &self.fcontext,
                    refs,
                    context,
                )?;
                let Some((head, tail)) = rows.split_first() else {
                    if let Some(id) = &block.properties.id {
                        fill.identifiers.push(id.clone());
                    }
                    continue;
                };
                // The id travels with the rows in case they move to the next page.
                let mut rows = Vec::with_capacity(tail.len() + 1);
                rows.push(head.clone().with_leading(Vec::new(), block.properties.id.iter().cloned().collect()));
                rows.extend_from_slice(tail);
                if fill.fits_area(&rows) {
                    fill.area.extend(rows);
                } else if fill.area.is_empty() && fill.is_empty() {
                    log::warn!(
                        "page area content of {} rows exceeds the available space",
                        rows.len()
                    );
                    fill.area.extend(rows);
                } else {
                    self.pending_area = rows;
                    return Ok(false);
                }
                continue;
            }

            let bcm = BlockContentManager::new(
                block,
                self.master.flow_width(),
                Rc::clone(&self.fcontext),
                refs,
                context,
            )?;
            let cursor = BlockCursor::new(self.block_index - 1, bcm);
            let mut must_break = false;
            if !fill.is_empty() {
                if block.properties.break_before == BreakBefore::Page {
                    must_break = true;
                } else if block.properties.keep_together {
                    let needed = cursor.remaining_height(refs, context, fill.spacing)?;
                    if !fill.fits_height(needed) && needed <= fill.flow_height {
                        log::debug!("moving block {} to the next page to keep it together", self.block_index - 1);
                        must_break = true;
                    }
                }
            }
            self.cursor = Some(cursor);
            if must_break {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn finish_block(&mut self, fill: &mut PageFill) {
        let Some(cursor) = self.cursor.take() else {
            return;
        };
        if cursor.bcm.is_empty() {
            self.inherited_markers.extend_from_slice(cursor.bcm.group_markers());
            self.inherited_anchors.extend_from_slice(cursor.bcm.group_anchors());
        }
        if !cursor.placed {
            if let Some(id) = &self.blocks[cursor.block_index].properties.id {
                fill.identifiers.push(id.clone());
            }
        }
    }

    fn build_page(
        &self,
        details: PageDetails,
        fill: PageFill,
        refs: &mut dyn CrossReferences,
    ) -> Result<Page> {
        let mut page = Page::new(
            details,
            Rc::clone(&self.master),
            Rc::clone(&self.fcontext),
            Rc::clone(&self.resolver),
            Rc::clone(&self.area),
        );
        let mut area_anchors = Vec::new();
        for row in &fill.area {
            page.add_markers(row.markers().iter().cloned());
            area_anchors.extend(row.anchors().iter().cloned());
        }
        page.add_to_page_area(fill.area)?;
        for row in fill.rows {
            page.new_row(row)?;
        }
        page.add_markers(fill.markers);
        for id in area_anchors.into_iter().chain(fill.identifiers) {
            page.add_identifier(id);
        }
        page.set_allows_volume_break(fill.allows_volume_break);
        page.set_keep_with_previous_sheets(fill.keep_previous_sheets);
        page.set_avoid_volume_break_after(fill.avoid_volume_break_after);

        let number = page.page_number();
        let mut stale = false;
        for id in page.anchors().iter().chain(page.identifiers()) {
            stale |= refs.set_page_number(id, number);
        }
        if stale {
            log::debug!("page {} resolved a reference read earlier in this pass", number);
            return Err(Error::RestartPagination { space: self.space() });
        }
        log::debug!(
            "section {}: filled page {} with {} rows",
            self.sequence,
            number,
            page.finished_rows().len()
        );
        Ok(page)
    }
}
