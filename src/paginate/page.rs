//! Page assembly: content rows framed by header, footer, page area and border.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::formatter::FormatterContext;
use crate::model::{fill, LayoutMaster, Marker, PageAreaAlignment, Row};

use super::area::PageAreaContent;
use super::fields::FieldResolver;

/// Position and collected markers of a page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageDetails {
    page_index: usize,
    ordinal: usize,
    sequence: usize,
    markers: Vec<Marker>,
    content_markers_start: Option<usize>,
}

impl PageDetails {
    /// Create details for the page at `page_index` (offset included).
    ///
    /// `ordinal` counts pages within the section from zero.
    pub fn new(page_index: usize, ordinal: usize, sequence: usize) -> Self {
        Self {
            page_index,
            ordinal,
            sequence,
            markers: Vec::new(),
            content_markers_start: None,
        }
    }

    /// Zero-based page index, section offset included.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// One-based page number.
    pub fn page_number(&self) -> u32 {
        u32::try_from(self.page_index + 1).unwrap_or(u32::MAX)
    }

    /// Position of the page within its section.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Index of the section the page belongs to.
    pub fn sequence(&self) -> usize {
        self.sequence
    }

    /// Markers on the page, in document order.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Markers that arrived with content rows.
    pub fn content_markers(&self) -> &[Marker] {
        match self.content_markers_start {
            Some(start) => &self.markers[start..],
            None => &[],
        }
    }

    pub fn add_markers(&mut self, markers: impl IntoIterator<Item = Marker>) {
        self.markers.extend(markers);
    }

    fn start_content_markers(&mut self) {
        self.content_markers_start = Some(self.markers.len());
    }
}

/// Space needed by `rows` given the default row spacing.
pub fn rows_needed<'a>(rows: impl IntoIterator<Item = &'a Row>, default_spacing: f32) -> f32 {
    rows.into_iter().map(|r| r.height(default_spacing)).sum()
}

/// Final rows of a page with the running height and border rows.
///
/// Border rows are not part of the height.
#[derive(Debug, Clone)]
struct PageRows {
    rows: Vec<Row>,
    offset_height: f32,
    default_spacing: f32,
    has_border: bool,
    bottom: Option<Row>,
    closed: bool,
}

impl PageRows {
    fn new(master: &LayoutMaster) -> Self {
        let width = master.flow_width();
        let border_row = |pattern: &String| Row::builder(fill(pattern, width)).build();
        let border = master.border.as_ref();
        let mut rows = Vec::new();
        if let Some(top) = border.and_then(|b| b.top.as_ref()) {
            rows.push(border_row(top));
        }
        Self {
            rows,
            offset_height: 0.0,
            default_spacing: master.row_spacing,
            has_border: master.border_rows() > 0,
            bottom: border.and_then(|b| b.bottom.as_ref()).map(border_row),
            closed: false,
        }
    }

    fn add_row(&mut self, row: Row) -> Result<()> {
        if self.closed {
            return Err(Error::protocol("page is already finalized"));
        }
        self.offset_height += row.height(self.default_spacing);
        self.rows.push(row);
        Ok(())
    }

    fn add_all(&mut self, rows: impl IntoIterator<Item = Row>) -> Result<()> {
        for row in rows {
            self.add_row(row)?;
        }
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            if let Some(bottom) = self.bottom.take() {
                self.rows.push(bottom);
            }
            self.closed = true;
        }
    }
}

/// A page under assembly.
///
/// The header is rendered when the first content row arrives, or at
/// finalization for a page without content. Finalization pads the flow,
/// adds a bottom page area and the footer, and closes the page.
#[derive(Debug, Clone)]
pub struct Page {
    details: PageDetails,
    master: Rc<LayoutMaster>,
    fcontext: Rc<FormatterContext>,
    resolver: Rc<dyn FieldResolver>,
    area: Rc<PageAreaContent>,
    page_area: Vec<Row>,
    anchors: Vec<String>,
    identifiers: Vec<String>,
    flow_height: usize,
    page_margin: usize,
    rows: PageRows,
    has_rows: bool,
    allows_volume_break: bool,
    keep_previous_sheets: usize,
    avoid_volume_break_after: Option<i32>,
}

impl Page {
    /// Create an empty page.
    pub fn new(
        details: PageDetails,
        master: Rc<LayoutMaster>,
        fcontext: Rc<FormatterContext>,
        resolver: Rc<dyn FieldResolver>,
        area: Rc<PageAreaContent>,
    ) -> Self {
        let page_number = details.page_number();
        let flow_height = master.flow_height(master.template(page_number));
        let page_margin = master.page_margin(page_number);
        let rows = PageRows::new(&master);
        Self {
            details,
            master,
            fcontext,
            resolver,
            area,
            page_area: Vec::new(),
            anchors: Vec::new(),
            identifiers: Vec::new(),
            flow_height,
            page_margin,
            rows,
            has_rows: false,
            allows_volume_break: true,
            keep_previous_sheets: 0,
            avoid_volume_break_after: None,
        }
    }

    pub fn details(&self) -> &PageDetails {
        &self.details
    }

    /// Zero-based page index, section offset included.
    pub fn page_index(&self) -> usize {
        self.details.page_index()
    }

    /// One-based page number.
    pub fn page_number(&self) -> u32 {
        self.details.page_number()
    }

    /// Rows available to the flow.
    pub fn flow_height(&self) -> usize {
        self.flow_height
    }

    /// Margin placed before every row of this page.
    pub fn page_margin(&self) -> usize {
        self.page_margin
    }

    /// Width of the page's rows.
    pub fn flow_width(&self) -> usize {
        self.master.flow_width()
    }

    /// Reserve rows in the page area.
    ///
    /// Only legal before the first content row.
    pub fn add_to_page_area(&mut self, rows: impl IntoIterator<Item = Row>) -> Result<()> {
        if self.has_rows {
            return Err(Error::protocol(
                "page area must be filled before content rows are added",
            ));
        }
        self.page_area.extend(rows);
        Ok(())
    }

    /// Append a content row.
    pub fn new_row(&mut self, row: Row) -> Result<()> {
        if !self.has_rows {
            self.add_header()?;
            self.details.start_content_markers();
            self.has_rows = true;
        }
        let markers = row.markers().to_vec();
        let anchors = row.anchors().to_vec();
        self.rows.add_row(row)?;
        self.details.add_markers(markers);
        self.anchors.extend(anchors);
        Ok(())
    }

    /// Add markers that did not arrive with a row.
    pub fn add_markers(&mut self, markers: impl IntoIterator<Item = Marker>) {
        self.details.add_markers(markers);
    }

    /// Register a block identifier with this page.
    pub fn add_identifier(&mut self, id: impl Into<String>) {
        self.identifiers.push(id.into());
    }

    /// Anchors of the rows on this page.
    pub fn anchors(&self) -> &[String] {
        &self.anchors
    }

    /// Block identifiers starting on this page.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn has_content(&self) -> bool {
        self.has_rows
    }

    fn area_alignment(&self) -> Option<PageAreaAlignment> {
        self.master.page_area.as_ref().map(|a| a.alignment)
    }

    fn static_area_space_needed(&self) -> f32 {
        self.area.space_needed(self.master.row_spacing)
    }

    /// Height of the page area, static rows included. Zero when empty.
    pub fn page_area_space_needed(&self) -> f32 {
        if self.page_area.is_empty() {
            0.0
        } else {
            self.static_area_space_needed() + rows_needed(&self.page_area, self.master.row_spacing)
        }
    }

    /// Rows used so far, page area included, plus `offset`.
    pub fn space_used_on_page(&self, offset: usize) -> usize {
        (self.page_area_space_needed() + self.rows.offset_height).ceil() as usize + offset
    }

    fn add_page_area_rows(&mut self) -> Result<()> {
        let area = Rc::clone(&self.area);
        self.rows.add_all(area.before().iter().cloned())?;
        self.rows.add_all(std::mem::take(&mut self.page_area))?;
        self.rows.add_all(area.after().iter().cloned())
    }

    fn add_header(&mut self) -> Result<()> {
        let master = Rc::clone(&self.master);
        let template = master.template(self.page_number());
        let header = self.resolver.render_fields(
            &self.details,
            &template.header,
            self.fcontext.translator(),
        )?;
        self.rows.add_all(header)?;
        if self.area_alignment() == Some(PageAreaAlignment::Top) && !self.page_area.is_empty() {
            self.add_page_area_rows()?;
        }
        Ok(())
    }

    /// Complete the page. Later calls do nothing.
    pub fn finalize(&mut self) -> Result<()> {
        if self.rows.closed {
            return Ok(());
        }
        if !self.has_rows {
            self.add_header()?;
        }
        let master = Rc::clone(&self.master);
        let template = master.template(self.page_number());
        let header_height = master.header_height(template);
        let bottom = self.area_alignment() == Some(PageAreaAlignment::Bottom);
        if !template.footer.is_empty()
            || self.rows.has_border
            || (bottom && !self.page_area.is_empty())
        {
            let area_size = if bottom {
                self.page_area_space_needed()
            } else {
                0.0
            };
            let target = self.flow_height as f32 + header_height;
            while (self.rows.offset_height + area_size).ceil() < target {
                self.rows.add_row(Row::empty())?;
            }
            if bottom && !self.page_area.is_empty() {
                self.add_page_area_rows()?;
            }
            let footer = self.resolver.render_fields(
                &self.details,
                &template.footer,
                self.fcontext.translator(),
            )?;
            self.rows.add_all(footer)?;
        }
        self.rows.close();
        Ok(())
    }

    /// Finalize the page and return its rows.
    pub fn rows(&mut self) -> Result<&[Row]> {
        self.finalize()?;
        Ok(&self.rows.rows)
    }

    /// Rows accumulated so far. Complete once [`Page::is_finalized`].
    pub fn finished_rows(&self) -> &[Row] {
        &self.rows.rows
    }

    pub fn is_finalized(&self) -> bool {
        self.rows.closed
    }

    pub fn allows_volume_break(&self) -> bool {
        self.allows_volume_break
    }

    pub fn set_allows_volume_break(&mut self, value: bool) {
        self.allows_volume_break = value;
    }

    /// Number of preceding sheets that must share this page's volume.
    pub fn keep_previous_sheets(&self) -> usize {
        self.keep_previous_sheets
    }

    /// Raise the keep count. Never lowers it.
    pub fn set_keep_with_previous_sheets(&mut self, value: usize) {
        self.keep_previous_sheets = self.keep_previous_sheets.max(value);
    }

    pub fn avoid_volume_break_after(&self) -> Option<i32> {
        self.avoid_volume_break_after
    }

    pub fn set_avoid_volume_break_after(&mut self, value: Option<i32>) {
        self.avoid_volume_break_after = value;
    }
}
