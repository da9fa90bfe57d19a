//! Segment row builder.
//!
//! [`SegmentProcessor`] turns the segments of one block into rows, lazily.
//! Callers drive it with a pull protocol:
//!
//! ```text
//! while processor.has_more_data() {
//!     processor.prepare_next(refs, context)?;
//!     if processor.has_next() {
//!         if let Some(row) = processor.get_next(refs, context)? { ... }
//!     }
//! }
//! ```
//!
//! `get_next` may return `None` when an advance only did bookkeeping
//! (markers, anchors, empty evaluations). The processor is `Clone`; a clone
//! continues independently from the same position.

use std::mem;
use std::rc::Rc;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::formatter::FormatterContext;
use crate::model::{
    char_len, fill, ListItem, ListStyle, MarginProperties, Marker, Row, RowBuilder,
    RowDataProperties, Segment, Side, TextProperties,
};
use crate::refs::CrossReferences;
use crate::translate::{AggregatedResult, TranslationRequest, TranslatorResult};

use super::leader::LeaderManager;

const SOFT_HYPHEN: char = '\u{00AD}';
const BRAILLE_BLANK: char = '\u{2800}';

/// Immutable inputs shared between snapshots.
#[derive(Debug)]
struct Settings {
    fcontext: Rc<FormatterContext>,
    rdp: Rc<RowDataProperties>,
    left_margin: MarginProperties,
    right_margin: MarginProperties,
    flow_width: usize,
    available: usize,
}

/// Produces the rows of one block's segments.
#[derive(Debug, Clone)]
pub struct SegmentProcessor {
    settings: Rc<Settings>,
    segments: Rc<[Segment]>,
    significant_content: bool,
    segment_index: usize,
    current: Option<CurrentResult>,
    closed: bool,
    current_row: Option<RowBuilder>,
    group_markers: Vec<Marker>,
    group_anchors: Vec<String>,
    after_leader: Option<AggregatedResult>,
    leader_manager: LeaderManager,
    list_item: Option<ListItem>,
    force_count: usize,
    min_left: usize,
    min_right: usize,
    empty: bool,
}

impl SegmentProcessor {
    /// Create a processor for a block's segments.
    ///
    /// Leading markers and anchors are collected right away and exposed
    /// through [`group_markers`](Self::group_markers) and
    /// [`group_anchors`](Self::group_anchors) until the first row is flushed.
    pub fn new(
        segments: Rc<[Segment]>,
        flow_width: usize,
        rdp: Rc<RowDataProperties>,
        fcontext: Rc<FormatterContext>,
        refs: &mut dyn CrossReferences,
        context: &Context,
    ) -> Result<Self> {
        let space = fcontext.space_char();
        let left_margin = rdp.left_margin.build(Side::Left, space);
        let right_margin = rdp.right_margin.build(Side::Right, space);
        let available = flow_width.saturating_sub(right_margin.len());
        let significant_content =
            segments.iter().any(|s| s.could_produce_row(context)) || rdp.underline.is_some();
        let list_item = rdp.list_item.clone();

        let mut processor = Self {
            settings: Rc::new(Settings {
                fcontext,
                rdp,
                left_margin,
                right_margin,
                flow_width,
                available,
            }),
            segments,
            significant_content,
            segment_index: 0,
            current: None,
            closed: false,
            current_row: None,
            group_markers: Vec::new(),
            group_anchors: Vec::new(),
            after_leader: None,
            leader_manager: LeaderManager::new(),
            list_item,
            force_count: 0,
            min_left: flow_width,
            min_right: flow_width,
            empty: true,
        };
        processor.collect_group_items(refs, context)?;
        Ok(processor)
    }

    /// Start over from the first segment.
    pub fn reset(&mut self, refs: &mut dyn CrossReferences, context: &Context) -> Result<()> {
        let flow_width = self.settings.flow_width;
        self.segment_index = 0;
        self.current = None;
        self.closed = false;
        self.current_row = None;
        self.group_markers.clear();
        self.group_anchors.clear();
        self.after_leader = None;
        self.leader_manager.discard_all();
        self.list_item = self.settings.rdp.list_item.clone();
        self.force_count = 0;
        self.min_left = flow_width;
        self.min_right = flow_width;
        self.empty = true;
        self.collect_group_items(refs, context)
    }

    fn collect_group_items(&mut self, refs: &mut dyn CrossReferences, context: &Context) -> Result<()> {
        self.next_row(false, refs, context).map(|_| ())
    }

    /// Check if the segments can produce any row.
    pub fn has_significant_content(&self) -> bool {
        self.significant_content
    }

    /// Markers seen before the first row was opened.
    pub fn group_markers(&self) -> &[Marker] {
        &self.group_markers
    }

    /// Anchors seen before the first row was opened.
    pub fn group_anchors(&self) -> &[String] {
        &self.group_anchors
    }

    /// Number of forced (mid-word) breaks so far.
    pub fn force_count(&self) -> usize {
        self.force_count
    }

    /// True until the first row has been flushed.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Smallest unused space left of the text over the rows flushed so far.
    pub fn unused_left(&self) -> usize {
        self.min_left
    }

    /// Smallest unused space right of the text over the rows flushed so far.
    pub fn unused_right(&self) -> usize {
        self.min_right
    }

    /// Check if there is anything left to process.
    pub fn has_more_data(&self) -> bool {
        self.has_segments()
            || !self.closed
            || self.current.as_ref().is_some_and(|cr| cr.has_next(self))
    }

    fn has_segments(&self) -> bool {
        self.segment_index < self.segments.len()
    }

    /// Advance to the next result. Does nothing if one is already prepared.
    pub fn prepare_next(&mut self, refs: &mut dyn CrossReferences, context: &Context) -> Result<()> {
        if !self.has_more_data() {
            return Err(Error::protocol("no more segment data"));
        }
        if !self.has_next() {
            if !self.has_segments() && !self.closed {
                self.closed = true;
                let leader = self.layout_leader()?;
                self.current = Some(CurrentResult::Close {
                    leader,
                    do_flush: true,
                    do_underline: self.settings.rdp.underline.is_some(),
                });
            } else {
                self.current = self.load_next_segment(refs, context)?;
            }
        }
        Ok(())
    }

    /// Check if a prepared result is ready.
    pub fn has_next(&self) -> bool {
        self.current.as_ref().is_some_and(|cr| cr.has_next(self))
    }

    /// Take the next row, or `None` if only bookkeeping was done.
    pub fn get_next(&mut self, refs: &mut dyn CrossReferences, context: &Context) -> Result<Option<Row>> {
        self.next_row(true, refs, context)
    }

    fn next_row(
        &mut self,
        produce_row: bool,
        refs: &mut dyn CrossReferences,
        context: &Context,
    ) -> Result<Option<Row>> {
        loop {
            if let Some(mut cr) = self.current.take() {
                if cr.has_next(self) {
                    let ret = cr.process(self);
                    if cr.has_next(self) {
                        self.current = Some(cr);
                    }
                    if let Some(row) = ret? {
                        if !produce_row {
                            return Err(Error::Internal(
                                "a segment that cannot start a row produced one".into(),
                            ));
                        }
                        return Ok(Some(row));
                    }
                    continue;
                }
            }
            if !self.has_more_data() {
                return Ok(None);
            }
            if !produce_row && self.could_trigger_new_row(context) {
                return Ok(None);
            }
            self.prepare_next(refs, context)?;
        }
    }

    /// Check if the next step could start a new row, without advancing.
    pub fn could_trigger_new_row(&self, context: &Context) -> bool {
        match self.segments.get(self.segment_index) {
            Some(segment) => segment.could_produce_row(context),
            None => {
                !self.closed
                    && (self.current_row.is_some()
                        || (!self.empty && self.settings.rdp.underline.is_some())
                        || self.leader_manager.has_leader())
            }
        }
    }

    fn load_next_segment(
        &mut self,
        refs: &mut dyn CrossReferences,
        context: &Context,
    ) -> Result<Option<CurrentResult>> {
        let segments = Rc::clone(&self.segments);
        let segment = &segments[self.segment_index];
        self.segment_index += 1;
        match segment {
            Segment::NewLine => Ok(Some(CurrentResult::NewLine {
                leader: self.layout_leader()?,
                new_line: true,
            })),
            Segment::Text {
                text,
                properties,
                attributes,
            } => {
                let request = self
                    .text_request(text, properties)
                    .with_attributes(attributes.clone());
                self.layout_request(request)
            }
            Segment::Leader(leader) => {
                let ret = if self.leader_manager.has_leader() {
                    self.layout_leader()?.map(CurrentResult::Content)
                } else {
                    None
                };
                self.leader_manager.add_leader(leader.clone());
                Ok(ret)
            }
            Segment::Reference {
                ref_id,
                numeral_style,
            } => {
                let request = match refs.page_number(ref_id) {
                    Some(page) => TranslationRequest::text(
                        self.settings.fcontext.config().fold_case(&numeral_style.format(page)),
                    ),
                    None => {
                        log::debug!("unresolved reference to {}", ref_id);
                        TranslationRequest::text(
                            self.settings.fcontext.config().unresolved_placeholder.clone(),
                        )
                    }
                };
                self.layout_request(request)
            }
            Segment::Evaluate {
                expression,
                properties,
            } => {
                let text = expression.render(context);
                if text.is_empty() {
                    return Ok(None);
                }
                let request = self.text_request(&text, properties);
                self.layout_request(request)
            }
            Segment::Marker(marker) => {
                self.apply_marker(marker.clone());
                Ok(None)
            }
            Segment::Anchor { id } => {
                self.apply_anchor(id.clone());
                Ok(None)
            }
        }
    }

    fn text_request(&self, text: &str, properties: &TextProperties) -> TranslationRequest {
        TranslationRequest::text(self.settings.fcontext.config().fold_case(text))
            .with_locale(properties.locale.clone())
            .with_hyphenate(properties.hyphenate)
    }

    fn layout_request(&mut self, request: TranslationRequest) -> Result<Option<CurrentResult>> {
        let chunks = self.settings.fcontext.translator().translate(&request)?;
        if self.leader_manager.has_leader() {
            self.after_leader
                .get_or_insert_with(AggregatedResult::new)
                .add_result(chunks);
            Ok(None)
        } else {
            Ok(Some(CurrentResult::Content(ContentResult::new(chunks))))
        }
    }

    /// Result resolving the pending leader over whatever followed it.
    fn layout_leader(&mut self) -> Result<Option<ContentResult>> {
        if !self.leader_manager.has_leader() {
            return Ok(None);
        }
        let chunks: Box<dyn TranslatorResult> = match self.after_leader.take() {
            Some(aggregate) => Box::new(aggregate),
            None => self
                .settings
                .fcontext
                .translator()
                .translate(&TranslationRequest::text(""))?,
        };
        Ok(Some(ContentResult::new(chunks)))
    }

    fn apply_marker(&mut self, marker: Marker) {
        if self.leader_manager.has_leader() {
            self.after_leader
                .get_or_insert_with(AggregatedResult::new)
                .add_marker(marker);
        } else if let Some(row) = self.current_row.as_mut() {
            row.add_marker(marker);
        } else {
            self.group_markers.push(marker);
        }
    }

    fn apply_anchor(&mut self, anchor: String) {
        if self.leader_manager.has_leader() {
            self.after_leader
                .get_or_insert_with(AggregatedResult::new)
                .add_anchor(anchor);
        } else if let Some(row) = self.current_row.as_mut() {
            row.add_anchor(anchor);
        } else {
            self.group_anchors.push(anchor);
        }
    }

    fn new_current_row(&mut self, left: MarginProperties, right: MarginProperties) {
        self.current_row = Some(self.settings.rdp.configure_new_empty_row_builder(left, right));
    }

    fn flush_current_row(&mut self) -> Result<Row> {
        let builder = self
            .current_row
            .take()
            .ok_or_else(|| Error::protocol("no open row to flush"))?;
        let mut row = builder.build();
        if self.empty {
            row = row.with_leading(
                mem::take(&mut self.group_markers),
                mem::take(&mut self.group_anchors),
            );
            self.empty = false;
        }

        let flow_width = self.settings.flow_width;
        let width = row.width();
        let left = row.left_margin().len();
        let space = flow_width.saturating_sub(width + left + row.right_margin().len());
        let left = left + row.alignment().offset(space);
        let right = flow_width.saturating_sub(width + left);
        self.min_left = self.min_left.min(left);
        self.min_right = self.min_right.min(right);
        Ok(row)
    }

    fn underline_row(&self) -> Result<Row> {
        let settings = &self.settings;
        let pattern = settings.rdp.underline.as_deref().unwrap_or_default();
        let left_len = settings.left_margin.len();
        let right_len = settings.right_margin.len();
        if self.min_left < left_len || self.min_right < right_len {
            return Err(Error::Internal(format!(
                "underline does not fit: unused {}/{} is less than margins {}/{}",
                self.min_left, self.min_right, left_len, right_len
            )));
        }
        let space = settings.fcontext.space_char().to_string();
        let mut text = fill(&space, self.min_left - left_len);
        text.push_str(&fill(
            pattern,
            settings
                .flow_width
                .saturating_sub(self.min_left + self.min_right),
        ));
        Ok(Row::builder(text)
            .left_margin(settings.left_margin.clone())
            .right_margin(settings.right_margin.clone())
            .adjusted_for_margin(true)
            .build())
    }

    fn pre_text(&self, before: &str, total_indent: usize) -> String {
        let pad = total_indent.saturating_sub(char_len(before));
        let mut text = before.to_string();
        text.push_str(&fill(&self.settings.fcontext.space_char().to_string(), pad));
        text
    }
}

/// The result currently being turned into rows.
#[derive(Debug, Clone)]
enum CurrentResult {
    /// Translated content
    Content(ContentResult),
    /// A forced line break, after resolving a pending leader
    NewLine {
        leader: Option<ContentResult>,
        new_line: bool,
    },
    /// End of the segments: resolve the leader, flush, then underline
    Close {
        leader: Option<ContentResult>,
        do_flush: bool,
        do_underline: bool,
    },
}

impl CurrentResult {
    fn has_next(&self, p: &SegmentProcessor) -> bool {
        match self {
            CurrentResult::Content(content) => content.has_next(),
            CurrentResult::NewLine { leader, new_line } => {
                leader.as_ref().is_some_and(ContentResult::has_next) || *new_line
            }
            CurrentResult::Close {
                leader,
                do_flush,
                do_underline,
            } => {
                leader.as_ref().is_some_and(ContentResult::has_next)
                    || *do_flush
                    || (!p.empty && *do_underline)
            }
        }
    }

    fn process(&mut self, p: &mut SegmentProcessor) -> Result<Option<Row>> {
        match self {
            CurrentResult::Content(content) => content.process(p),
            CurrentResult::NewLine { leader, new_line } => {
                if let Some(leader) = leader.as_mut().filter(|l| l.has_next()) {
                    return leader.process(p);
                }
                if !*new_line {
                    return Ok(None);
                }
                *new_line = false;
                let ret = if p.current_row.is_some() {
                    Some(p.flush_current_row()?)
                } else {
                    None
                };
                let settings = Rc::clone(&p.settings);
                let left = settings
                    .left_margin
                    .indented(settings.fcontext.space_char(), settings.rdp.text_indent);
                p.new_current_row(left, settings.right_margin.clone());
                Ok(ret)
            }
            CurrentResult::Close {
                leader,
                do_flush,
                do_underline,
            } => {
                if let Some(leader) = leader.as_mut().filter(|l| l.has_next()) {
                    return leader.process(p);
                }
                if *do_flush {
                    *do_flush = false;
                    if p.current_row.is_some() {
                        return p.flush_current_row().map(Some);
                    }
                } else if !p.empty && *do_underline {
                    *do_underline = false;
                    return p.underline_row().map(Some);
                }
                Ok(None)
            }
        }
    }
}

/// Where new text starts on the row being filled.
struct RowInfo {
    pre_content: String,
    pre_content_pos: usize,
    available: usize,
}

impl RowInfo {
    fn new(pre_content: String, available: usize) -> Self {
        let pre_content_pos = char_len(&pre_content);
        Self {
            pre_content,
            pre_content_pos,
            available,
        }
    }

    fn pre_tab_position(&self, row: &RowBuilder) -> usize {
        row.current_left_margin().len() + self.pre_content_pos + char_len(row.text())
    }

    fn max_length(&self, row: &RowBuilder) -> usize {
        self.available
            .saturating_sub(row.current_left_margin().len() + self.pre_content_pos)
    }
}

/// Translated content being laid out over one or more rows.
#[derive(Debug, Clone)]
struct ContentResult {
    chunks: Box<dyn TranslatorResult>,
    first: bool,
    counted: bool,
}

impl ContentResult {
    fn new(chunks: Box<dyn TranslatorResult>) -> Self {
        Self {
            chunks,
            first: true,
            counted: false,
        }
    }

    fn has_next(&self) -> bool {
        self.first || self.chunks.has_next()
    }

    fn process(&mut self, p: &mut SegmentProcessor) -> Result<Option<Row>> {
        let ret = if self.first {
            self.first = false;
            self.process_first(p)?
        } else if self.chunks.has_next() {
            if p.current_row.is_some() {
                Some(p.flush_current_row()?)
            } else {
                let rdp = Rc::clone(&p.settings.rdp);
                self.start_new_row(p, "", rdp.text_indent, rdp.block_indent)?
            }
        } else {
            None
        };
        if !self.chunks.has_next() && !self.counted {
            self.counted = true;
            if let Some(count) = self.chunks.forced_break_count() {
                p.force_count += count;
            }
        }
        Ok(ret)
    }

    fn process_first(&mut self, p: &mut SegmentProcessor) -> Result<Option<Row>> {
        let rdp = Rc::clone(&p.settings.rdp);
        if p.current_row.is_some() {
            let info = RowInfo::new(String::new(), p.settings.available);
            return self.continue_row(p, info, rdp.block_indent);
        }
        match p.list_item.take() {
            Some(item) => {
                let label = p.settings.fcontext.translate_text(&item.label)?;
                if item.style == ListStyle::Pl {
                    self.start_new_row(p, &label, 0, rdp.block_indent_parent)
                } else {
                    self.start_new_row(p, &label, rdp.first_line_indent, rdp.block_indent)
                }
            }
            None => self.start_new_row(p, "", rdp.first_line_indent, rdp.block_indent),
        }
    }

    fn start_new_row(
        &mut self,
        p: &mut SegmentProcessor,
        before: &str,
        indent: usize,
        block_indent: usize,
    ) -> Result<Option<Row>> {
        if p.current_row.is_some() {
            return Err(Error::Internal("a row is already open".into()));
        }
        let settings = Rc::clone(&p.settings);
        p.new_current_row(settings.left_margin.clone(), settings.right_margin.clone());
        let info = RowInfo::new(p.pre_text(before, indent + block_indent), settings.available);
        self.continue_row(p, info, block_indent)
    }

    fn continue_row(
        &mut self,
        p: &mut SegmentProcessor,
        mut info: RowInfo,
        block_indent: usize,
    ) -> Result<Option<Row>> {
        let mut ret = None;
        let mut tab_space = String::new();
        if p.leader_manager.has_leader() {
            let settings = Rc::clone(&p.settings);
            let row = p
                .current_row
                .as_ref()
                .ok_or_else(|| Error::protocol("no open row for leader"))?;
            let mut pre_tab_pos = info.pre_tab_position(row);
            let leader_pos = p.leader_manager.leader_position(settings.available)?;
            let align = p.leader_manager.leader_align(self.chunks.count_remaining())?;
            if pre_tab_pos > leader_pos || leader_pos - pre_tab_pos < align {
                let left = row.current_left_margin().clone();
                ret = Some(p.flush_current_row()?);
                p.new_current_row(left, settings.right_margin.clone());
                info = RowInfo::new(
                    p.pre_text("", settings.rdp.text_indent + block_indent),
                    settings.available,
                );
                if let Some(row) = p.current_row.as_ref() {
                    pre_tab_pos = info.pre_tab_position(row);
                }
            }
            let len = leader_pos.saturating_sub(pre_tab_pos).saturating_sub(align);
            let pattern = p.leader_manager.leader_pattern(&settings.fcontext, len);
            p.leader_manager.remove_leader();
            tab_space = pattern?;
        }
        self.break_next_row(p, &info, &tab_space)?;
        Ok(ret)
    }

    fn break_next_row(&mut self, p: &mut SegmentProcessor, info: &RowInfo, tab_space: &str) -> Result<()> {
        let row = p
            .current_row
            .as_mut()
            .ok_or_else(|| Error::protocol("no open row to fill"))?;
        let content_len = char_len(tab_space) + char_len(row.text());
        let force = content_len == 0;
        let limit = info.max_length(row).saturating_sub(content_len);
        let next: String = self
            .chunks
            .next_row(limit, force)
            .chars()
            .filter(|&c| c != SOFT_HYPHEN)
            .collect();

        let text = if next.is_empty() && tab_space.is_empty() {
            let trimmed = row
                .text()
                .trim_end_matches(|c: char| c.is_whitespace() || c == BRAILLE_BLANK);
            format!("{}{}", info.pre_content, trimmed)
        } else {
            let leader_space = row.leader_space() + char_len(tab_space);
            row.set_leader_space(leader_space);
            format!("{}{}{}{}", info.pre_content, row.text(), tab_space, next)
        };
        row.set_text(text);

        let (markers, anchors) = self.chunks.take_pending();
        row.add_markers(markers);
        row.add_anchors(anchors);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormatterConfig;
    use crate::model::{Alignment, LeaderAlignment, Position};
    use crate::refs::CrossReferenceHandler;

    fn processor(segments: Vec<Segment>, width: usize, rdp: RowDataProperties) -> SegmentProcessor {
        processor_with(segments, width, rdp, FormatterConfig::default(), &mut CrossReferenceHandler::new())
    }

    fn processor_with(
        segments: Vec<Segment>,
        width: usize,
        rdp: RowDataProperties,
        config: FormatterConfig,
        refs: &mut CrossReferenceHandler,
    ) -> SegmentProcessor {
        SegmentProcessor::new(
            segments.into(),
            width,
            Rc::new(rdp),
            Rc::new(FormatterContext::plain(config)),
            refs,
            &Context::new(),
        )
        .unwrap()
    }

    fn drain(p: &mut SegmentProcessor) -> Vec<Row> {
        let mut refs = CrossReferenceHandler::new();
        drain_with(p, &mut refs)
    }

    fn drain_with(p: &mut SegmentProcessor, refs: &mut CrossReferenceHandler) -> Vec<Row> {
        let ctx = Context::new();
        let mut rows = Vec::new();
        while p.has_more_data() {
            p.prepare_next(refs, &ctx).unwrap();
            if p.has_next() {
                if let Some(row) = p.get_next(refs, &ctx).unwrap() {
                    rows.push(row);
                }
            }
        }
        rows
    }

    fn texts(rows: &[Row]) -> Vec<String> {
        rows.iter().map(|r| r.text().to_string()).collect()
    }

    #[test]
    fn test_single_row() {
        let mut p = processor(
            vec![Segment::text("Hello "), Segment::text("world")],
            20,
            RowDataProperties::new(),
        );
        assert!(p.has_significant_content());
        assert_eq!(texts(&drain(&mut p)), vec!["Hello world"]);
    }

    #[test]
    fn test_case_folding() {
        let config = FormatterConfig::new().with_capital_letters(false);
        let mut p = processor_with(
            vec![Segment::text("ABC Def")],
            20,
            RowDataProperties::new(),
            config,
            &mut CrossReferenceHandler::new(),
        );
        assert_eq!(texts(&drain(&mut p)), vec!["abc def"]);
    }

    #[test]
    fn test_wraps_with_indents() {
        let rdp = RowDataProperties::new()
            .with_first_line_indent(2)
            .with_text_indent(1);
        let mut p = processor(vec![Segment::text("aaa bbb ccc")], 6, rdp);
        let rows = drain(&mut p);
        assert_eq!(texts(&rows), vec!["  aaa", " bbb", " ccc"]);
        assert!(rows.iter().all(|r| r.total_width() <= 6));
    }

    #[test]
    fn test_margins_limit_text() {
        let rdp = RowDataProperties::new().with_margins(2, 1);
        let mut p = processor(vec![Segment::text("one two three")], 10, rdp);
        let rows = drain(&mut p);
        assert_eq!(texts(&rows), vec!["one two", "three"]);
        assert_eq!(rows[0].left_margin().content(), "  ");
        assert_eq!(rows[0].right_margin().content(), " ");
        assert!(rows.iter().all(|r| r.total_width() <= 10));
    }

    #[test]
    fn test_new_line_boundaries() {
        let rdp = RowDataProperties::new().with_text_indent(1);
        let mut p = processor(
            vec![
                Segment::text("ab"),
                Segment::new_line(),
                Segment::new_line(),
                Segment::text("cd"),
            ],
            10,
            rdp,
        );
        let rows = drain(&mut p);
        assert_eq!(texts(&rows), vec!["ab", "", "cd"]);
        assert_eq!(rows[1].left_margin().content(), " ");
        assert_eq!(rows[2].left_margin().content(), " ");
    }

    #[test]
    fn test_leading_new_line_opens_indented_row() {
        let mut p = processor(
            vec![Segment::new_line(), Segment::text("x")],
            10,
            RowDataProperties::new(),
        );
        assert_eq!(texts(&drain(&mut p)), vec!["x"]);

        let mut p = processor(
            vec![Segment::text("x"), Segment::new_line()],
            10,
            RowDataProperties::new(),
        );
        assert_eq!(texts(&drain(&mut p)), vec!["x", ""]);
    }

    #[test]
    fn test_leader_alignment() {
        let mut p = processor(
            vec![
                Segment::text("AB"),
                Segment::leader(".", Position::Absolute(8), LeaderAlignment::Left),
                Segment::text("CD"),
            ],
            10,
            RowDataProperties::new(),
        );
        let rows = drain(&mut p);
        assert_eq!(texts(&rows), vec!["AB......CD"]);
        assert_eq!(rows[0].leader_space(), 6);
    }

    #[test]
    fn test_leader_right_aligned() {
        let mut p = processor(
            vec![
                Segment::text("AB"),
                Segment::leader(".", Position::Absolute(10), LeaderAlignment::Right),
                Segment::text("12"),
            ],
            10,
            RowDataProperties::new(),
        );
        assert_eq!(texts(&drain(&mut p)), vec!["AB......12"]);
    }

    #[test]
    fn test_leader_passed_target_restarts_row() {
        let rdp = RowDataProperties::new().with_text_indent(1);
        let mut p = processor(
            vec![
                Segment::text("ABCDEF"),
                Segment::leader(".", Position::Absolute(4), LeaderAlignment::Left),
                Segment::text("x"),
            ],
            10,
            rdp,
        );
        assert_eq!(texts(&drain(&mut p)), vec!["ABCDEF", " ...x"]);
    }

    #[test]
    fn test_trailing_leader_is_resolved_at_close() {
        let mut p = processor(
            vec![
                Segment::text("AB"),
                Segment::leader("-", Position::Absolute(5), LeaderAlignment::Left),
            ],
            10,
            RowDataProperties::new(),
        );
        assert_eq!(texts(&drain(&mut p)), vec!["AB---"]);
    }

    #[test]
    fn test_consecutive_leaders() {
        let mut p = processor(
            vec![
                Segment::text("A"),
                Segment::leader(".", Position::Absolute(3), LeaderAlignment::Left),
                Segment::text("B"),
                Segment::leader("-", Position::Absolute(6), LeaderAlignment::Left),
                Segment::text("C"),
            ],
            10,
            RowDataProperties::new(),
        );
        assert_eq!(texts(&drain(&mut p)), vec!["A..B--C"]);
    }

    #[test]
    fn test_snapshot_independence() {
        let mut p = processor(
            vec![
                Segment::text("one two three four five six"),
                Segment::new_line(),
                Segment::text("seven"),
            ],
            8,
            RowDataProperties::new(),
        );
        let mut refs = CrossReferenceHandler::new();
        let ctx = Context::new();
        p.prepare_next(&mut refs, &ctx).unwrap();
        let first = p.get_next(&mut refs, &ctx).unwrap();
        assert_eq!(first.unwrap().text(), "one two");

        let mut copy = p.clone();
        let rest = drain(&mut p);
        let copy_rest = drain(&mut copy);
        assert_eq!(rest, copy_rest);
        assert_eq!(texts(&rest), vec!["three", "four", "five six", "seven"]);
    }

    #[test]
    fn test_group_markers_and_anchors() {
        let mut p = processor(
            vec![
                Segment::marker("chapter", "1"),
                Segment::anchor("start"),
                Segment::text("text"),
                Segment::anchor("inline"),
            ],
            10,
            RowDataProperties::new(),
        );
        assert_eq!(p.group_markers().len(), 1);
        assert_eq!(p.group_anchors(), ["start".to_string()]);

        let rows = drain(&mut p);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].markers()[0].name, "chapter");
        assert_eq!(rows[0].anchors(), ["start".to_string(), "inline".to_string()]);
        assert!(p.group_markers().is_empty());
    }

    #[test]
    fn test_markers_only_block_keeps_group_items() {
        let mut p = processor(
            vec![Segment::marker("m", "v"), Segment::anchor("a")],
            10,
            RowDataProperties::new(),
        );
        assert!(!p.has_significant_content());
        assert!(drain(&mut p).is_empty());
        assert_eq!(p.group_markers().len(), 1);
        assert_eq!(p.group_anchors().len(), 1);
    }

    #[test]
    fn test_empty_evaluate_is_not_content() {
        let mut p = processor(
            vec![Segment::evaluate("{missing}"), Segment::text("x")],
            10,
            RowDataProperties::new(),
        );
        assert_eq!(texts(&drain(&mut p)), vec!["x"]);
    }

    #[test]
    fn test_reference_placeholder_and_resolved() {
        let segments = vec![Segment::text("see "), Segment::reference("target")];
        let mut refs = CrossReferenceHandler::new();
        let mut p = processor_with(
            segments.clone(),
            20,
            RowDataProperties::new(),
            FormatterConfig::default(),
            &mut refs,
        );
        assert_eq!(texts(&drain_with(&mut p, &mut refs)), vec!["see ??"]);

        refs.set_page_number("target", 12);
        let mut p = processor_with(segments, 20, RowDataProperties::new(), FormatterConfig::default(), &mut refs);
        assert_eq!(texts(&drain_with(&mut p, &mut refs)), vec!["see 12"]);
    }

    #[test]
    fn test_list_item_label() {
        let rdp = RowDataProperties::new()
            .with_block_indent(3)
            .with_list_item(ListItem::new("1.", ListStyle::Ol));
        let mut p = processor(vec![Segment::text("item text")], 20, rdp);
        assert_eq!(texts(&drain(&mut p)), vec!["1. item text"]);
    }

    #[test]
    fn test_underline_row() {
        let rdp = RowDataProperties::new()
            .with_margins(1, 1)
            .with_underline("=");
        let mut p = processor(vec![Segment::text("abc de")], 10, rdp);
        let rows = drain(&mut p);
        assert_eq!(texts(&rows), vec!["abc de", "======"]);
        assert_eq!(rows[1].left_margin().content(), " ");
        assert!(rows[1].is_adjusted_for_margin());
        assert_eq!(p.unused_left(), 1);
        assert_eq!(p.unused_right(), 3);
    }

    #[test]
    fn test_underline_follows_centered_text() {
        let rdp = RowDataProperties::new()
            .with_alignment(Alignment::Center)
            .with_underline("-");
        let mut p = processor(vec![Segment::text("ab")], 10, rdp);
        let rows = drain(&mut p);
        assert_eq!(texts(&rows), vec!["ab", "    --"]);
    }

    #[test]
    fn test_label_wider_than_row_fails_underline() {
        let rdp = RowDataProperties::new()
            .with_margins(0, 1)
            .with_list_item(ListItem::new("12345.", ListStyle::Ol))
            .with_underline("-");
        let mut p = processor(vec![Segment::text("x")], 6, rdp);
        let mut refs = CrossReferenceHandler::new();
        let ctx = Context::new();
        let mut failure = None;
        while failure.is_none() && p.has_more_data() {
            if let Err(e) = p.prepare_next(&mut refs, &ctx) {
                failure = Some(e);
            } else if p.has_next() {
                failure = p.get_next(&mut refs, &ctx).err();
            }
        }
        assert!(matches!(failure, Some(Error::Internal(msg)) if msg.starts_with("underline does not fit")));
    }

    #[test]
    fn test_forced_breaks_counted() {
        let mut p = processor(vec![Segment::text("abcdefghij")], 4, RowDataProperties::new());
        let rows = drain(&mut p);
        assert_eq!(texts(&rows), vec!["abcd", "efgh", "ij"]);
        assert_eq!(p.force_count(), 2);
    }

    #[test]
    fn test_reset_replays() {
        let mut p = processor(
            vec![Segment::marker("m", "1"), Segment::text("a b c")],
            3,
            RowDataProperties::new(),
        );
        let first = drain(&mut p);
        p.reset(&mut CrossReferenceHandler::new(), &Context::new()).unwrap();
        assert_eq!(p.group_markers().len(), 1);
        assert_eq!(drain(&mut p), first);
    }

    #[test]
    fn test_prepare_next_without_data_is_protocol_error() {
        let mut p = processor(vec![], 10, RowDataProperties::new());
        let mut refs = CrossReferenceHandler::new();
        assert!(drain(&mut p).is_empty());
        assert!(matches!(
            p.prepare_next(&mut refs, &Context::new()),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn test_could_trigger_new_row() {
        let ctx = Context::new();
        let p = processor(vec![Segment::text("x")], 10, RowDataProperties::new());
        assert!(p.could_trigger_new_row(&ctx));
        let p = processor(vec![], 10, RowDataProperties::new());
        assert!(!p.could_trigger_new_row(&ctx));
    }
}
