//! A lazily filled, splittable sequence of sheets.

use std::rc::Rc;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::formatter::FormatterContext;
use crate::model::{BlockSequence, SectionProperties};
use crate::refs::{CrossReferences, SectionScope, SheetIdentity};

use super::sequence::PageSequenceBuilder;
use super::sheet::{Sheet, SheetBuilder};

/// The buffered head of a split and the source continuing after it.
#[derive(Debug, Clone)]
pub struct SplitResult<S: SplitPointSource> {
    /// Items before the split point
    pub head: Vec<S::Item>,
    /// Source positioned at the split point
    pub tail: S,
}

/// A sequence that is materialized only as far as it is read and can be
/// split into a fixed head and an independent tail.
pub trait SplitPointSource: Sized {
    /// Element type.
    type Item: Clone;

    /// Element at `index`, relative to this source.
    fn get(&mut self, index: usize, refs: &mut dyn CrossReferences) -> Result<Self::Item>;

    /// Check if there is an element at `index`.
    fn has_element_at(&mut self, index: usize, refs: &mut dyn CrossReferences) -> Result<bool>;

    /// Number of elements, counting no further than `limit`.
    fn get_size(&mut self, limit: usize, refs: &mut dyn CrossReferences) -> Result<usize>;

    /// Every remaining element. Drains the underlying content.
    fn get_remaining(&mut self, refs: &mut dyn CrossReferences) -> Result<Vec<Self::Item>>;

    /// Check if there is nothing left, without pulling.
    fn is_empty(&self) -> bool;

    /// Split before `at`.
    fn split(&mut self, at: usize, refs: &mut dyn CrossReferences) -> Result<SplitResult<Self>>;

    #[deprecated(note = "use split")]
    fn head(&mut self, _to: usize) -> Result<Vec<Self::Item>> {
        Err(Error::Unsupported("head"))
    }

    #[deprecated(note = "use split")]
    fn tail(&mut self, _from: usize) -> Result<Self> {
        Err(Error::Unsupported("tail"))
    }
}

/// Page totals carried from one section to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageStruct {
    page_count: usize,
    current_page_offset: usize,
}

impl PageStruct {
    /// Pages produced so far, all sections.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Page index where the next section continues numbering.
    pub fn current_page_offset(&self) -> usize {
        self.current_page_offset
    }

    fn increase_page_count(&mut self) {
        self.page_count += 1;
    }

    fn set_current_sequence(&mut self, psb: &PageSequenceBuilder) {
        self.current_page_offset = psb.to_index();
    }
}

/// Sheets of a document space, pulled section by section.
///
/// Simplex sections seal one sheet per page; duplex sections pair pages
/// front and back. Each sheet records whether a volume may end after it.
#[derive(Debug, Clone)]
pub struct SheetDataSource {
    page_struct: PageStruct,
    fcontext: Rc<FormatterContext>,
    context: Context,
    sections: Rc<[BlockSequence]>,
    offset: usize,
    section_index: usize,
    psb: Option<PageSequenceBuilder>,
    section_properties: Option<SectionProperties>,
    sheet: Option<SheetBuilder>,
    identity: Option<SheetIdentity>,
    sheet_index: usize,
    page_index: usize,
    sheet_buffer: Vec<Sheet>,
    vol_break_allowed: bool,
}

impl SheetDataSource {
    /// Create a source over `sections`, laid out in `context`'s space.
    pub fn new(
        fcontext: Rc<FormatterContext>,
        context: Context,
        sections: Rc<[BlockSequence]>,
    ) -> Self {
        Self {
            page_struct: PageStruct::default(),
            fcontext,
            context,
            sections,
            offset: 0,
            section_index: 0,
            psb: None,
            section_properties: None,
            sheet: None,
            identity: None,
            sheet_index: 0,
            page_index: 0,
            sheet_buffer: Vec::new(),
            vol_break_allowed: true,
        }
    }

    pub fn page_struct(&self) -> &PageStruct {
        &self.page_struct
    }

    /// Buffer sheets until `count` are available past the offset.
    ///
    /// `None` buffers everything. Returns false if the content ran out first.
    fn ensure_buffer(&mut self, count: Option<usize>, refs: &mut dyn CrossReferences) -> Result<bool> {
        while count.map_or(true, |n| self.sheet_buffer.len() - self.offset < n) {
            if !self.psb.as_ref().is_some_and(PageSequenceBuilder::has_next) {
                let sections = Rc::clone(&self.sections);
                let Some(section) = sections.get(self.section_index) else {
                    return Ok(false);
                };
                self.section_index += 1;
                let offset = match section.initial_page_number {
                    Some(number) => number.saturating_sub(1) as usize,
                    None => self.page_struct.current_page_offset(),
                };
                log::debug!(
                    "starting section {} at page index {}",
                    self.section_index,
                    offset
                );
                self.psb = Some(PageSequenceBuilder::new(
                    section,
                    self.section_index,
                    self.page_struct.page_count(),
                    offset,
                    Rc::clone(&self.fcontext),
                    refs,
                    &self.context,
                )?);
                self.section_properties = Some(section.master.new_section_properties());
                self.sheet = None;
                self.identity = None;
                self.sheet_index = 0;
                self.page_index = 0;
            }

            let (Some(psb), Some(properties)) = (self.psb.as_mut(), self.section_properties) else {
                return Err(Error::Internal("no section is open".into()));
            };
            let current_size = self.sheet_buffer.len();
            while psb.has_next() && current_size == self.sheet_buffer.len() {
                if !properties.duplex || self.page_index % 2 == 0 {
                    if let Some(sheet) = self.sheet.take() {
                        self.sheet_buffer.push(sheet.build());
                        continue;
                    }
                    self.vol_break_allowed = true;
                    self.sheet = Some(SheetBuilder::new(properties));
                    self.identity = Some(SheetIdentity::new(
                        self.context.space,
                        self.context.current_volume,
                        self.sheet_buffer.len(),
                    ));
                    self.sheet_index += 1;
                }
                let (Some(sheet), Some(identity)) = (self.sheet.as_mut(), self.identity) else {
                    return Err(Error::Internal("no sheet is open".into()));
                };

                let page = psb.next_page(refs, &self.context)?;
                self.page_struct.increase_page_count();
                sheet.set_avoid_volume_break_after(page.avoid_volume_break_after());
                if !psb.has_next() {
                    // A section boundary is always a possible volume break.
                    sheet.set_avoid_volume_break_after(None);
                    sheet.set_breakable(true);
                } else {
                    let breakable = refs.breakable(&identity);
                    if !breakable {
                        sheet.set_avoid_volume_break_after(Some(1));
                    }
                    sheet.set_breakable(breakable);
                }

                keep_previous_sheets(
                    refs,
                    &identity,
                    page.keep_previous_sheets().min(self.sheet_index - 1),
                );
                self.vol_break_allowed &= page.allows_volume_break();
                if !properties.duplex || self.page_index % 2 == 1 {
                    refs.set_breakable(&identity, self.vol_break_allowed);
                }
                sheet.add(page)?;
                self.page_index += 1;
            }

            if !psb.has_next() {
                if let Some(sheet) = self.sheet.take() {
                    self.sheet_buffer.push(sheet.build());
                }
                let start = psb.global_start_index();
                refs.register_section_scope(
                    self.context.space,
                    self.context.current_volume,
                    self.section_index,
                    SectionScope {
                        start,
                        end: start + psb.page_count(),
                    },
                );
                self.page_struct.set_current_sequence(psb);
            }
        }
        Ok(true)
    }
}

/// Mark up to `count` sheets before `identity` as not breakable.
///
/// The first sheet of the space is never marked.
fn keep_previous_sheets(refs: &mut dyn CrossReferences, identity: &SheetIdentity, count: usize) {
    let mut index = identity.sheet_index;
    for _ in 0..count {
        if index <= 1 {
            break;
        }
        index -= 1;
        let previous = SheetIdentity::new(identity.space, identity.volume, index);
        refs.set_breakable(&previous, false);
    }
}

impl SplitPointSource for SheetDataSource {
    type Item = Sheet;

    fn get(&mut self, index: usize, refs: &mut dyn CrossReferences) -> Result<Sheet> {
        if !self.ensure_buffer(Some(index + 1), refs)? {
            return Err(Error::IndexOutOfRange {
                index,
                size: self.sheet_buffer.len() - self.offset,
            });
        }
        Ok(self.sheet_buffer[index + self.offset].clone())
    }

    fn has_element_at(&mut self, index: usize, refs: &mut dyn CrossReferences) -> Result<bool> {
        self.ensure_buffer(Some(index + 1), refs)
    }

    fn get_size(&mut self, limit: usize, refs: &mut dyn CrossReferences) -> Result<usize> {
        if self.ensure_buffer(Some(limit), refs)? {
            Ok(limit)
        } else {
            Ok(self.sheet_buffer.len() - self.offset)
        }
    }

    fn get_remaining(&mut self, refs: &mut dyn CrossReferences) -> Result<Vec<Sheet>> {
        self.ensure_buffer(None, refs)?;
        Ok(self.sheet_buffer[self.offset..].to_vec())
    }

    fn is_empty(&self) -> bool {
        self.section_index >= self.sections.len()
            && self.sheet_buffer.len() <= self.offset
            && !self.psb.as_ref().is_some_and(PageSequenceBuilder::has_next)
    }

    fn split(&mut self, at: usize, refs: &mut dyn CrossReferences) -> Result<SplitResult<Self>> {
        if !self.ensure_buffer(Some(at), refs)? {
            return Err(Error::IndexOutOfRange {
                index: at,
                size: self.sheet_buffer.len() - self.offset,
            });
        }
        let mut tail = self.clone();
        tail.offset = self.offset + at;
        Ok(SplitResult {
            head: self.sheet_buffer[self.offset..self.offset + at].to_vec(),
            tail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, LayoutMaster};
    use crate::refs::CrossReferenceHandler;

    fn source(sections: Vec<BlockSequence>) -> SheetDataSource {
        SheetDataSource::new(
            Rc::new(FormatterContext::default()),
            Context::new(),
            sections.into(),
        )
    }

    /// A section with one single-row page per block.
    fn section(pages: usize, duplex: bool) -> BlockSequence {
        let mut section = BlockSequence::new(LayoutMaster::new(10, 1).with_duplex(duplex));
        for i in 0..pages {
            section.add_block(Block::paragraph(format!("p{}", i + 1)));
        }
        section
    }

    fn page_counts(sheets: &[Sheet]) -> Vec<usize> {
        sheets.iter().map(|s| s.pages().len()).collect()
    }

    #[test]
    fn test_simplex_and_duplex_grouping() {
        let mut refs = CrossReferenceHandler::new();
        let sheets = source(vec![section(3, false)]).get_remaining(&mut refs).unwrap();
        assert_eq!(page_counts(&sheets), [1, 1, 1]);

        let mut refs = CrossReferenceHandler::new();
        let sheets = source(vec![section(5, true)]).get_remaining(&mut refs).unwrap();
        assert_eq!(page_counts(&sheets), [2, 2, 1]);
        assert!(sheets[2].is_breakable());
        assert_eq!(sheets[2].avoid_volume_break_after(), None);
    }

    #[test]
    fn test_sections_continue_page_numbers() {
        let mut refs = CrossReferenceHandler::new();
        let restarted = section(1, false).with_initial_page_number(10);
        let mut src = source(vec![section(2, true), section(1, false), restarted]);
        let sheets = src.get_remaining(&mut refs).unwrap();
        let numbers: Vec<u32> = sheets
            .iter()
            .flat_map(|s| s.pages().iter().map(|p| p.page_number()))
            .collect();
        assert_eq!(numbers, [1, 2, 3, 10]);
        assert_eq!(src.page_struct().page_count(), 4);
        assert_eq!(
            refs.section_scope(Default::default(), 1, 2),
            Some(SectionScope { start: 2, end: 3 })
        );
        assert!(!src.is_empty());
        assert!(src.split(3, &mut refs).unwrap().tail.is_empty());
    }

    #[test]
    fn test_lazy_buffering() {
        let mut refs = CrossReferenceHandler::new();
        let mut src = source(vec![section(4, false)]);
        assert!(!src.is_empty());
        assert_eq!(src.get(1, &mut refs).unwrap().pages()[0].page_number(), 2);
        assert_eq!(src.sheet_buffer.len(), 2);
        assert!(src.has_element_at(3, &mut refs).unwrap());
        assert!(!src.has_element_at(4, &mut refs).unwrap());
        assert_eq!(src.get_size(2, &mut refs).unwrap(), 2);
        assert_eq!(src.get_size(10, &mut refs).unwrap(), 4);
        assert!(matches!(
            src.get(7, &mut refs),
            Err(Error::IndexOutOfRange { index: 7, size: 4 })
        ));
    }

    #[test]
    fn test_split_reproduces_sequence() {
        let mut refs = CrossReferenceHandler::new();
        let full = source(vec![section(5, false)]).get_remaining(&mut refs).unwrap();

        let mut refs = CrossReferenceHandler::new();
        let mut src = source(vec![section(5, false)]);
        let SplitResult { head, mut tail } = src.split(2, &mut refs).unwrap();
        let rest = tail.get_remaining(&mut refs).unwrap();
        let numbers = |sheets: &[Sheet]| -> Vec<u32> {
            sheets.iter().map(|s| s.pages()[0].page_number()).collect()
        };
        let mut joined = numbers(&head);
        joined.extend(numbers(&rest));
        assert_eq!(joined, numbers(&full));

        // The original keeps its own position.
        assert_eq!(src.get_remaining(&mut refs).unwrap().len(), 5);
        assert!(matches!(
            src.split(9, &mut refs),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    #[allow(deprecated)]
    fn test_deprecated_members_fail() {
        let mut src = source(vec![section(1, false)]);
        assert!(matches!(src.head(1), Err(Error::Unsupported("head"))));
        assert!(matches!(src.tail(0), Err(Error::Unsupported("tail"))));
    }

    #[test]
    fn test_non_breakable_sheet_gets_priority() {
        let mut refs = CrossReferenceHandler::new();
        refs.set_breakable(&SheetIdentity::new(Default::default(), 1, 0), false);
        let sheets = source(vec![section(2, false)]).get_remaining(&mut refs).unwrap();
        assert!(!sheets[0].is_breakable());
        assert_eq!(sheets[0].avoid_volume_break_after(), Some(1));
        assert!(sheets[1].is_breakable());
    }

    #[test]
    fn test_keep_with_previous_sheets() {
        let mut section = BlockSequence::new(LayoutMaster::new(10, 1));
        for i in 0..6 {
            let mut block = Block::paragraph(format!("p{}", i + 1));
            if i == 4 {
                block.properties.keep_with_previous_sheets = 2;
            }
            section.add_block(block);
        }
        let mut refs = CrossReferenceHandler::new();
        source(vec![section]).get_remaining(&mut refs).unwrap();
        let stored = |refs: &CrossReferenceHandler, index| {
            refs.stored_breakable(&SheetIdentity::new(Default::default(), 1, index))
        };
        // Sheet 5 (index 4) keeps sheets 3 and 4 (indexes 2 and 3).
        assert_eq!(stored(&refs, 2), Some(false));
        assert_eq!(stored(&refs, 3), Some(false));
        assert_eq!(stored(&refs, 1), Some(true));
    }

    #[test]
    fn test_volume_break_written_per_pairing() {
        let mut section = BlockSequence::new(LayoutMaster::new(10, 1).with_duplex(true));
        for i in 0..4 {
            let mut block = Block::paragraph(format!("p{}", i + 1));
            block.properties.allow_volume_break = i != 1;
            section.add_block(block);
        }
        let mut refs = CrossReferenceHandler::new();
        source(vec![section]).get_remaining(&mut refs).unwrap();
        let id = |index| SheetIdentity::new(Default::default(), 1, index);
        assert_eq!(refs.stored_breakable(&id(0)), Some(false));
        assert_eq!(refs.stored_breakable(&id(1)), Some(true));
    }
}
