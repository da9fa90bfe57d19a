//! Streaming renderer over paginated sheets.
//!
//! The renderer is an iterator of [`RenderEvent`]s, so a caller can write a
//! long document out row by row instead of building one string.
//!
//! # Example
//!
//! ```
//! use pageflow::render::{RenderEvent, StreamingRenderer};
//! use pageflow::{Block, BlockSequence, CrossReferenceHandler, Document, Formatter, LayoutMaster};
//!
//! fn main() -> pageflow::Result<()> {
//!     let mut document = Document::new();
//!     document.add_section(BlockSequence::new(LayoutMaster::new(20, 10)).with_block(Block::paragraph("hello")));
//!     let result = Formatter::default().paginate(&document, &mut CrossReferenceHandler::new())?;
//!
//!     for event in StreamingRenderer::new(&result.sheets, Default::default()) {
//!         match event {
//!             RenderEvent::Row(line) => println!("{}", line),
//!             RenderEvent::PageStart { number } => println!("-- page {} --", number),
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use crate::paginate::{Page, Sheet};

use super::RenderOptions;

/// Events emitted during streaming rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    /// Rendering has started.
    DocumentStart {
        /// Number of sheets
        sheet_count: usize,
        /// Number of pages on all sheets
        page_count: usize,
    },

    /// A sheet with at least one selected page is starting.
    SheetStart {
        /// 0-indexed sheet position
        index: usize,
    },

    /// A new page is starting.
    PageStart {
        /// Page number as printed
        number: u32,
    },

    /// One rendered row.
    Row(String),

    /// A page has finished rendering.
    PageEnd {
        /// Page number as printed
        number: u32,
    },

    /// A sheet has finished rendering.
    SheetEnd {
        /// 0-indexed sheet position
        index: usize,
    },

    /// Rendering has completed.
    DocumentEnd,
}

impl RenderEvent {
    /// Check if this is a content-bearing event.
    pub fn has_content(&self) -> bool {
        matches!(self, RenderEvent::Row(_))
    }

    /// Get the row text if this is a row event.
    pub fn content(&self) -> Option<&str> {
        match self {
            RenderEvent::Row(s) => Some(s),
            _ => None,
        }
    }

    /// Check if this is a sheet boundary event.
    pub fn is_sheet_boundary(&self) -> bool {
        matches!(
            self,
            RenderEvent::SheetStart { .. } | RenderEvent::SheetEnd { .. }
        )
    }

    /// Check if this is a page boundary event.
    pub fn is_page_boundary(&self) -> bool {
        matches!(
            self,
            RenderEvent::PageStart { .. } | RenderEvent::PageEnd { .. }
        )
    }
}

/// Internal state for the streaming renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    /// Before any output
    Initial,
    /// Looking for the next sheet with a selected page
    BeforeSheet { sheet: usize },
    /// Looking for the next selected page on a sheet
    BeforePage { sheet: usize, page: usize },
    /// Emitting the rows of a page
    InPage { sheet: usize, page: usize, row: usize },
    /// All pages of a sheet emitted
    AfterSheet { sheet: usize },
    /// All sheets rendered, waiting to emit document end
    SheetsComplete,
    /// Rendering complete
    Done,
}

/// Streaming renderer that yields rendering events as an iterator.
pub struct StreamingRenderer<'a> {
    sheets: &'a [Sheet],
    options: RenderOptions,
    state: StreamState,
}

impl<'a> StreamingRenderer<'a> {
    /// Create a new streaming renderer.
    pub fn new(sheets: &'a [Sheet], options: RenderOptions) -> Self {
        Self {
            sheets,
            options,
            state: StreamState::Initial,
        }
    }

    /// Total number of pages on all sheets.
    pub fn page_count(&self) -> usize {
        self.sheets.iter().map(|s| s.pages().len()).sum()
    }

    fn is_selected(&self, page: &Page) -> bool {
        self.options.page_selection.includes(page.page_number())
    }

    fn has_selected_page(&self, sheet: &Sheet) -> bool {
        sheet.pages().iter().any(|p| self.is_selected(p))
    }

    fn render_row(&self, page: &Page, row: usize) -> Option<String> {
        let row = page.finished_rows().get(row)?;
        let space = self.options.space_char;
        let mut line = String::new();
        if self.options.include_margins {
            line.extend(std::iter::repeat(space).take(page.page_margin()));
        }
        line.push_str(&row.render(page.flow_width(), space));
        Some(line)
    }
}

impl<'a> Iterator for StreamingRenderer<'a> {
    type Item = RenderEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                StreamState::Initial => {
                    self.state = StreamState::BeforeSheet { sheet: 0 };
                    return Some(RenderEvent::DocumentStart {
                        sheet_count: self.sheets.len(),
                        page_count: self.page_count(),
                    });
                }

                StreamState::BeforeSheet { sheet } => {
                    let Some(current) = self.sheets.get(sheet) else {
                        self.state = StreamState::SheetsComplete;
                        continue;
                    };
                    if !self.has_selected_page(current) {
                        self.state = StreamState::BeforeSheet { sheet: sheet + 1 };
                        continue;
                    }
                    self.state = StreamState::BeforePage { sheet, page: 0 };
                    return Some(RenderEvent::SheetStart { index: sheet });
                }

                StreamState::BeforePage { sheet, page } => {
                    let pages = self.sheets[sheet].pages();
                    let Some(current) = pages.get(page) else {
                        self.state = StreamState::AfterSheet { sheet };
                        continue;
                    };
                    if !self.is_selected(current) {
                        self.state = StreamState::BeforePage {
                            sheet,
                            page: page + 1,
                        };
                        continue;
                    }
                    self.state = StreamState::InPage { sheet, page, row: 0 };
                    return Some(RenderEvent::PageStart {
                        number: current.page_number(),
                    });
                }

                StreamState::InPage { sheet, page, row } => {
                    let current = &self.sheets[sheet].pages()[page];
                    if let Some(line) = self.render_row(current, row) {
                        self.state = StreamState::InPage {
                            sheet,
                            page,
                            row: row + 1,
                        };
                        return Some(RenderEvent::Row(line));
                    }
                    self.state = StreamState::BeforePage {
                        sheet,
                        page: page + 1,
                    };
                    return Some(RenderEvent::PageEnd {
                        number: current.page_number(),
                    });
                }

                StreamState::AfterSheet { sheet } => {
                    self.state = StreamState::BeforeSheet { sheet: sheet + 1 };
                    return Some(RenderEvent::SheetEnd { index: sheet });
                }

                StreamState::SheetsComplete => {
                    self.state = StreamState::Done;
                    return Some(RenderEvent::DocumentEnd);
                }

                StreamState::Done => return None,
            }
        }
    }
}

/// Collect all rows from a streaming renderer, one per line.
pub fn collect_content(renderer: StreamingRenderer<'_>) -> String {
    let mut output = String::new();
    for event in renderer {
        if let Some(content) = event.content() {
            output.push_str(content);
            output.push('\n');
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{Formatter, Pagination};
    use crate::model::{Block, BlockSequence, Document, LayoutMaster};
    use crate::refs::CrossReferenceHandler;

    fn paginate(master: LayoutMaster, texts: &[&str]) -> Pagination {
        let mut section = BlockSequence::new(master);
        for text in texts {
            section.add_block(Block::paragraph(*text));
        }
        let mut document = Document::new();
        document.add_section(section);
        Formatter::default()
            .paginate(&document, &mut CrossReferenceHandler::new())
            .unwrap()
    }

    #[test]
    fn test_streaming_renderer_empty() {
        let events: Vec<_> = StreamingRenderer::new(&[], RenderOptions::default()).collect();
        assert_eq!(
            events,
            vec![
                RenderEvent::DocumentStart {
                    sheet_count: 0,
                    page_count: 0
                },
                RenderEvent::DocumentEnd
            ]
        );
    }

    #[test]
    fn test_streaming_renderer_event_order() {
        let result = paginate(LayoutMaster::new(10, 1), &["one", "two"]);
        let events: Vec<_> = StreamingRenderer::new(&result.sheets, RenderOptions::default()).collect();
        assert_eq!(
            events,
            vec![
                RenderEvent::DocumentStart {
                    sheet_count: 2,
                    page_count: 2
                },
                RenderEvent::SheetStart { index: 0 },
                RenderEvent::PageStart { number: 1 },
                RenderEvent::Row("one".to_string()),
                RenderEvent::PageEnd { number: 1 },
                RenderEvent::SheetEnd { index: 0 },
                RenderEvent::SheetStart { index: 1 },
                RenderEvent::PageStart { number: 2 },
                RenderEvent::Row("two".to_string()),
                RenderEvent::PageEnd { number: 2 },
                RenderEvent::SheetEnd { index: 1 },
                RenderEvent::DocumentEnd,
            ]
        );
    }

    #[test]
    fn test_duplex_sheet_holds_two_pages() {
        let master = LayoutMaster::new(10, 1).with_duplex(true);
        let result = paginate(master, &["one", "two", "three"]);
        let sheet_starts = StreamingRenderer::new(&result.sheets, RenderOptions::default())
            .filter(|e| matches!(e, RenderEvent::SheetStart { .. }))
            .count();
        assert_eq!(sheet_starts, 2);
    }

    #[test]
    fn test_page_selection_skips_sheets() {
        let result = paginate(LayoutMaster::new(10, 1), &["one", "two", "three"]);
        let options = RenderOptions::default().with_page_list(vec![3]);
        let events: Vec<_> = StreamingRenderer::new(&result.sheets, options).collect();
        assert!(events.contains(&RenderEvent::SheetStart { index: 2 }));
        assert!(!events.contains(&RenderEvent::SheetStart { index: 0 }));
        assert_eq!(collect_content(StreamingRenderer::new(
            &result.sheets,
            RenderOptions::default().with_page_list(vec![3])
        )), "three\n");
    }

    #[test]
    fn test_margins_alternate() {
        let master = LayoutMaster::new(10, 1).with_margins(2, 1).with_duplex(true);
        let result = paginate(master, &["odd", "even"]);
        let options = RenderOptions::default().with_margins(true).with_space_char('.');
        let content = collect_content(StreamingRenderer::new(&result.sheets, options));
        assert_eq!(content, "..odd\n.even\n");
    }

    #[test]
    fn test_render_event_content() {
        let event = RenderEvent::Row("hello".to_string());
        assert!(event.has_content());
        assert_eq!(event.content(), Some("hello"));

        let event = RenderEvent::PageStart { number: 1 };
        assert!(!event.has_content());
        assert!(event.content().is_none());
        assert!(event.is_page_boundary());
        assert!(RenderEvent::SheetEnd { index: 0 }.is_sheet_boundary());
    }
}
