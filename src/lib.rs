//! # pageflow
//!
//! Row and page layout core for fixed-cell text such as braille.
//!
//! A [`Document`] is a list of sections ([`BlockSequence`]), each a list of
//! [`Block`]s laid out on one [`LayoutMaster`]. The [`Formatter`] breaks
//! block content into rows, fills pages and groups pages into sheets,
//! repeating pagination until every page reference resolves.
//!
//! ## Quick Start
//!
//! ```
//! use pageflow::{Block, BlockSequence, Document, LayoutMaster, RenderOptions};
//!
//! fn main() -> pageflow::Result<()> {
//!     let mut document = Document::new();
//!     document.add_section(
//!         BlockSequence::new(LayoutMaster::new(20, 10))
//!             .with_block(Block::paragraph("Hello, world!")),
//!     );
//!
//!     let result = pageflow::paginate(&document)?;
//!     let text = pageflow::render::to_text(&result.sheets, &RenderOptions::default())?;
//!     assert_eq!(text, "Hello, world!\n");
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Row breaking**: margins, alignment, hyphenation hooks, leaders
//! - **Page filling**: keep and break rules, headers, footers, page areas
//! - **Sheets**: simplex and duplex, volume-break properties
//! - **Cross-references**: page numbers resolved over repeated passes

pub mod config;
pub mod context;
pub mod error;
pub mod formatter;
pub mod layout;
pub mod model;
pub mod paginate;
pub mod refs;
pub mod render;
pub mod translate;

// Re-export commonly used types
pub use config::FormatterConfig;
pub use context::{Context, DocumentSpace};
pub use error::{Error, Result};
pub use formatter::{Formatter, FormatterContext, Pagination};
pub use model::{
    Alignment, Block, BlockProperties, BlockSequence, BreakBefore, Document, Field, FieldList,
    LayoutMaster, Marker, PageTemplate, Row, RowDataProperties, Segment, TextProperties,
};
pub use paginate::{Page, Sheet, SheetDataSource, SplitPointSource};
pub use refs::{CrossReferenceHandler, CrossReferences};
pub use render::{JsonFormat, PageSelection, RenderEvent, RenderOptions, StreamingRenderer};
pub use translate::{PlainTranslator, Translator};

use std::path::Path;

/// Paginate a document with default configuration.
///
/// # Example
///
/// ```
/// use pageflow::{Block, BlockSequence, Document, LayoutMaster};
///
/// let mut document = Document::new();
/// document.add_section(BlockSequence::new(LayoutMaster::new(20, 10)).with_block(Block::paragraph("x")));
/// let result = pageflow::paginate(&document).unwrap();
/// assert_eq!(result.page_count(), 1);
/// ```
pub fn paginate(document: &Document) -> Result<Pagination> {
    Formatter::default().paginate(document, &mut CrossReferenceHandler::new())
}

/// Load a JSON document from a file and paginate it.
///
/// # Example
///
/// ```no_run
/// let result = pageflow::paginate_file("document.json").unwrap();
/// println!("Sheets: {}", result.sheet_count());
/// ```
pub fn paginate_file<P: AsRef<Path>>(path: P) -> Result<Pagination> {
    let document = Document::from_path(path)?;
    paginate(&document)
}

/// Parse a JSON document and paginate it.
pub fn paginate_str(json: &str) -> Result<Pagination> {
    let document = Document::from_json(json)?;
    paginate(&document)
}

/// Convert a JSON document file to plain text.
///
/// # Example
///
/// ```no_run
/// use pageflow::RenderOptions;
///
/// let options = RenderOptions::new().with_margins(true);
/// let text = pageflow::to_text("document.json", &options).unwrap();
/// ```
pub fn to_text<P: AsRef<Path>>(path: P, options: &RenderOptions) -> Result<String> {
    let result = paginate_file(path)?;
    render::to_text(&result.sheets, options)
}

/// Convert a JSON document file to the JSON sheet view.
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let result = paginate_file(path)?;
    render::to_json(&result.sheets, format)
}

/// Builder for paginating and rendering documents.
///
/// # Example
///
/// ```no_run
/// use pageflow::Pageflow;
///
/// let text = Pageflow::new()
///     .with_max_passes(4)
///     .with_margins()
///     .paginate_file("document.json")?
///     .to_text()?;
/// # Ok::<(), pageflow::Error>(())
/// ```
pub struct Pageflow {
    config: FormatterConfig,
    context: Context,
    render_options: RenderOptions,
}

impl Pageflow {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            context: Context::new(),
            render_options: RenderOptions::default(),
        }
    }

    /// Use a full formatter configuration.
    pub fn with_config(mut self, config: FormatterConfig) -> Self {
        self.render_options = self.render_options.with_space_char(config.space_char);
        self.config = config;
        self
    }

    /// Set the evaluation context.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Limit the number of pagination passes.
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.config = self.config.with_max_passes(passes);
        self
    }

    /// Include page margins in text output.
    pub fn with_margins(mut self) -> Self {
        self.render_options = self.render_options.with_margins(true);
        self
    }

    /// Set the text placed between pages.
    pub fn with_page_separator(mut self, separator: impl Into<String>) -> Self {
        self.render_options = self.render_options.with_page_separator(separator);
        self
    }

    /// Set page selection for rendering.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.render_options = self.render_options.with_pages(pages);
        self
    }

    /// Paginate a document.
    pub fn paginate(self, document: &Document) -> Result<PageflowResult> {
        let formatter = Formatter::new(self.config).with_context(self.context);
        let pagination = formatter.paginate(document, &mut CrossReferenceHandler::new())?;
        Ok(PageflowResult {
            pagination,
            render_options: self.render_options,
        })
    }

    /// Load a JSON document from a file and paginate it.
    pub fn paginate_file<P: AsRef<Path>>(self, path: P) -> Result<PageflowResult> {
        let document = Document::from_path(path)?;
        self.paginate(&document)
    }
}

impl Default for Pageflow {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of paginating a document.
pub struct PageflowResult {
    /// The sheets and pass count
    pub pagination: Pagination,
    /// Render options to use
    render_options: RenderOptions,
}

impl PageflowResult {
    /// Convert to plain text.
    pub fn to_text(&self) -> Result<String> {
        render::to_text(&self.pagination.sheets, &self.render_options)
    }

    /// Convert to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.pagination.sheets, format)
    }

    /// Stream rendering events.
    pub fn events(&self) -> StreamingRenderer<'_> {
        StreamingRenderer::new(&self.pagination.sheets, self.render_options.clone())
    }

    /// Get the sheets.
    pub fn sheets(&self) -> &[Sheet] {
        &self.pagination.sheets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "sections": [{
            "master": {"page_width": 12, "page_height": 2, "inner_margin": 2},
            "blocks": [
                {"segments": [{"type": "text", "text": "one"}]},
                {"segments": [{"type": "text", "text": "two"}]},
                {"segments": [{"type": "text", "text": "three"}]}
            ]
        }]
    }"#;

    #[test]
    fn test_pageflow_builder() {
        let flow = Pageflow::new().with_max_passes(3).with_margins();
        assert_eq!(flow.config.max_passes, 3);
        assert!(flow.render_options.include_margins);
    }

    #[test]
    fn test_paginate_str() {
        let result = paginate_str(DOCUMENT).unwrap();
        assert_eq!(result.page_count(), 2);
        assert_eq!(result.passes, 1);
    }

    #[test]
    fn test_builder_renders_margins() {
        let document = Document::from_json(DOCUMENT).unwrap();
        let result = Pageflow::new()
            .with_margins()
            .with_page_separator("~\n")
            .paginate(&document)
            .unwrap();
        assert_eq!(result.to_text().unwrap(), "  one\n  two\n~\nthree\n");
    }

    #[test]
    fn test_paginate_str_invalid_json() {
        assert!(matches!(paginate_str("{"), Err(Error::Json(_))));
    }

    #[test]
    fn test_paginate_file_missing() {
        assert!(matches!(
            paginate_file("/nonexistent/document.json"),
            Err(Error::Io(_))
        ));
    }
}
