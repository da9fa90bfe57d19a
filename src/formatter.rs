//! Formatter bindings and the pagination driver.

use std::fmt;
use std::rc::Rc;

use crate::config::FormatterConfig;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::model::{BlockSequence, Document};
use crate::paginate::{Page, Sheet, SheetDataSource, SplitPointSource};
use crate::refs::CrossReferences;
use crate::translate::{PlainTranslator, TranslationRequest, Translator};

/// Configuration and translator shared by every layout component.
///
/// Layout state holds this behind an `Rc`, so snapshots share it.
pub struct FormatterContext {
    config: FormatterConfig,
    translator: Box<dyn Translator>,
}

impl FormatterContext {
    /// Create a context with the given translator.
    pub fn new(config: FormatterConfig, translator: Box<dyn Translator>) -> Self {
        Self { config, translator }
    }

    /// Create a context with the pass-through translator.
    pub fn plain(config: FormatterConfig) -> Self {
        Self::new(config, Box::new(PlainTranslator::new()))
    }

    /// Formatter options.
    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    /// The translator.
    pub fn translator(&self) -> &dyn Translator {
        self.translator.as_ref()
    }

    /// Character used for indents and padding.
    pub fn space_char(&self) -> char {
        self.config.space_char
    }

    /// Translate a short text (labels, fields, fill patterns) in one piece.
    pub fn translate_text(&self, text: &str) -> Result<String> {
        let request = TranslationRequest::text(self.config.fold_case(text)).with_hyphenate(false);
        self.translator.translate_whole(&request)
    }
}

impl Default for FormatterContext {
    fn default() -> Self {
        Self::plain(FormatterConfig::default())
    }
}

impl fmt::Debug for FormatterContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterContext")
            .field("config", &self.config)
            .field("translator", &self.translator)
            .finish()
    }
}

/// Lays out and paginates documents.
///
/// # Example
///
/// ```
/// use pageflow::{Block, BlockSequence, CrossReferenceHandler, Document, Formatter, LayoutMaster};
///
/// let section = BlockSequence::new(LayoutMaster::new(20, 10)).with_block(Block::paragraph("Hello"));
/// let mut document = Document::new();
/// document.add_section(section);
///
/// let mut refs = CrossReferenceHandler::new();
/// let result = Formatter::default().paginate(&document, &mut refs)?;
/// assert_eq!(result.page_count(), 1);
/// # Ok::<(), pageflow::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Formatter {
    fcontext: Rc<FormatterContext>,
    context: Context,
}

impl Formatter {
    /// Create a formatter with the pass-through translator.
    pub fn new(config: FormatterConfig) -> Self {
        Self::with_translator(config, Box::new(PlainTranslator::new()))
    }

    /// Create a formatter with a custom translator.
    pub fn with_translator(config: FormatterConfig, translator: Box<dyn Translator>) -> Self {
        Self {
            fcontext: Rc::new(FormatterContext::new(config, translator)),
            context: Context::new(),
        }
    }

    /// Set the evaluation context (space, volume, variables).
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn config(&self) -> &FormatterConfig {
        self.fcontext.config()
    }

    /// Paginate a document until cross references settle.
    ///
    /// Each pass rebuilds the sheets from scratch. A pass ends early when a
    /// reference resolves differently from what an earlier page read; the
    /// next pass starts with the values learned so far.
    pub fn paginate(&self, document: &Document, refs: &mut dyn CrossReferences) -> Result<Pagination> {
        let sections: Rc<[BlockSequence]> = document.sections.clone().into();
        let max_passes = self.config().max_passes;
        for pass in 1..=max_passes {
            refs.begin_pass();
            log::debug!("pagination pass {}", pass);
            let mut source = SheetDataSource::new(
                Rc::clone(&self.fcontext),
                self.context.clone(),
                Rc::clone(&sections),
            );
            match source.get_remaining(refs) {
                Ok(mut sheets) => {
                    if refs.is_dirty() {
                        log::debug!("references changed during pass {}", pass);
                        continue;
                    }
                    for sheet in &mut sheets {
                        sheet.finalize()?;
                    }
                    log::info!(
                        "paginated {} sections into {} sheets in {} pass(es)",
                        sections.len(),
                        sheets.len(),
                        pass
                    );
                    return Ok(Pagination {
                        sheets,
                        passes: pass,
                    });
                }
                Err(e) if e.is_restart() => {
                    log::debug!("pass {}: {}", pass, e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(Error::Layout(format!(
            "references did not settle after {} passes",
            max_passes
        )))
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(FormatterConfig::default())
    }
}

/// Finalized sheets of a paginated document.
#[derive(Debug, Clone)]
pub struct Pagination {
    /// Sheets in output order
    pub sheets: Vec<Sheet>,
    /// Passes needed for references to settle
    pub passes: usize,
}

impl Pagination {
    /// All pages, in output order.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.sheets.iter().flat_map(|s| s.pages().iter())
    }

    pub fn page_count(&self) -> usize {
        self.sheets.iter().map(|s| s.pages().len()).sum()
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }
}
