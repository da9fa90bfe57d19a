//! Sheets: one page (simplex) or two (duplex) on a physical leaf.

use crate::error::{Error, Result};
use crate::model::SectionProperties;

use super::page::Page;

/// A sealed sheet and its volume-break properties.
#[derive(Debug, Clone)]
pub struct Sheet {
    pages: Vec<Page>,
    section: SectionProperties,
    breakable: bool,
    avoid_volume_break_after: Option<i32>,
}

impl Sheet {
    /// Pages on the sheet, front first.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn section_properties(&self) -> &SectionProperties {
        &self.section
    }

    /// Check if a volume may end after this sheet.
    pub fn is_breakable(&self) -> bool {
        self.breakable
    }

    /// Priority for avoiding a volume break after this sheet.
    pub fn avoid_volume_break_after(&self) -> Option<i32> {
        self.avoid_volume_break_after
    }

    /// Finalize every page on the sheet.
    pub fn finalize(&mut self) -> Result<()> {
        for page in &mut self.pages {
            page.finalize()?;
        }
        Ok(())
    }
}

/// Collects the pages of a sheet before sealing it.
#[derive(Debug, Clone)]
pub struct SheetBuilder {
    pages: Vec<Page>,
    section: SectionProperties,
    breakable: bool,
    avoid_volume_break_after: Option<i32>,
}

impl SheetBuilder {
    pub fn new(section: SectionProperties) -> Self {
        Self {
            pages: Vec::with_capacity(section.pages_per_sheet()),
            section,
            breakable: false,
            avoid_volume_break_after: None,
        }
    }

    /// Add a page; a sheet holds at most as many pages as it has sides.
    pub fn add(&mut self, page: Page) -> Result<()> {
        if self.pages.len() >= self.section.pages_per_sheet() {
            return Err(Error::Internal(format!(
                "sheet already holds {} pages",
                self.pages.len()
            )));
        }
        self.pages.push(page);
        Ok(())
    }

    pub fn set_breakable(&mut self, breakable: bool) {
        self.breakable = breakable;
    }

    pub fn set_avoid_volume_break_after(&mut self, priority: Option<i32>) {
        self.avoid_volume_break_after = priority;
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Seal the sheet.
    pub fn build(self) -> Sheet {
        Sheet {
            pages: self.pages,
            section: self.section,
            breakable: self.breakable,
            avoid_volume_break_after: self.avoid_volume_break_after,
        }
    }
}
