//! Rendering options.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::error::{Error, Result};

/// Options for rendering paginated output.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Prefix each row with the page margin (inner or outer)
    pub include_margins: bool,

    /// Text placed between pages
    pub page_separator: String,

    /// Character used for margins and alignment padding
    pub space_char: char,

    /// Page selection
    pub page_selection: PageSelection,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Include or leave out page margins.
    pub fn with_margins(mut self, include: bool) -> Self {
        self.include_margins = include;
        self
    }

    /// Set the page separator.
    pub fn with_page_separator(mut self, separator: impl Into<String>) -> Self {
        self.page_separator = separator.into();
        self
    }

    /// Set the space character.
    pub fn with_space_char(mut self, space: char) -> Self {
        self.space_char = space;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.page_selection = selection;
        self
    }

    /// Set specific page range.
    pub fn with_page_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.page_selection = PageSelection::Range(range);
        self
    }

    /// Set specific pages.
    pub fn with_page_list(mut self, pages: impl IntoIterator<Item = u32>) -> Self {
        self.page_selection = PageSelection::Pages(pages.into_iter().collect());
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_margins: false,
            page_separator: "\u{c}".to_string(),
            space_char: ' ',
            page_selection: PageSelection::All,
        }
    }
}

/// Pages to render, by printed page number.
///
/// Numbers are compared against [`Page::page_number`](crate::Page::page_number),
/// so a section that restarts numbering is selected by its own numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Every page
    #[default]
    All,
    /// An inclusive run of page numbers
    Range(RangeInclusive<u32>),
    /// Individual page numbers
    Pages(BTreeSet<u32>),
}

impl PageSelection {
    /// Check whether a printed page number is selected.
    pub fn includes(&self, page_number: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page_number),
            PageSelection::Pages(pages) => pages.contains(&page_number),
        }
    }

    /// Parse a selection such as `"all"`, `"3-7"` or `"1,4,9-12"`.
    ///
    /// A range whose end is below its start is an error.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        if !s.contains(',') {
            if let Some(range) = parse_range(s)? {
                return Ok(PageSelection::Range(range));
            }
        }

        let mut pages = BTreeSet::new();
        for part in s.split(',') {
            match parse_range(part)? {
                Some(range) => pages.extend(range),
                None => {
                    pages.insert(parse_number(part)?);
                }
            }
        }
        Ok(PageSelection::Pages(pages))
    }
}

fn parse_range(part: &str) -> Result<Option<RangeInclusive<u32>>> {
    let Some((start, end)) = part.split_once('-') else {
        return Ok(None);
    };
    let (start, end) = (parse_number(start)?, parse_number(end)?);
    if end < start {
        return Err(Error::PageSelection(format!(
            "range {}-{} runs backwards",
            start, end
        )));
    }
    Ok(Some(start..=end))
}

fn parse_number(s: &str) -> Result<u32> {
    let s = s.trim();
    s.parse()
        .map_err(|_| Error::PageSelection(format!("'{}' is not a page number", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_builder() {
        let options = RenderOptions::new()
            .with_margins(true)
            .with_page_separator("---\n")
            .with_page_range(2..=3);

        assert!(options.include_margins);
        assert_eq!(options.page_separator, "---\n");
        assert!(!options.page_selection.includes(1));
        assert!(options.page_selection.includes(3));
    }

    #[test]
    fn test_page_list_is_sorted_and_deduplicated() {
        let options = RenderOptions::new().with_page_list(vec![12, 10, 12]);
        assert_eq!(
            options.page_selection,
            PageSelection::Pages(BTreeSet::from([10, 12]))
        );
        assert!(!options.page_selection.includes(11));
    }

    #[test]
    fn test_parse_selection_forms() {
        assert_eq!(PageSelection::parse(" ALL ").unwrap(), PageSelection::All);
        assert_eq!(PageSelection::parse("").unwrap(), PageSelection::All);
        assert_eq!(PageSelection::parse("10-12").unwrap(), PageSelection::Range(10..=12));
        assert_eq!(PageSelection::parse("4-4").unwrap(), PageSelection::Range(4..=4));
        assert_eq!(
            PageSelection::parse("9, 2-3,2").unwrap(),
            PageSelection::Pages(BTreeSet::from([2, 3, 9]))
        );
    }

    #[test]
    fn test_parse_rejects_backwards_range() {
        assert!(matches!(
            PageSelection::parse("5-2"),
            Err(Error::PageSelection(msg)) if msg.contains("5-2")
        ));
        assert!(matches!(
            PageSelection::parse("1,5-2"),
            Err(Error::PageSelection(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_numbers() {
        assert!(matches!(PageSelection::parse("x"), Err(Error::PageSelection(_))));
        assert!(matches!(PageSelection::parse("1-"), Err(Error::PageSelection(_))));
        assert!(matches!(PageSelection::parse("1,,2"), Err(Error::PageSelection(_))));
    }
}
