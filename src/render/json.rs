//! JSON rendering for paginated sheets.

use serde::Serialize;

use crate::error::Result;
use crate::model::Marker;
use crate::paginate::{Page, Sheet};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

#[derive(Debug, Serialize)]
struct DocumentView<'a> {
    sheets: Vec<SheetView<'a>>,
}

#[derive(Debug, Serialize)]
struct SheetView<'a> {
    duplex: bool,
    breakable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    avoid_volume_break_after: Option<i32>,
    pages: Vec<PageView<'a>>,
}

#[derive(Debug, Serialize)]
struct PageView<'a> {
    number: u32,
    margin: usize,
    rows: Vec<String>,
    #[serde(skip_serializing_if = "is_empty")]
    markers: &'a [Marker],
    #[serde(skip_serializing_if = "is_empty")]
    anchors: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    identifiers: &'a [String],
}

fn is_empty<T>(items: &&[T]) -> bool {
    items.is_empty()
}

impl<'a> PageView<'a> {
    fn new(page: &'a Page) -> Self {
        let width = page.flow_width();
        Self {
            number: page.page_number(),
            margin: page.page_margin(),
            rows: page
                .finished_rows()
                .iter()
                .map(|r| r.render(width, ' '))
                .collect(),
            markers: page.details().markers(),
            anchors: page.anchors(),
            identifiers: page.identifiers(),
        }
    }
}

/// Convert sheets to JSON.
pub fn to_json(sheets: &[Sheet], format: JsonFormat) -> Result<String> {
    let view = DocumentView {
        sheets: sheets
            .iter()
            .map(|sheet| SheetView {
                duplex: sheet.section_properties().duplex,
                breakable: sheet.is_breakable(),
                avoid_volume_break_after: sheet.avoid_volume_break_after(),
                pages: sheet.pages().iter().map(PageView::new).collect(),
            })
            .collect(),
    };

    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&view)?,
        JsonFormat::Compact => serde_json::to_string(&view)?,
    };
    Ok(json)
}
