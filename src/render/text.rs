//! Plain text rendering for paginated sheets.

use crate::error::Result;
use crate::paginate::Sheet;

use super::{RenderEvent, RenderOptions, StreamingRenderer};

/// Convert sheets to plain text.
///
/// Each row ends with a newline and pages are joined with
/// [`RenderOptions::page_separator`].
pub fn to_text(sheets: &[Sheet], options: &RenderOptions) -> Result<String> {
    let mut pages = Vec::new();
    let mut current = String::new();
    for event in StreamingRenderer::new(sheets, options.clone()) {
        match event {
            RenderEvent::Row(line) => {
                current.push_str(&line);
                current.push('\n');
            }
            RenderEvent::PageEnd { .. } => pages.push(std::mem::take(&mut current)),
            _ => {}
        }
    }
    Ok(pages.join(&options.page_separator))
}
