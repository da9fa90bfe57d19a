//! Output rendering for paginated sheets.
//!
//! - [`StreamingRenderer`]: iterator of [`RenderEvent`]s
//! - [`to_text`]: plain text with optional page margins
//! - [`to_json`]: a serializable view of sheets, pages and rows

mod json;
mod options;
mod streaming;
mod text;

pub use json::{to_json, JsonFormat};
pub use options::{PageSelection, RenderOptions};
pub use streaming::{collect_content, RenderEvent, StreamingRenderer};
pub use text::to_text;
