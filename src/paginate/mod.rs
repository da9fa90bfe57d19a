//! Pagination: block rows into pages, pages into sheets.
//!
//! [`PageSequenceBuilder`] fills the pages of one section.
//! [`SheetDataSource`] pulls those pages section by section, groups them into
//! [`Sheet`]s and keeps the volume-break bookkeeping in the cross-reference
//! store. Both are cheap to clone, so a caller can explore a break candidate
//! on a copy and drop it.

mod area;
mod fields;
mod page;
mod sequence;
mod sheet;
mod source;

pub use area::{render_rows, PageAreaContent};
pub use fields::{DefaultFieldResolver, FieldResolver};
pub use page::{rows_needed, Page, PageDetails};
pub use sequence::PageSequenceBuilder;
pub use sheet::{Sheet, SheetBuilder};
pub use source::{PageStruct, SheetDataSource, SplitPointSource, SplitResult};
