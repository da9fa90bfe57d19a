//! Document model types for layout input and output.
//!
//! This module defines the content the layout core consumes (segments,
//! blocks, sections, page geometry) and the rows it produces. Everything
//! except [`Row`] internals is plain data and can be loaded from JSON.

mod block;
mod master;
mod row;
mod segment;

pub use block::{
    Block, BlockProperties, BreakBefore, ListItem, ListStyle, Margin, MarginComponent, Placement,
    RowDataProperties, Side, SingleLineDecoration,
};
pub use master::{
    BlockSequence, Document, Field, FieldList, LayoutMaster, PageAreaAlignment, PageAreaProperties,
    PageBorder, PageCondition, PageTemplate, SectionProperties,
};
pub use row::{char_len, fill, Alignment, MarginProperties, Row, RowBuilder};
pub use segment::{
    Expression, Leader, LeaderAlignment, Marker, NumeralStyle, Position, Segment, TextProperties,
};
