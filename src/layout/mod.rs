//! Block layout: segments to rows, plus the rows framing each block.
//!
//! - [`SegmentProcessor`] lays out one block's segments as rows, lazily
//! - [`BlockFraming`] holds the spacing and decoration rows around a block
//! - [`BlockContentManager`] buffers a block's rows behind a cursor
//! - [`LeaderManager`] tracks the leader waiting for the content after it

mod block_content;
mod framing;
mod leader;
mod segments;

pub use block_content::BlockContentManager;
pub use framing::BlockFraming;
pub use leader::LeaderManager;
pub use segments::SegmentProcessor;
