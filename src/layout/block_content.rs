//! A block's framing and content rows behind one cursor.

use std::rc::Rc;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::formatter::FormatterContext;
use crate::model::{Block, Marker, Row};
use crate::refs::CrossReferences;

use super::framing::BlockFraming;
use super::segments::SegmentProcessor;

/// Buffers the content rows of a block as they are pulled.
///
/// Cloning gives an independent cursor over the same block; the framing
/// rows are shared.
#[derive(Debug, Clone)]
pub struct BlockContentManager {
    framing: Rc<BlockFraming>,
    processor: SegmentProcessor,
    rows: Vec<Row>,
    row_index: usize,
}

impl BlockContentManager {
    /// Create a manager for a block laid out in `flow_width` columns.
    pub fn new(
        block: &Block,
        flow_width: usize,
        fcontext: Rc<FormatterContext>,
        refs: &mut dyn CrossReferences,
        context: &Context,
    ) -> Result<Self> {
        let framing = Rc::new(BlockFraming::new(
            flow_width,
            &block.layout,
            fcontext.space_char(),
        ));
        let processor = SegmentProcessor::new(
            block.segments.clone().into(),
            flow_width,
            Rc::new(block.layout.clone()),
            fcontext,
            refs,
            context,
        )?;
        Ok(Self {
            framing,
            processor,
            rows: Vec::new(),
            row_index: 0,
        })
    }

    /// The block's framing rows.
    pub fn framing(&self) -> &BlockFraming {
        &self.framing
    }

    /// Pull content rows until at least `count` are buffered.
    ///
    /// Returns false if the content ran out first.
    fn ensure_buffer(
        &mut self,
        count: usize,
        refs: &mut dyn CrossReferences,
        context: &Context,
    ) -> Result<bool> {
        while self.rows.len() < count {
            if !self.processor.has_more_data() {
                return Ok(false);
            }
            self.processor.prepare_next(refs, context)?;
            if self.processor.has_next() {
                if let Some(row) = self.processor.get_next(refs, context)? {
                    self.rows.push(row);
                }
            }
        }
        Ok(true)
    }

    /// Check if another content row is available.
    pub fn has_next(&mut self, refs: &mut dyn CrossReferences, context: &Context) -> Result<bool> {
        self.ensure_buffer(self.row_index + 1, refs, context)
    }

    /// Take the next content row.
    pub fn next_row(&mut self, refs: &mut dyn CrossReferences, context: &Context) -> Result<Row> {
        if !self.has_next(refs, context)? {
            return Err(Error::protocol("no more rows in block"));
        }
        let row = self.rows[self.row_index].clone();
        self.row_index += 1;
        Ok(row)
    }

    /// Total number of content rows. Lays out the whole block.
    pub fn row_count(&mut self, refs: &mut dyn CrossReferences, context: &Context) -> Result<usize> {
        self.ensure_buffer(usize::MAX, refs, context)?;
        Ok(self.rows.len())
    }

    /// Content row at `index`, regardless of the cursor.
    pub fn row(
        &mut self,
        index: usize,
        refs: &mut dyn CrossReferences,
        context: &Context,
    ) -> Result<&Row> {
        if !self.ensure_buffer(index + 1, refs, context)? {
            return Err(Error::IndexOutOfRange {
                index,
                size: self.rows.len(),
            });
        }
        Ok(&self.rows[index])
    }

    /// Check if pulling could open a new row rather than finish buffered ones.
    pub fn could_trigger_new_row(&self, context: &Context) -> bool {
        self.row_index >= self.rows.len() && self.processor.could_trigger_new_row(context)
    }

    /// Markers not yet attached to a row.
    pub fn group_markers(&self) -> &[Marker] {
        self.processor.group_markers()
    }

    /// Anchors not yet attached to a row.
    pub fn group_anchors(&self) -> &[String] {
        self.processor.group_anchors()
    }

    pub fn force_break_count(&self) -> usize {
        self.processor.force_count()
    }

    pub fn has_significant_content(&self) -> bool {
        self.processor.has_significant_content()
    }

    /// True while no content row has been produced.
    pub fn is_empty(&self) -> bool {
        self.processor.is_empty()
    }

    /// Rewind to the first content row and lay the block out again.
    pub fn reset(&mut self, refs: &mut dyn CrossReferences, context: &Context) -> Result<()> {
        self.rows.clear();
        self.row_index = 0;
        self.processor.reset(refs, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RowDataProperties, Segment};
    use crate::refs::CrossReferenceHandler;

    fn manager(block: &Block, width: usize) -> BlockContentManager {
        BlockContentManager::new(
            block,
            width,
            Rc::new(FormatterContext::default()),
            &mut CrossReferenceHandler::new(),
            &Context::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_cursor_and_random_access() {
        let block = Block::paragraph("one two three");
        let mut refs = CrossReferenceHandler::new();
        let ctx = Context::new();
        let mut bcm = manager(&block, 9);

        assert!(bcm.has_next(&mut refs, &ctx).unwrap());
        assert_eq!(bcm.next_row(&mut refs, &ctx).unwrap().text(), "one two");
        assert_eq!(bcm.row_count(&mut refs, &ctx).unwrap(), 2);
        assert_eq!(bcm.row(1, &mut refs, &ctx).unwrap().text(), "three");
        assert!(matches!(
            bcm.row(5, &mut refs, &ctx),
            Err(Error::IndexOutOfRange { index: 5, size: 2 })
        ));
        assert_eq!(bcm.next_row(&mut refs, &ctx).unwrap().text(), "three");
        assert!(!bcm.has_next(&mut refs, &ctx).unwrap());
        assert!(matches!(bcm.next_row(&mut refs, &ctx), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_snapshot_counts_remaining() {
        let block = Block::paragraph("a b c d e f");
        let mut refs = CrossReferenceHandler::new();
        let ctx = Context::new();
        let mut bcm = manager(&block, 3);
        bcm.next_row(&mut refs, &ctx).unwrap();

        let mut copy = bcm.clone();
        let mut remaining = 0;
        while copy.has_next(&mut refs, &ctx).unwrap() {
            copy.next_row(&mut refs, &ctx).unwrap();
            remaining += 1;
        }
        assert_eq!(remaining, 2);
        assert_eq!(bcm.next_row(&mut refs, &ctx).unwrap().text(), "c d");
    }

    #[test]
    fn test_framing_and_group_items() {
        let block = Block::new(vec![Segment::marker("m", "v")])
            .with_layout(RowDataProperties::new().with_outer_space(1, 1));
        let mut refs = CrossReferenceHandler::new();
        let ctx = Context::new();
        let mut bcm = manager(&block, 10);
        assert!(!bcm.has_significant_content());
        assert!(bcm.framing().has_collapsible_pre_content_rows());
        assert_eq!(bcm.row_count(&mut refs, &ctx).unwrap(), 0);
        assert!(bcm.is_empty());
        assert_eq!(bcm.group_markers().len(), 1);
    }

    #[test]
    fn test_reset() {
        let block = Block::paragraph("x y");
        let mut refs = CrossReferenceHandler::new();
        let ctx = Context::new();
        let mut bcm = manager(&block, 1);
        assert_eq!(bcm.row_count(&mut refs, &ctx).unwrap(), 2);
        bcm.next_row(&mut refs, &ctx).unwrap();
        bcm.reset(&mut refs, &ctx).unwrap();
        assert_eq!(bcm.next_row(&mut refs, &ctx).unwrap().text(), "x");
    }
}
