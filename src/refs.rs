//! Cross-reference store shared by every pagination pass.
//!
//! The store is the only mutable state that outlives a pass. Snapshots of
//! the pagination state never copy it; it is handed to each pulling call
//! as `&mut dyn CrossReferences`. Every write is safe to repeat with the
//! same value when a pass is replayed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::context::DocumentSpace;

/// Stable key for per-sheet decisions that must survive a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetIdentity {
    /// Document space
    pub space: DocumentSpace,
    /// Volume number (1-indexed)
    pub volume: u32,
    /// Sheet index within the space (zero based)
    pub sheet_index: usize,
}

impl SheetIdentity {
    /// Create a sheet identity.
    pub fn new(space: DocumentSpace, volume: u32, sheet_index: usize) -> Self {
        Self {
            space,
            volume,
            sheet_index,
        }
    }
}

/// Global page index range of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionScope {
    /// First global page index
    pub start: usize,
    /// Global page index after the last page
    pub end: usize,
}

/// Lookups and decisions shared between pagination passes.
pub trait CrossReferences {
    /// Page number of an anchor or block id, if known.
    fn page_number(&mut self, ref_id: &str) -> Option<u32>;

    /// Record the page number of an anchor or block id.
    ///
    /// Returns true if a lookup earlier in this pass saw a different value,
    /// in which case the pass is stale and must restart.
    fn set_page_number(&mut self, ref_id: &str, page: u32) -> bool;

    /// Stored breakability of a sheet (true when nothing is stored).
    fn breakable(&mut self, sheet: &SheetIdentity) -> bool;

    /// Store the breakability of a sheet.
    fn set_breakable(&mut self, sheet: &SheetIdentity, breakable: bool);

    /// Register the global page range of a section.
    fn register_section_scope(
        &mut self,
        space: DocumentSpace,
        volume: u32,
        sequence: usize,
        scope: SectionScope,
    );

    /// Forget what was read in the previous pass.
    fn begin_pass(&mut self) {}

    /// Check if a value read in this pass has since changed.
    fn is_dirty(&self) -> bool {
        false
    }
}

/// In-memory cross-reference store.
#[derive(Debug, Clone, Default)]
pub struct CrossReferenceHandler {
    page_numbers: HashMap<String, u32>,
    observed: HashMap<String, Option<u32>>,
    breakable: HashMap<SheetIdentity, bool>,
    scopes: HashMap<(DocumentSpace, u32, usize), SectionScope>,
    dirty: bool,
}

impl CrossReferenceHandler {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered scope of a section, if any.
    pub fn section_scope(&self, space: DocumentSpace, volume: u32, sequence: usize) -> Option<SectionScope> {
        self.scopes.get(&(space, volume, sequence)).copied()
    }

    /// Stored breakability of a sheet, without the default.
    pub fn stored_breakable(&self, sheet: &SheetIdentity) -> Option<bool> {
        self.breakable.get(sheet).copied()
    }

    /// Number of resolved references.
    pub fn resolved_count(&self) -> usize {
        self.page_numbers.len()
    }
}

impl CrossReferences for CrossReferenceHandler {
    fn page_number(&mut self, ref_id: &str) -> Option<u32> {
        let value = self.page_numbers.get(ref_id).copied();
        self.observed.entry(ref_id.to_string()).or_insert(value);
        value
    }

    fn set_page_number(&mut self, ref_id: &str, page: u32) -> bool {
        self.page_numbers.insert(ref_id.to_string(), page);
        let stale = self
            .observed
            .get(ref_id)
            .is_some_and(|seen| *seen != Some(page));
        if stale {
            log::debug!("reference {} moved to page {}", ref_id, page);
            self.dirty = true;
        }
        stale
    }

    fn breakable(&mut self, sheet: &SheetIdentity) -> bool {
        self.breakable.get(sheet).copied().unwrap_or(true)
    }

    fn set_breakable(&mut self, sheet: &SheetIdentity, breakable: bool) {
        self.breakable.insert(*sheet, breakable);
    }

    fn register_section_scope(
        &mut self,
        space: DocumentSpace,
        volume: u32,
        sequence: usize,
        scope: SectionScope,
    ) {
        self.scopes.insert((space, volume, sequence), scope);
    }

    fn begin_pass(&mut self) {
        self.observed.clear();
        self.dirty = false;
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }
}
