//! Pending leader bookkeeping for the row builder.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::formatter::FormatterContext;
use crate::model::{fill, Leader};

/// Leaders waiting to be resolved, oldest first.
///
/// A new leader may be registered while the result that resolves the
/// previous one is still queued, so at most two are held at once.
#[derive(Debug, Clone, Default)]
pub struct LeaderManager {
    leaders: VecDeque<Leader>,
}

impl LeaderManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a leader.
    pub fn add_leader(&mut self, leader: Leader) {
        self.leaders.push_back(leader);
    }

    /// Check if a leader is pending.
    pub fn has_leader(&self) -> bool {
        !self.leaders.is_empty()
    }

    /// Drop the oldest pending leader.
    pub fn remove_leader(&mut self) -> Option<Leader> {
        self.leaders.pop_front()
    }

    /// Drop every pending leader.
    pub fn discard_all(&mut self) {
        self.leaders.clear();
    }

    fn current(&self) -> Result<&Leader> {
        self.leaders
            .front()
            .ok_or_else(|| Error::protocol("no leader is pending"))
    }

    /// Target column of the pending leader within `width`.
    pub fn leader_position(&self, width: usize) -> Result<usize> {
        Ok(self.current()?.target_column(width))
    }

    /// Adjustment for content of `len` characters following the leader.
    pub fn leader_align(&self, len: usize) -> Result<usize> {
        Ok(self.current()?.alignment.adjustment(len))
    }

    /// The translated fill for `len` characters.
    pub fn leader_pattern(&self, fcontext: &FormatterContext, len: usize) -> Result<String> {
        let leader = self.current()?;
        if len == 0 {
            return Ok(String::new());
        }
        let pattern = fcontext.translate_text(&leader.pattern)?;
        if pattern.is_empty() {
            // Nothing to repeat: pad with spaces so the column still lines up.
            return Ok(fill(&fcontext.space_char().to_string(), len));
        }
        Ok(fill(&pattern, len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LeaderAlignment, Position};

    fn leader(pattern: &str, column: usize, alignment: LeaderAlignment) -> Leader {
        Leader {
            pattern: pattern.into(),
            position: Position::Absolute(column),
            alignment,
        }
    }

    #[test]
    fn test_queue_order() {
        let mut manager = LeaderManager::new();
        assert!(!manager.has_leader());
        manager.add_leader(leader(".", 8, LeaderAlignment::Left));
        manager.add_leader(leader("-", 4, LeaderAlignment::Right));
        assert_eq!(manager.leader_position(10).unwrap(), 8);
        manager.remove_leader();
        assert_eq!(manager.leader_position(10).unwrap(), 4);
        assert_eq!(manager.leader_align(3).unwrap(), 3);
        manager.discard_all();
        assert!(!manager.has_leader());
    }

    #[test]
    fn test_no_leader_is_protocol_error() {
        let manager = LeaderManager::new();
        assert!(matches!(manager.leader_position(10), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_pattern() {
        let fcontext = FormatterContext::default();
        let mut manager = LeaderManager::new();
        manager.add_leader(leader("-=", 8, LeaderAlignment::Left));
        assert_eq!(manager.leader_pattern(&fcontext, 5).unwrap(), "-=-=-");
        assert_eq!(manager.leader_pattern(&fcontext, 0).unwrap(), "");

        manager.remove_leader();
        manager.add_leader(leader("", 8, LeaderAlignment::Left));
        assert_eq!(manager.leader_pattern(&fcontext, 3).unwrap(), "   ");
    }
}
