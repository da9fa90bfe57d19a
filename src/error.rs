//! Error types for pageflow.

use std::io;
use thiserror::Error;

use crate::context::DocumentSpace;

/// Result type alias for pageflow operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during layout and pagination.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading documents or configuration.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON document or configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A component was driven out of protocol, e.g. pulling a row when none is
    /// available or adding page-area rows after content.
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// A value read earlier in this pass has since resolved differently.
    ///
    /// This is not a failure. The driver reruns pagination for the space.
    #[error("Pagination must restart for {space:?}")]
    RestartPagination {
        /// The document space to re-paginate
        space: DocumentSpace,
    },

    /// An internal invariant does not hold. Always a bug.
    #[error("Internal consistency error: {0}")]
    Internal(String),

    /// The member is deprecated and fails unconditionally.
    #[error("Unsupported operation: {0} is deprecated")]
    Unsupported(&'static str),

    /// The translator could not process a request.
    #[error("Translation error: {0}")]
    Translation(String),

    /// Index is out of range of the available elements.
    #[error("Index {index} is out of range (size {size})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of available elements
        size: usize,
    },

    /// The configuration cannot be laid out.
    #[error("Layout error: {0}")]
    Layout(String),

    /// A page selection string could not be parsed.
    #[error("Invalid page selection: {0}")]
    PageSelection(String),
}

impl Error {
    /// Check if this is the restart signal rather than a failure.
    pub fn is_restart(&self) -> bool {
        matches!(self, Error::RestartPagination { .. })
    }

    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }
}
