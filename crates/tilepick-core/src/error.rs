//! Error types for tilepick.

use thiserror::Error;

/// The main error type for picking operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PickError {
    /// A selection request was cancelled before it was dispatched to a worker.
    #[error("selection request {id} cancelled")]
    Cancelled {
        /// Id of the cancelled request.
        id: u64,
    },

    /// The resolving side of a selection future was dropped without answering.
    #[error("selection request abandoned")]
    Abandoned,
}

/// A specialized Result type for picking operations.
pub type Result<T> = std::result::Result<T, PickError>;
