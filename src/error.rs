//! Domain errors raised by the reader core.
//!
//! Infrastructure code (database, settings, session storage) reports failures through
//! `anyhow::Result`; these variants cover contract violations in the core itself.

use thiserror::Error;

use crate::catalog::PositionInput;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReaderError {
    /// Navigation input does not address a unit of the item.
    #[error("invalid position {position} for content item {item_id}: {reason}")]
    InvalidPosition {
        item_id: String,
        position: PositionInput,
        reason: String,
    },

    /// Content item breaks a structural invariant.
    #[error("invalid content item {item_id}: {reason}")]
    InvalidContent { item_id: String, reason: String },

    /// Finalized vibe selection must hold between 3 and 5 tags.
    #[error("vibe selection must contain between 3 and 5 tags, got {count}")]
    InvalidVibeSelection { count: usize },
}

pub type Result<T> = std::result::Result<T, ReaderError>;
