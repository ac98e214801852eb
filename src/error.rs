use thiserror::Error;

use crate::world::WorldKey;

/// Errors that can leave the progression core.
#[derive(Debug, Error)]
pub enum ProgressionError {
    /// The requested world has no loadable asset. Fatal for the session.
    #[error("no loadable level for world {world}: {reason}")]
    ConfigurationError { world: WorldKey, reason: String },

    /// A defect in the progression bookkeeping.
    #[error("progression invariant violated: {0}")]
    InvariantViolation(String),
}

pub type ProgressionResult<T> = Result<T, ProgressionError>;
