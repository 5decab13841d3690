use super::level::Level;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TopologyError {
    #[error("{level} index {index} is out of range for {len} {level}(s)")]
    IndexOutOfRange {
        level: Level,
        index: usize,
        len: usize,
    },

    #[error("Length mismatch: expected {expected} target indices, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    #[error("{level} attribute '{name}' is already registered")]
    DuplicateAttribute { level: Level, name: String },
}

impl TopologyError {
    /// Returns `Ok(())` when `index` addresses one of the `len` items at `level`.
    pub(crate) fn check_index(level: Level, index: usize, len: usize) -> Result<(), Self> {
        if index < len {
            Ok(())
        } else {
            Err(TopologyError::IndexOutOfRange { level, index, len })
        }
    }
}
