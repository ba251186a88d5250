//! Error types for multialn
//!
//! Defines all error types used throughout the library.

use crate::core::bits::BitIndexHandle;
use crate::core::region::SequenceId;
use crate::formats::maf::MafParseError;
use thiserror::Error;

/// Main error type for multialn operations
#[derive(Debug, Error)]
pub enum MultialnError {
    /// Alignment file parsing errors
    #[error("MAF parse error: {0}")]
    MafParse(#[from] MafParseError),

    /// Coordinate mapping errors
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`MappingError`]
///
/// `OutOfRange` and `SequenceAbsent` are the expected outcomes of probing
/// positions that are not aligned; callers mapping many positions usually
/// count them as misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    OutOfRange,
    SequenceAbsent,
    NonCollinear,
    Exhaustion,
    /// Caller error (bad interval, unbound index)
    Usage,
}

/// Errors that can occur during coordinate mapping
///
/// The hot variants carry only integers so that raising them on every miss
/// costs nothing beyond the return value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// Position or column is outside the span being queried
    #[error("Position {position} is not covered by the alignment")]
    OutOfRange { position: u64 },

    /// Sequence is not a member of the block
    #[error("Sequence {id} is not present in this block")]
    SequenceAbsent { id: SequenceId },

    /// Sequence name was never registered
    #[error("Unknown sequence: {0}")]
    UnknownSequence(String),

    /// Target sequence reverses direction or strand inside the region
    #[error("Region {start}-{end} does not map collinearly")]
    NonCollinear { start: u64, end: u64 },

    /// Invalid coordinate range
    #[error("Invalid coordinate range: start ({start}) > end ({end})")]
    InvalidRange { start: u64, end: u64 },

    /// No sequence identifiers left
    #[error("Sequence identifier space exhausted")]
    IdentifiersExhausted,

    /// A region refers to a bit index that was never finalized
    #[error("Bit index {0} has not been finalized")]
    UnboundIndex(BitIndexHandle),
}

impl MappingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MappingError::OutOfRange { .. } => ErrorKind::OutOfRange,
            MappingError::SequenceAbsent { .. } | MappingError::UnknownSequence(_) => {
                ErrorKind::SequenceAbsent
            }
            MappingError::NonCollinear { .. } => ErrorKind::NonCollinear,
            MappingError::IdentifiersExhausted => ErrorKind::Exhaustion,
            MappingError::InvalidRange { .. } | MappingError::UnboundIndex(_) => ErrorKind::Usage,
        }
    }

    /// True for the misses a bulk query should count rather than propagate
    pub fn is_miss(&self) -> bool {
        matches!(self.kind(), ErrorKind::OutOfRange | ErrorKind::SequenceAbsent)
    }

    pub(crate) fn out_of_range(position: u64) -> Self {
        MappingError::OutOfRange { position }
    }
}

/// Result type alias for multialn operations
pub type Result<T> = std::result::Result<T, MultialnError>;

/// Result type alias for mapping operations
pub type MappingResult<T> = std::result::Result<T, MappingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(MappingError::out_of_range(3).kind(), ErrorKind::OutOfRange);
        assert_eq!(
            MappingError::SequenceAbsent { id: SequenceId::new(2) }.kind(),
            ErrorKind::SequenceAbsent
        );
        assert_eq!(
            MappingError::UnknownSequence("hg19".into()).kind(),
            ErrorKind::SequenceAbsent
        );
        assert_eq!(
            MappingError::NonCollinear { start: 1, end: 2 }.kind(),
            ErrorKind::NonCollinear
        );
        assert_eq!(MappingError::IdentifiersExhausted.kind(), ErrorKind::Exhaustion);
    }

    #[test]
    fn test_is_miss() {
        assert!(MappingError::out_of_range(0).is_miss());
        assert!(MappingError::UnknownSequence("x".into()).is_miss());
        assert!(!MappingError::NonCollinear { start: 0, end: 9 }.is_miss());
        assert!(!MappingError::InvalidRange { start: 9, end: 0 }.is_miss());
    }

    #[test]
    fn test_error_display() {
        let err = MappingError::InvalidRange { start: 10, end: 5 };
        assert_eq!(err.to_string(), "Invalid coordinate range: start (10) > end (5)");

        let err: MultialnError = MappingError::out_of_range(42).into();
        assert_eq!(
            err.to_string(),
            "Mapping error: Position 42 is not covered by the alignment"
        );
    }
}
