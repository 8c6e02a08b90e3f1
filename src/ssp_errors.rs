use thiserror::Error;

use crate::constants::{DiaSourceId, SsObjectId};

#[derive(Error, Debug)]
pub enum SspError {
    #[error(
        "Mismatch in number of SSSource rows after DiaSource join: {sources} vs {joined} (first unmatched diaSourceId: {first_missing})"
    )]
    JoinRowCountMismatch {
        sources: usize,
        joined: usize,
        first_missing: DiaSourceId,
    },

    #[error("Duplicate diaSourceId in DiaSource table: {0}")]
    DuplicateDetection(DiaSourceId),

    #[error("Aggregation group mixes objects: expected ssObjectId {expected}, found {found}")]
    MixedObjectGroup {
        expected: SsObjectId,
        found: SsObjectId,
    },

    #[error("Aggregation called on an empty observation group")]
    EmptyObjectGroup,

    #[error("Unknown photometric band: {0:?}")]
    UnknownBand(String),

    #[error("Invalid phase-curve fit parameters: {0}")]
    InvalidFitParams(String),

    #[error("Invalid aggregation parameters: {0}")]
    InvalidAggregationParams(String),

    #[error("Invalid Parquet writer configuration: {0}")]
    InvalidWriterConfig(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow_schema::ArrowError),

    #[error("Column '{0}' not found in schema")]
    MissingColumn(String),

    #[error("Invalid column content: {0}")]
    InvalidColumn(String),
}

impl SspError {
    /// True for input contract breaches that must abort the whole batch.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            SspError::JoinRowCountMismatch { .. }
                | SspError::DuplicateDetection(_)
                | SspError::MixedObjectGroup { .. }
                | SspError::EmptyObjectGroup
        )
    }
}

impl PartialEq for SspError {
    fn eq(&self, other: &Self) -> bool {
        use SspError::*;
        match (self, other) {
            (
                JoinRowCountMismatch {
                    sources: a,
                    joined: b,
                    first_missing: c,
                },
                JoinRowCountMismatch {
                    sources: x,
                    joined: y,
                    first_missing: z,
                },
            ) => a == x && b == y && c == z,
            (DuplicateDetection(a), DuplicateDetection(b)) => a == b,
            (
                MixedObjectGroup {
                    expected: a,
                    found: b,
                },
                MixedObjectGroup {
                    expected: x,
                    found: y,
                },
            ) => a == x && b == y,
            (EmptyObjectGroup, EmptyObjectGroup) => true,
            (UnknownBand(a), UnknownBand(b)) => a == b,
            (InvalidFitParams(a), InvalidFitParams(b)) => a == b,
            (InvalidAggregationParams(a), InvalidAggregationParams(b)) => a == b,
            (InvalidWriterConfig(a), InvalidWriterConfig(b)) => a == b,
            (MissingColumn(a), MissingColumn(b)) => a == b,
            (InvalidColumn(a), InvalidColumn(b)) => a == b,

            // wrapped foreign errors are not comparable: same variant means equal
            (IoError(_), IoError(_)) => true,
            (ParquetError(_), ParquetError(_)) => true,
            (ArrowError(_), ArrowError(_)) => true,

            _ => false,
        }
    }
}
