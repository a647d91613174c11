use thiserror::Error;

/// Failure to address a column within a record.
///
/// Returned wrapped in an [anyhow::Error]; use `downcast_ref::<RecordError>()` to inspect it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Columns are numbered from 1.
    #[error("column index must start at 1, got {0}")]
    InvalidColumn(usize),

    /// The record ends before the addressed column slice does.
    #[error("record of {length} bytes is too short for column {column} at bytes {start}..{end}")]
    ShortRecord {
        column: usize,
        start: usize,
        end: usize,
        length: usize,
    },

    /// The column slice does not start or end on a character boundary.
    #[error("column {column} at bytes {start}..{end} splits a multi-byte character")]
    CharBoundary {
        column: usize,
        start: usize,
        end: usize,
    },
}
