use std::cmp::Ordering;
use std::ops::Range;

use crate::error::RecordError;

/// Layout of a fixed-width record.
///
/// Every column occupies `column_length` bytes followed by `separator_length` bytes of separator.
/// Column `c` (starting at 1) therefore occupies the bytes
/// `[(c - 1) * (column_length + separator_length), (c - 1) * (column_length + separator_length) + column_length)`.
/// The number of columns is not stored, it is implied by the length of each line.
///
/// # Examples
/// ```
/// use fixed_width_sort::schema::Schema;
///
/// let schema = Schema::new(4, 1);
/// assert_eq!(schema.column("abcd efgh", 2).unwrap(), "efgh");
/// assert!(schema.column("abcd ef", 2).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schema {
    column_length: usize,
    separator_length: usize,
}

impl Schema {
    /// Create a new [Schema]
    ///
    /// # Arguments
    /// * `column_length` - the width of each column in bytes
    /// * `separator_length` - the width of the separator following each column in bytes
    pub fn new(column_length: usize, separator_length: usize) -> Schema {
        Schema {
            column_length,
            separator_length,
        }
    }

    /// Get the column width
    pub fn column_length(&self) -> usize {
        self.column_length
    }

    /// Get the separator width
    pub fn separator_length(&self) -> usize {
        self.separator_length
    }

    /// Specify the column width
    pub fn with_column_length(mut self, column_length: usize) -> Schema {
        self.column_length = column_length;
        self
    }

    /// Specify the separator width
    pub fn with_separator_length(mut self, separator_length: usize) -> Schema {
        self.separator_length = separator_length;
        self
    }

    /// Byte range of `column` in a record. Fails only for column 0.
    pub fn column_range(&self, column: usize) -> Result<Range<usize>, RecordError> {
        if column == 0 {
            return Err(RecordError::InvalidColumn(column));
        }
        let start = (column - 1) * (self.column_length + self.separator_length);
        Ok(start..start + self.column_length)
    }

    /// Byte range of `column` in `line`, checked against the line length and character boundaries.
    pub fn checked_range(&self, line: &str, column: usize) -> Result<Range<usize>, RecordError> {
        let range = self.column_range(column)?;
        if range.end > line.len() {
            return Err(
                RecordError::ShortRecord {
                    column,
                    start: range.start,
                    end: range.end,
                    length: line.len(),
                }
            );
        }
        if !line.is_char_boundary(range.start) || !line.is_char_boundary(range.end) {
            return Err(
                RecordError::CharBoundary {
                    column,
                    start: range.start,
                    end: range.end,
                }
            );
        }
        Ok(range)
    }

    /// The slice of `line` holding `column`.
    pub fn column<'a>(&self, line: &'a str, column: usize) -> Result<&'a str, RecordError> {
        let range = self.checked_range(line, column)?;
        Ok(&line[range])
    }

    /// Compare two records by the bytes of one column.
    ///
    /// The order is case sensitive and follows code points, which for UTF-8 is the byte order.
    pub fn compare(&self, column: usize, a: &str, b: &str) -> Result<Ordering, RecordError> {
        Ok(self.column(a, column)?.cmp(self.column(b, column)?))
    }
}

impl Default for Schema {
    /// 20 byte columns separated by a single byte
    fn default() -> Self {
        Schema::new(20, 1)
    }
}
