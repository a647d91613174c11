use anyhow::anyhow;

use crate::schema::Schema;

/// Decides which lines take part in an operation.
pub(crate) trait LinePredicate {
    /// `line` is passed without its line terminator.
    fn test(&self, line: &str) -> Result<bool, anyhow::Error>;
}

/// Keeps every line, used by the plain sort.
pub(crate) struct AcceptAll;

impl LinePredicate for AcceptAll {
    fn test(&self, _line: &str) -> Result<bool, anyhow::Error> {
        Ok(true)
    }
}

/// Keeps lines whose column slice contains a substring.
pub(crate) struct SelectPredicate {
    schema: Schema,
    column: usize,
    substring: String,
}

impl SelectPredicate {
    pub(crate) fn new(schema: Schema, column: usize, substring: String) -> Result<SelectPredicate, anyhow::Error> {
        schema.column_range(column)?;
        Ok(
            SelectPredicate {
                schema,
                column,
                substring,
            }
        )
    }
}

impl LinePredicate for SelectPredicate {
    fn test(&self, line: &str) -> Result<bool, anyhow::Error> {
        // lines shorter than the column number are skipped rather than treated as malformed
        if line.len() < self.column {
            return Ok(false);
        }
        let slice = self.schema.column(line, self.column).or_else(
            |e| Err(anyhow!(e).context(format!("line: {line}")))
        )?;
        Ok(slice.contains(self.substring.as_str()))
    }
}
