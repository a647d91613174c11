use std::cmp::Ordering;
use std::ops::Range;

use anyhow::anyhow;

use crate::schema::Schema;

/// A record together with the byte range of its sort column.
///
/// Ordering looks at the key slice only, so two records with equal keys compare as equal.
#[derive(Debug)]
pub(crate) struct LineRecord {
    line: String,
    key: Range<usize>,
}

impl LineRecord {
    /// `line` must not carry its line terminator.
    pub(crate) fn new(line: String, schema: &Schema, column: usize) -> Result<LineRecord, anyhow::Error> {
        let key = schema.checked_range(line.as_str(), column).or_else(
            |e| Err(anyhow!(e).context(format!("line: {line}")))
        )?;
        Ok(
            LineRecord {
                line,
                key,
            }
        )
    }

    pub(crate) fn key(&self) -> &str {
        &self.line[self.key.clone()]
    }

    pub(crate) fn line(&self) -> &str {
        self.line.as_str()
    }
}

/// Strip a trailing `\n` or `\r\n`.
pub(crate) fn trim_line_end(line: &mut String) {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
}

impl Eq for LineRecord {}

impl PartialEq<Self> for LineRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl PartialOrd<Self> for LineRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LineRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(other.key())
    }
}
