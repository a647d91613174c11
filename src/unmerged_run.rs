use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::line_record::{LineRecord, trim_line_end};
use crate::schema::Schema;

/// A run being consumed by a merge, positioned at its smallest unread record.
///
/// Runs order by their head record and then by their position in the merge, so that among equal
/// heads the run listed first is drained first.
#[derive(Debug)]
pub(crate) struct UnmergedRun {
    index: usize,
    path: PathBuf,
    reader: BufReader<File>,
    head: LineRecord,
    line_number: u64,
    schema: Schema,
    column: usize,
}

impl UnmergedRun {
    /// Ok(None) for an empty run
    pub(crate) fn open(index: usize, path: &Path, schema: &Schema, column: usize, capacity: usize) -> Result<Option<UnmergedRun>, anyhow::Error> {
        let file = File::open(path).with_context(|| format!("path: {}", path.display()))?;
        let mut reader = BufReader::with_capacity(capacity, file);
        match Self::read_record(&mut reader, path, 1, schema, column)? {
            None => Ok(None),
            Some(head) => Ok(
                Some(
                    UnmergedRun {
                        index,
                        path: path.to_path_buf(),
                        reader,
                        head,
                        line_number: 1,
                        schema: *schema,
                        column,
                    }
                )
            ),
        }
    }

    fn read_record(reader: &mut BufReader<File>, path: &Path, line_number: u64, schema: &Schema, column: usize) -> Result<Option<LineRecord>, anyhow::Error> {
        let mut line = String::new();
        let bytes = reader.read_line(&mut line)
            .with_context(|| format!("path: {}, line: {}", path.display(), line_number))?;
        if bytes == 0 {
            return Ok(None);
        }
        trim_line_end(&mut line);
        let line_record = LineRecord::new(line, schema, column)
            .with_context(|| format!("path: {}, line: {}", path.display(), line_number))?;
        Ok(Some(line_record))
    }

    pub(crate) fn head(&self) -> &LineRecord {
        &self.head
    }

    /// Move to the next record. Returns false once the run is exhausted, the head is then stale.
    pub(crate) fn advance(&mut self) -> Result<bool, anyhow::Error> {
        let next = Self::read_record(&mut self.reader, &self.path, self.line_number + 1, &self.schema, self.column)?;
        match next {
            None => Ok(false),
            Some(line_record) => {
                self.line_number += 1;
                self.head = line_record;
                Ok(true)
            }
        }
    }
}

impl Eq for UnmergedRun {}

impl PartialEq<Self> for UnmergedRun {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd<Self> for UnmergedRun {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UnmergedRun {
    fn cmp(&self, other: &Self) -> Ordering {
        self.head.cmp(&other.head)
            .then_with(|| self.index.cmp(&other.index))
    }
}
