use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};

use crate::config::Config;
use crate::line_record::{LineRecord, trim_line_end};
use crate::predicate::LinePredicate;

/// Number of lines read into one in-memory chunk.
///
/// The first line of the input is taken as representative of every record. Both its length and
/// the input length are scaled by the safety factor, the in-memory footprint estimate of a byte
/// read from disk. The buffer is the smaller of the memory budget and the scaled input, so small
/// inputs are read in a single chunk.
pub(crate) fn lines_per_chunk(first_line_length: u64, input_length: u64, config: &Config) -> u64 {
    let line_size = (first_line_length * config.safety_factor()).max(1);
    let buffer_size = config.memory_budget().min(input_length * config.safety_factor());
    buffer_size.div_ceil(line_size).max(1)
}

fn probe_first_line(path: &Path) -> Result<Option<u64>, anyhow::Error> {
    let file = File::open(path)
        .with_context(|| anyhow!("path: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    trim_line_end(&mut line);
    Ok(Some(line.len() as u64))
}

/// Reads the input in chunks of at most `lines` lines, keeping the lines accepted by the predicate.
///
/// A chunk with no accepted lines is skipped, the iterator ends when the input is exhausted.
pub(crate) struct ChunkIterator<'a> {
    path: PathBuf,
    reader: BufReader<File>,
    lines: u64,
    line_number: u64,
    column: usize,
    config: &'a Config,
    predicate: &'a dyn LinePredicate,
    done: bool,
}

impl<'a> ChunkIterator<'a> {
    pub(crate) fn new(path: &Path, column: usize, config: &'a Config, predicate: &'a dyn LinePredicate) -> Result<ChunkIterator<'a>, anyhow::Error> {
        let length = path.metadata()
            .with_context(|| anyhow!("path: {}", path.display()))?
            .len();
        let (lines, done) = match probe_first_line(path)? {
            None => (1, true),
            Some(first_line_length) => (lines_per_chunk(first_line_length, length, config), false),
        };
        let file = File::open(path)
            .with_context(|| anyhow!("path: {}", path.display()))?;

        Ok(
            ChunkIterator {
                path: path.to_path_buf(),
                reader: BufReader::with_capacity(config.block_size(), file),
                lines,
                line_number: 0,
                column,
                config,
                predicate,
                done,
            }
        )
    }

    pub(crate) fn lines(&self) -> u64 {
        self.lines
    }

    /// Ok(None) when no line was left to read
    fn read_chunk(&mut self) -> Result<Option<Vec<LineRecord>>, anyhow::Error> {
        let mut line_records = Vec::new();
        let mut read = 0;
        let mut line = String::new();
        while read < self.lines && self.reader.read_line(&mut line)? != 0 {
            read += 1;
            self.line_number += 1;
            trim_line_end(&mut line);
            let accepted = self.predicate.test(line.as_str())
                .with_context(|| format!("file: {}, line: {}", self.path.display(), self.line_number))?;
            if accepted {
                let line_record = LineRecord::new(line, self.config.schema(), self.column)
                    .with_context(|| format!("file: {}, line: {}", self.path.display(), self.line_number))?;
                line_records.push(line_record);
                line = String::new();
            } else {
                line.clear();
            }
        }
        if read == 0 {
            Ok(None)
        } else {
            Ok(Some(line_records))
        }
    }
}

impl Iterator for ChunkIterator<'_> {
    type Item = Result<Vec<LineRecord>, anyhow::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.read_chunk() {
                Ok(Some(chunk)) if chunk.is_empty() => continue,
                Ok(Some(chunk)) => return Some(Ok(chunk)),
                Ok(None) => self.done = true,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use crate::chunk_iterator::{ChunkIterator, lines_per_chunk};
    use crate::config::Config;
    use crate::error::RecordError;
    use crate::predicate::{AcceptAll, SelectPredicate};
    use crate::schema::Schema;

    fn config(tmp: PathBuf, block_size: usize, blocks: usize) -> Result<Config, anyhow::Error> {
        Config::new(tmp, "run-".to_string(), ".run".to_string(), block_size, blocks, 2, Schema::new(4, 1), false)
    }

    #[test]
    fn test_lines_per_chunk() -> Result<(), anyhow::Error> {
        let config = config(PathBuf::from("."), 20, 4)?;
        // budget 80, estimated line 2 * 20
        assert_eq!(lines_per_chunk(20, 105, &config), 2);
        // input smaller than the budget
        assert_eq!(lines_per_chunk(20, 30, &config), 2);
        assert_eq!(lines_per_chunk(20, 10, &config), 1);
        assert_eq!(lines_per_chunk(30, 1000, &config), 2);
        assert_eq!(lines_per_chunk(0, 1000, &config), 80);
        assert_eq!(lines_per_chunk(20, 0, &config), 1);
        Ok(())
    }

    #[test]
    fn test_empty_file() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("empty.dat");
        fs::write(&input, "")?;
        let config = config(dir.path().to_path_buf(), 20, 4)?;
        let chunks = ChunkIterator::new(&input, 1, &config, &AcceptAll)?;
        assert_eq!(chunks.count(), 0);
        Ok(())
    }

    #[test]
    fn test_no_lines_lost() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("input.dat");
        let lines: Vec<String> = (0..25).map(|i| format!("{:04}", 100 - i)).collect();
        fs::write(&input, lines.join("\n"))?;
        // budget 32 bytes, estimated line 8 bytes
        let config = config(dir.path().to_path_buf(), 8, 4)?;
        let chunks = ChunkIterator::new(&input, 1, &config, &AcceptAll)?;
        assert_eq!(chunks.lines(), 4);
        let mut read = Vec::new();
        let mut count = 0;
        for chunk in chunks {
            let chunk = chunk?;
            assert!(chunk.len() <= 4);
            count += 1;
            read.extend(chunk.iter().map(|r| r.line().to_string()));
        }
        assert_eq!(count, 7);
        assert_eq!(read, lines);
        Ok(())
    }

    #[test]
    fn test_filtered_chunks_do_not_stop_reading() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("input.dat");
        fs::write(&input, "aaaa\nbbbb\ncccc\ndddd\nxaaa\neeee\nffff\nxbbb\n")?;
        let config = config(dir.path().to_path_buf(), 4, 4)?;
        let predicate = SelectPredicate::new(Schema::new(4, 1), 1, "x".to_string())?;
        let chunks = ChunkIterator::new(&input, 1, &config, &predicate)?;
        assert_eq!(chunks.lines(), 2);
        let mut read = Vec::new();
        for chunk in chunks {
            read.extend(chunk?.iter().map(|r| r.line().to_string()));
        }
        assert_eq!(read, vec!["xaaa".to_string(), "xbbb".to_string()]);
        Ok(())
    }

    #[test]
    fn test_malformed_record() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("input.dat");
        fs::write(&input, "aaaa bbbb\ncccc dd\n")?;
        let config = config(dir.path().to_path_buf(), 1024, 4)?;
        let mut chunks = ChunkIterator::new(&input, 2, &config, &AcceptAll)?;
        let error = chunks.next().unwrap().unwrap_err();
        assert!(matches!(error.downcast_ref::<RecordError>(), Some(RecordError::ShortRecord { .. })));
        assert!(error.to_string().contains("line: 2"));
        assert!(chunks.next().is_none());
        Ok(())
    }
}
