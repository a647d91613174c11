use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use tempfile::Builder;

use crate::config::Config;
use crate::line_record::LineRecord;

/// A sorted run persisted in the scratch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunFile {
    path: PathBuf,
    lines: usize,
}

impl RunFile {
    pub(crate) fn new(path: PathBuf, lines: usize) -> RunFile {
        RunFile {
            path,
            lines,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn lines(&self) -> usize {
        self.lines
    }

    pub(crate) fn remove(self) -> Result<(), anyhow::Error> {
        std::fs::remove_file(&self.path)
            .with_context(|| anyhow!("Remove run: {}", self.path.display()))?;
        log::debug!("Removed run {}", self.path.display());
        Ok(())
    }
}

/// Create an empty run file in the scratch directory. The file is not removed on drop.
pub(crate) fn create_run_file(config: &Config) -> Result<(File, PathBuf), anyhow::Error> {
    let tmp_file = Builder::new()
        .prefix(config.tmp_prefix())
        .suffix(config.tmp_suffix())
        .tempfile_in(config.tmp())
        .with_context(|| anyhow!("Failed to create new run file in {}", config.tmp().display()))?;
    let (file, path) = tmp_file
        .keep()
        .or_else(|e| Err(anyhow!("Failed to persist run file: {}", e.to_string())))?;
    Ok((file, path))
}

/// Write a sorted chunk as a new run.
pub(crate) fn write_sorted_chunk(chunk: &[LineRecord], config: &Config) -> Result<RunFile, anyhow::Error> {
    let (file, path) = create_run_file(config)?;
    let mut buf_writer = BufWriter::with_capacity(config.block_size(), file);
    for line_record in chunk {
        buf_writer.write_all(line_record.line().as_bytes())
            .and_then(|_| buf_writer.write_all(b"\n"))
            .with_context(|| anyhow!("Write run: {}", path.display()))?;
    }
    buf_writer.flush()
        .with_context(|| anyhow!("Write run: {}", path.display()))?;
    log::debug!("Wrote run {} with {} lines", path.display(), chunk.len());
    Ok(RunFile::new(path, chunk.len()))
}

/// Runs left in the scratch directory, in file name order.
pub(crate) fn list_run_files(config: &Config) -> Result<Vec<PathBuf>, anyhow::Error> {
    let mut paths = Vec::new();
    let entries = std::fs::read_dir(config.tmp())
        .with_context(|| anyhow!("Read scratch directory: {}", config.tmp().display()))?;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(config.tmp_prefix()) && name.ends_with(config.tmp_suffix()) && entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}
