use std::path::{Path, PathBuf};

use anyhow::anyhow;

use crate::schema::Schema;

#[derive(Clone, Debug)]
pub(crate) struct Config {
    tmp: PathBuf,
    tmp_prefix: String,
    tmp_suffix: String,
    block_size: usize,
    blocks: usize,
    safety_factor: usize,
    schema: Schema,
    raise_open_files: bool,
}

impl Config {
    pub(crate) fn new(
        tmp: PathBuf,
        tmp_prefix: String,
        tmp_suffix: String,
        block_size: usize,
        blocks: usize,
        safety_factor: usize,
        schema: Schema,
        raise_open_files: bool,
    ) -> Result<Config, anyhow::Error> {
        if block_size == 0 {
            return Err(anyhow!("Block size must be positive"));
        }
        if blocks < 3 {
            return Err(anyhow!("At least 3 blocks are required for a merge fan-in of 2, got {}", blocks));
        }
        if safety_factor == 0 {
            return Err(anyhow!("Safety factor must be positive"));
        }
        if tmp_prefix.is_empty() {
            return Err(anyhow!("Run file prefix must not be empty"));
        }
        Ok(
            Config {
                tmp,
                tmp_prefix,
                tmp_suffix,
                block_size,
                blocks,
                safety_factor,
                schema,
                raise_open_files,
            }
        )
    }

    pub(crate) fn tmp(&self) -> &Path {
        &self.tmp
    }

    pub(crate) fn tmp_prefix(&self) -> &str {
        &self.tmp_prefix
    }

    pub(crate) fn tmp_suffix(&self) -> &str {
        &self.tmp_suffix
    }

    pub(crate) fn block_size(&self) -> usize {
        self.block_size
    }

    /// Bytes that may be held in memory by one operation
    pub(crate) fn memory_budget(&self) -> u64 {
        self.block_size as u64 * self.blocks as u64
    }

    /// One block is reserved for the output of a merge
    pub(crate) fn fan_in(&self) -> usize {
        self.blocks - 1
    }

    pub(crate) fn safety_factor(&self) -> u64 {
        self.safety_factor as u64
    }

    pub(crate) fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn raise_open_files(&self) -> bool {
        self.raise_open_files
    }
}
