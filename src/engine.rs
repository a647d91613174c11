use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use rlimit::{getrlimit, Resource, setrlimit};

use crate::chunk_iterator::ChunkIterator;
use crate::config::Config;
use crate::line_record::{LineRecord, trim_line_end};
use crate::merger::merge_runs;
pub use crate::merger::MergeStats;
use crate::predicate::{AcceptAll, LinePredicate, SelectPredicate};
use crate::run_file::{list_run_files, write_sorted_chunk};
use crate::schema::Schema;
use crate::selector::select_lines;

/// Sort and select fixed-width records in text files larger than memory.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use fixed_width_sort::engine::Engine;
///
/// fn sort_by_second_column(input: &Path, output: &Path, tmp: &Path) -> Result<(), anyhow::Error> {
///     let mut engine = Engine::new();
///     // hold at most 64 MB of records in memory and merge up to 255 runs at a time
///     engine.with_block_size(262_144);
///     engine.with_blocks(256);
///     engine.sort(input, output, 2, tmp)
/// }
/// ```
pub struct Engine {
    block_size: usize,
    blocks: usize,
    safety_factor: usize,
    schema: Schema,
    run_prefix: String,
    run_suffix: String,
    raise_open_files: bool,
}

impl Engine {
    /// Create a default Engine definition.
    ///
    /// * The memory budget is 640 blocks of 32 KB, leaving a merge fan-in of 639 runs
    /// * Records are made of 20 byte columns separated by a single byte
    /// * Record size in memory is estimated at twice its size on disk
    /// * Runs are named `sorted-run-*.run`
    ///
    /// The Engine will increase the file descriptor rlimit to accommodate the merge fan-in.
    pub fn new() -> Engine {
        Engine {
            block_size: 32768,
            blocks: 640,
            safety_factor: 2,
            schema: Schema::default(),
            run_prefix: "sorted-run-".to_string(),
            run_suffix: ".run".to_string(),
            raise_open_files: true,
        }
    }

    /// Set the block size in bytes. Readers and writers are buffered with one block each.
    pub fn with_block_size(&mut self, block_size: usize) {
        self.block_size = block_size;
    }

    /// Set the number of blocks. The memory budget is `block_size * blocks` and a merge reads
    /// at most `blocks - 1` runs at a time. At least 3 blocks are required.
    pub fn with_blocks(&mut self, blocks: usize) {
        self.blocks = blocks;
    }

    /// Set the ratio of the in-memory size of a record to its size on disk.
    pub fn with_safety_factor(&mut self, safety_factor: usize) {
        self.safety_factor = safety_factor;
    }

    /// Set the record layout
    pub fn with_schema(&mut self, schema: Schema) {
        self.schema = schema;
    }

    /// Set the file name prefix and suffix of runs in the scratch directory.
    pub fn with_run_names(&mut self, prefix: &str, suffix: &str) {
        self.run_prefix = prefix.to_string();
        self.run_suffix = suffix.to_string();
    }

    /// Do not touch the file descriptor rlimit
    pub fn with_fixed_open_files(&mut self) {
        self.raise_open_files = false;
    }

    /// Sort `input` into `output` by `column`, using `tmp` for runs.
    pub fn sort(&self, input: &Path, output: &Path, column: usize, tmp: &Path) -> Result<(), anyhow::Error> {
        log::info!("Start sort of {} by column {}", input.display(), column);
        let config = self.create_config(tmp)?;
        config.schema().column_range(column)?;
        let stats = Self::internal_sort(input, output, column, &config, &AcceptAll)?;
        log::info!("Finish sort of {}, {} lines in {} merge rounds", input.display(), stats.lines(), stats.rounds());
        Ok(())
    }

    /// Copy the lines of `input` whose `column` contains `substring` to `output`, keeping their order.
    ///
    /// The scratch directory is not used.
    pub fn select(&self, input: &Path, output: &Path, column: usize, substring: &str, tmp: &Path) -> Result<(), anyhow::Error> {
        log::info!("Start select from {} where column {} contains {:?}", input.display(), column, substring);
        let config = self.create_config(tmp)?;
        let predicate = SelectPredicate::new(*config.schema(), column, substring.to_string())?;
        let selected = select_lines(input, output, &predicate, config.block_size())?;
        log::info!("Finish select from {}, {} lines selected", input.display(), selected);
        Ok(())
    }

    /// Sort the lines of `input` whose `select_column` contains `substring` into `output` by
    /// `sort_column`.
    ///
    /// Lines are filtered while chunks are read, so rejected lines never reach a run.
    pub fn sort_and_select(&self, input: &Path, output: &Path, sort_column: usize, tmp: &Path, select_column: usize, substring: &str) -> Result<(), anyhow::Error> {
        log::info!(
            "Start sort of {} by column {} where column {} contains {:?}",
            input.display(),
            sort_column,
            select_column,
            substring
        );
        let config = self.create_config(tmp)?;
        config.schema().column_range(sort_column)?;
        let predicate = SelectPredicate::new(*config.schema(), select_column, substring.to_string())?;
        let stats = Self::internal_sort(input, output, sort_column, &config, &predicate)?;
        log::info!("Finish sort of {}, {} lines selected in {} merge rounds", input.display(), stats.lines(), stats.rounds());
        Ok(())
    }

    /// Merge the runs left in `tmp` into `output` by `column`.
    ///
    /// Every file in `tmp` named with the run prefix and suffix is taken as a sorted run, in file
    /// name order. The runs are removed once merged.
    pub fn merge(&self, output: &Path, column: usize, tmp: &Path) -> Result<MergeStats, anyhow::Error> {
        let config = self.create_config(tmp)?;
        config.schema().column_range(column)?;
        let runs = list_run_files(&config)?;
        log::info!("Found {} runs in {}", runs.len(), tmp.display());
        Self::with_open_files(&config, || merge_runs(runs, output, column, &config))
    }

    /// Check whether `input` is sorted by `column`.
    pub fn check(&self, input: &Path, column: usize) -> Result<bool, anyhow::Error> {
        let mut line = String::new();
        let mut line_number: u64 = 0;
        let mut previous: Option<LineRecord> = None;
        let mut reader = BufReader::new(
            File::open(input).with_context(|| anyhow!("path: {}", input.display()))?
        );
        while reader.read_line(&mut line)? != 0 {
            line_number += 1;
            trim_line_end(&mut line);
            let current_line_record = LineRecord::new(line, &self.schema, column)
                .with_context(|| format!("file: {}, line: {}", input.display(), line_number))?;
            if let Some(previous_line_record) = &previous {
                if previous_line_record > &current_line_record {
                    log::info!("{} is not sorted by column {} at line {}", input.display(), column, line_number);
                    return Ok(false);
                }
            }
            previous = Some(current_line_record);
            line = String::new();
        }
        Ok(true)
    }

    fn create_config(&self, tmp: &Path) -> Result<Config, anyhow::Error> {
        Config::new(
            tmp.to_path_buf(),
            self.run_prefix.clone(),
            self.run_suffix.clone(),
            self.block_size,
            self.blocks,
            self.safety_factor,
            self.schema,
            self.raise_open_files,
        )
    }

    fn internal_sort(input: &Path, output: &Path, column: usize, config: &Config, predicate: &dyn LinePredicate) -> Result<MergeStats, anyhow::Error> {
        let mut runs: Vec<PathBuf> = Vec::new();
        let mut lines = 0;
        let chunks = ChunkIterator::new(input, column, config, predicate)?;
        log::info!("Reading {} in chunks of {} lines", input.display(), chunks.lines());
        for chunk in chunks {
            let mut chunk = chunk?;
            chunk.sort();
            let run = write_sorted_chunk(&chunk, config)?;
            lines += run.lines();
            runs.push(run.path().to_path_buf());
        }
        log::info!("Wrote {} sorted runs with {} lines from {}", runs.len(), lines, input.display());
        Self::with_open_files(config, || merge_runs(runs, output, column, config))
    }

    /// Run `f` with the soft open files limit raised to fit one merge.
    fn with_open_files<T>(config: &Config, f: impl FnOnce() -> Result<T, anyhow::Error>) -> Result<T, anyhow::Error> {
        if !config.raise_open_files() {
            return f();
        }
        let (current_soft, current_hard) = Self::get_rlimits()?;
        log::info!("Current rlimit NOFILE, soft: {}, hard: {}", current_soft, current_hard);
        let new_soft = ((config.fan_in() + 256) as u64).max(current_soft).min(current_hard);
        if new_soft != current_soft {
            log::info!("Set new rlimit NOFILE, soft: {}, hard: {}", new_soft, current_hard);
            Self::set_rlimits(new_soft, current_hard)?;
        }
        let result = f();
        if new_soft != current_soft {
            log::info!("Restore rlimit NOFILE, soft: {}, hard: {}", current_soft, current_hard);
            Self::set_rlimits(current_soft, current_hard)?;
        }
        result
    }

    fn get_rlimits() -> Result<(u64, u64), anyhow::Error> {
        getrlimit(Resource::NOFILE).with_context(|| "getrlimit")
    }

    fn set_rlimits(soft: u64, hard: u64) -> Result<(), anyhow::Error> {
        setrlimit(Resource::NOFILE, soft, hard)
            .with_context(|| format!("set rlimit NOFILE, soft: {}, hard: {}", soft, hard))?;
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}
