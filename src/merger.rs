use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};

use crate::config::Config;
use crate::run_file::{create_run_file, RunFile};
use crate::unmerged_run::UnmergedRun;

/// Summary of a completed merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeStats {
    runs: usize,
    rounds: usize,
    lines: usize,
}

impl MergeStats {
    /// Number of runs merged
    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Number of merges performed, including the final one
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Number of lines written to the output
    pub fn lines(&self) -> usize {
        self.lines
    }
}

/// Merge sorted runs into `output` with at most `fan_in` runs per merge.
///
/// While more than `fan_in` runs are pending, the runs are merged in consecutive groups of
/// `fan_in` into intermediate runs. Intermediate runs take the place of the runs they replace, so
/// the relative order of runs is kept across rounds and ties always resolve to earlier input.
/// Every consumed run is removed once its merge completes. A failure leaves the output and any
/// remaining runs in place.
pub(crate) fn merge_runs(runs: Vec<PathBuf>, output: &Path, column: usize, config: &Config) -> Result<MergeStats, anyhow::Error> {
    let fan_in = config.fan_in();
    let mut stats = MergeStats {
        runs: runs.len(),
        ..MergeStats::default()
    };
    log::info!("Merging {} runs with fan-in {}", runs.len(), fan_in);
    let mut pending: VecDeque<PathBuf> = runs.into();
    let mut merged: Vec<PathBuf> = Vec::new();
    loop {
        if pending.len() + merged.len() <= fan_in {
            let mut group = merged;
            group.extend(pending);
            if !group.is_empty() {
                stats.rounds += 1;
            }
            log::info!("Final merge of {} runs into {}", group.len(), output.display());
            let file = File::create(output)
                .with_context(|| anyhow!("Create output: {}", output.display()))?;
            let mut writer = BufWriter::with_capacity(config.block_size(), file);
            stats.lines = merge_group(&group, &mut writer, column, config)
                .with_context(|| anyhow!("Merge into output: {}", output.display()))?;
            writer.flush()
                .with_context(|| anyhow!("Write output: {}", output.display()))?;
            remove_runs(group)?;
            break;
        }

        if pending.is_empty() {
            pending.extend(merged.drain(..));
        }

        let take = fan_in.min(pending.len());
        let group: Vec<PathBuf> = pending.drain(..take).collect();
        if group.len() == 1 {
            merged.extend(group);
            continue;
        }

        stats.rounds += 1;
        let (file, path) = create_run_file(config)?;
        let mut writer = BufWriter::with_capacity(config.block_size(), file);
        let lines = merge_group(&group, &mut writer, column, config)
            .with_context(|| anyhow!("Merge into run: {}", path.display()))?;
        writer.flush()
            .with_context(|| anyhow!("Write run: {}", path.display()))?;
        log::info!("Merge round {}: {} runs into {} with {} lines", stats.rounds, group.len(), path.display(), lines);
        remove_runs(group)?;
        merged.push(path);
    }
    log::info!("Finished merging {} runs in {} rounds, merged length: {} lines", stats.runs, stats.rounds, stats.lines);
    Ok(stats)
}

fn remove_runs(runs: Vec<PathBuf>) -> Result<(), anyhow::Error> {
    for path in runs {
        RunFile::new(path, 0).remove()?;
    }
    Ok(())
}

/// Merge sorted runs into `writer`, returning the number of lines written.
pub(crate) fn merge_group<W: Write>(runs: &[PathBuf], writer: &mut W, column: usize, config: &Config) -> Result<usize, anyhow::Error> {
    let mut merged_len: usize = 0;
    let mut unmerged_runs = BinaryHeap::with_capacity(runs.len());
    for (index, path) in runs.iter().enumerate() {
        if let Some(run) = UnmergedRun::open(index, path, config.schema(), column, config.block_size())? {
            unmerged_runs.push(Reverse(run));
        }
    }

    while let Some(Reverse(mut current_min)) = unmerged_runs.pop() {
        let mut current_min_done = false;
        // drain the current run for as long as it stays ahead of every other run
        loop {
            writer.write_all(current_min.head().line().as_bytes())?;
            writer.write_all(b"\n")?;
            merged_len += 1;
            if !current_min.advance()? {
                current_min_done = true;
                break;
            }
            match unmerged_runs.peek() {
                Some(Reverse(next)) if &current_min > next => break,
                _ => {}
            }
        }
        if !current_min_done {
            unmerged_runs.push(Reverse(current_min));
        }
    }
    Ok(merged_len)
}
