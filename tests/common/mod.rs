use std::fs;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use data_encoding::HEXLOWER;
use fixed_width_sort::engine::Engine;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const COLUMN_LENGTH: usize = 20;

#[allow(dead_code)]
pub fn records_fixture() -> PathBuf {
    PathBuf::from("./tests/fixtures/records-10.dat")
}

/// Engine holding `lines` records of two columns per chunk, merging `blocks - 1` runs at a time.
#[allow(dead_code)]
pub fn small_engine(lines: usize, blocks: usize) -> Engine {
    // a record of two columns is 42 bytes, estimated at 84 bytes in memory
    let mut engine = Engine::new();
    engine.with_block_size(84 * lines / blocks);
    engine.with_blocks(blocks);
    engine.with_fixed_open_files();
    engine
}

/// Two column records. The first column holds a short random key so that keys repeat, the second
/// holds the record number.
#[allow(dead_code)]
pub fn random_records(count: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(
            |i| {
                let key: String = (0..3).map(|_| rng.gen_range(b'a'..=b'f') as char).collect();
                format!("{:<width$}|{:0>width$}|", key, i, width = COLUMN_LENGTH)
            }
        )
        .collect()
}

#[allow(dead_code)]
pub fn write_lines(path: &Path, lines: &[String]) -> Result<(), anyhow::Error> {
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}

#[allow(dead_code)]
pub fn read_lines(path: &Path) -> Result<Vec<String>, anyhow::Error> {
    let reader = BufReader::new(File::open(path)?);
    let lines = reader.lines().collect::<Result<Vec<String>, _>>()?;
    Ok(lines)
}

#[allow(dead_code)]
pub fn column(line: &str, column: usize) -> &str {
    let start = (column - 1) * (COLUMN_LENGTH + 1);
    &line[start..start + COLUMN_LENGTH]
}

#[allow(dead_code)]
pub fn temp_file_name(dir: &Path) -> PathBuf {
    let mut result = dir.to_path_buf();
    let name = HEXLOWER.encode(&rand::random::<[u8; 16]>());
    result.push(name);
    result
}

/// Files left in `dir` other than the ones given
#[allow(dead_code)]
pub fn leftovers(dir: &Path, expected: &[&Path]) -> Result<Vec<PathBuf>, anyhow::Error> {
    let mut result = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !expected.iter().any(|e| *e == path.as_path()) {
            result.push(path);
        }
    }
    Ok(result)
}
