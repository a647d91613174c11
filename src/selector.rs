use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, Context};

use crate::predicate::LinePredicate;

/// Copy the lines of `input` accepted by `predicate` to `output`, in input order.
///
/// Lines are copied byte for byte including their terminators. Returns the number of lines
/// selected.
pub(crate) fn select_lines(input: &Path, output: &Path, predicate: &dyn LinePredicate, capacity: usize) -> Result<usize, anyhow::Error> {
    let file = File::open(input)
        .with_context(|| anyhow!("path: {}", input.display()))?;
    let mut reader = BufReader::with_capacity(capacity, file);
    let file = File::create(output)
        .with_context(|| anyhow!("Create output: {}", output.display()))?;
    let mut writer = BufWriter::with_capacity(capacity, file);

    let mut selected = 0;
    let mut line_number: u64 = 0;
    let mut line = String::new();
    while reader.read_line(&mut line).with_context(|| anyhow!("path: {}", input.display()))? != 0 {
        line_number += 1;
        let content = line.strip_suffix('\n').unwrap_or(line.as_str());
        let content = content.strip_suffix('\r').unwrap_or(content);
        let accepted = predicate.test(content)
            .with_context(|| format!("file: {}, line: {}", input.display(), line_number))?;
        if accepted {
            writer.write_all(line.as_bytes())
                .with_context(|| anyhow!("Write output: {}", output.display()))?;
            selected += 1;
        }
        line.clear();
    }
    writer.flush()
        .with_context(|| anyhow!("Write output: {}", output.display()))?;
    Ok(selected)
}
