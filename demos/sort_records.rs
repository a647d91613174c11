use std::fs;
use std::path::PathBuf;

use anyhow::Error;
use simple_logger::SimpleLogger;

use fixed_width_sort::engine::Engine;

// cargo run -r --example sort_records
pub fn main() -> Result<(), Error> {
    SimpleLogger::new().init()?;

    let input_path = PathBuf::from("./tests/fixtures/records-10.dat");
    let tmp_path = PathBuf::from("./target/sort-records-tmp/");
    let sorted_path = PathBuf::from("./target/records-10-sorted.dat");
    let selected_path = PathBuf::from("./target/records-10-selected.dat");
    let sorted_selected_path = PathBuf::from("./target/records-10-sorted-selected.dat");
    fs::create_dir_all(&tmp_path)?;

    let mut engine = Engine::new();
    // small memory budget to force several runs and merge rounds
    engine.with_block_size(64);
    engine.with_blocks(3);

    engine.sort(&input_path, &sorted_path, 1, &tmp_path)?;
    engine.select(&input_path, &selected_path, 2, "xyz", &tmp_path)?;
    engine.sort_and_select(&input_path, &sorted_selected_path, 1, &tmp_path, 2, "xyz")?;

    Ok(())
}
