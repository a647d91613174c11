//! This crate implements external sort and select for text files of fixed-width records.
//!
//! Each line of the input is a record made of columns of constant width, every column followed by
//! a separator. A column is addressed by its position (starting at 1) and compared as bytes. Files
//! larger than the configured memory budget are read in chunks that are sorted in memory and
//! written to a scratch directory as sorted runs. The runs are then merged, at most `blocks - 1`
//! at a time, until a single run remains and is written to the output.
//!
//! Selection keeps the lines whose column contains a substring. It runs either as a single linear
//! pass or fused with the sort, filtering lines while the chunks are read.
//!
//! # Examples
//! ```
//! use std::path::Path;
//! use fixed_width_sort::engine::Engine;
//! use fixed_width_sort::schema::Schema;
//!
//! fn sort_selected(input: &Path, output: &Path, tmp: &Path) -> Result<(), anyhow::Error> {
//!     let mut engine = Engine::new();
//!
//!     // 10 byte columns separated by a single byte
//!     engine.with_schema(Schema::new(10, 1));
//!
//!     // sort by the first column the records whose third column contains "2023"
//!     engine.sort_and_select(input, output, 1, tmp, 3, "2023")
//! }
//! ```
//!

pub(crate) mod config;
pub(crate) mod line_record;
pub(crate) mod predicate;
pub(crate) mod chunk_iterator;
pub(crate) mod run_file;
pub(crate) mod unmerged_run;
pub(crate) mod merger;
pub(crate) mod selector;

pub mod engine;
pub mod error;
pub mod schema;
