//! This crate implements an external merge sort for CSV files that are too large to
//! hold in memory, ordering the data rows by a single key column.
//!
//! The input is read once and split into bounded batches of records. Each batch is
//! sorted in memory by the key column and spilled to its own temporary CSV file.
//! The sorted chunk files are then combined with a k-way merge driven by a min-heap
//! holding one cursor per chunk, so memory use during the merge is proportional to
//! the number of chunks rather than the number of rows. The output file carries the
//! input header followed by every data row in ascending key order; row content is
//! preserved unchanged, including quoted fields containing delimiters or line breaks.
//!
//! # Examples
//! ```
//! use std::path::PathBuf;
//! use csv_file_sort::sort::Sort;
//!
//! fn sort_by_second_column(input: PathBuf, output: PathBuf, tmp: PathBuf) -> Result<(), anyhow::Error> {
//!     let mut csv_sort = Sort::new(input, output, 1);
//!     // set the directory for intermediate chunk files. The default is the system
//!     // temp dir - std::env::temp_dir(), however, for large files it is recommended
//!     // to provide a dedicated directory on the same file system as the output.
//!     csv_sort.with_tmp_dir(tmp);
//!     // bound on the number of records held in memory at a time
//!     csv_sort.with_max_chunk_records(1_000_000);
//!     csv_sort.sort()
//! }
//! ```

pub(crate) mod row;
pub(crate) mod sorted_chunk_file;
pub(crate) mod unmerged_chunk_file;

pub mod config;
pub mod sort;
