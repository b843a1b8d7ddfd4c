use std::cmp::{max, min, Reverse};
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use csv::{ReaderBuilder, StringRecord, Writer, WriterBuilder};
use rlimit::{getrlimit, setrlimit, Resource};
use tempfile::{Builder, NamedTempFile};

use crate::row::Row;
use crate::sorted_chunk_file::SortedChunkFile;
use crate::unmerged_chunk_file::UnmergedChunkFile;

const TMP_PREFIX: &str = "chunk-";
const TMP_SUFFIX: &str = ".sorted";

pub(crate) fn create_tmp_file(tmp: &PathBuf) -> Result<NamedTempFile, anyhow::Error> {
    Builder::new()
        .prefix(TMP_PREFIX)
        .suffix(TMP_SUFFIX)
        .tempfile_in(tmp)
        .map_err(|e| anyhow!("Failed to create new temp file: {}", e))
}

/// Sort a CSV file by a single key column using external merge sort.
///
/// The input is split into batches of at most `max_chunk_records` rows. Each
/// batch is sorted in memory by the text of the key column and written to a
/// temporary chunk file; the chunk files are then merged into the output with
/// a k-way merge that keeps one row per chunk in memory. Rows with equal keys
/// keep their original input order.
///
/// # Examples
/// ```
/// use std::path::PathBuf;
/// use csv_file_sort::sort::Sort;
///
/// fn sort_by_first_column(input: PathBuf, output: PathBuf, tmp: PathBuf) -> Result<(), anyhow::Error> {
///     let mut csv_sort = Sort::new(input, output, 0);
///     csv_sort.with_tmp_dir(tmp);
///     csv_sort.with_max_chunk_records(100_000);
///     csv_sort.sort()
/// }
/// ```
pub struct Sort {
    input: PathBuf,
    output: PathBuf,
    tmp: PathBuf,
    key_index: usize,
    max_chunk_records: usize,
    delimiter: u8,
}

impl Sort {
    /// Create a default Sort definition for `input`, writing the sorted result
    /// to `output`, ordered by the zero based column `key_index`.
    ///
    /// * intermediate chunk files are created in std::env::temp_dir()
    /// * at most 1,000,000 records are held in memory at a time
    /// * the field delimiter is a comma
    pub fn new(input: PathBuf, output: PathBuf, key_index: usize) -> Sort {
        Sort {
            input,
            output,
            tmp: std::env::temp_dir(),
            key_index,
            max_chunk_records: 1_000_000,
            delimiter: b',',
        }
    }

    /// Set the directory for intermediate chunk files. By default use
    /// std::env::temp_dir(). It is recommended for large files to create a
    /// dedicated directory on the same file system as the output target.
    pub fn with_tmp_dir(&mut self, tmp: PathBuf) {
        self.tmp = tmp;
    }

    /// Set the maximum number of records held in memory at a time. Each full
    /// batch becomes one sorted chunk file. The default is 1,000,000.
    pub fn with_max_chunk_records(&mut self, max_chunk_records: usize) {
        self.max_chunk_records = max_chunk_records;
    }

    /// Set the field delimiter. The default is a comma
    pub fn with_delimiter(&mut self, delimiter: u8) {
        self.delimiter = delimiter;
    }

    /// Sort the input file into the output file.
    ///
    /// The file descriptor rlimit is raised for the duration of the merge to
    /// accommodate one open file per chunk, and restored afterwards.
    pub fn sort(&self) -> Result<(), anyhow::Error> {
        if self.max_chunk_records == 0 {
            return Err(anyhow!("max chunk records must be at least 1"));
        }
        let (header, chunks) = self.split_and_sort()?;
        let (current_soft, current_hard) = Self::get_rlimits()?;
        log::info!("Current rlimit NOFILE, soft: {}, hard: {}", current_soft, current_hard);
        let new_soft = max((chunks.len() + 256) as u64, current_soft);
        log::info!("Set new rlimit NOFILE, soft: {}, hard: {}", new_soft, current_hard);
        Self::set_rlimits(new_soft, current_hard)?;
        let result = self.merge(&header, chunks);
        log::info!("Restore rlimit NOFILE, soft: {}, hard: {}", current_soft, current_hard);
        Self::set_rlimits(current_soft, current_hard)?;
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

    /// Split the input into sorted chunk files of at most `max_chunk_records`
    /// rows each. Returns the input header and the chunk handles in creation
    /// order. An input with a header and no data rows produces zero chunks.
    fn split_and_sort(&self) -> Result<(StringRecord, Vec<SortedChunkFile>), anyhow::Error> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .from_path(&self.input)
            .with_context(|| format!("path: {}", self.input.display()))?;
        let header = reader
            .headers()
            .with_context(|| format!("path: {}", self.input.display()))?
            .clone();
        if header.is_empty() {
            return Err(anyhow!("input {} has no header row", self.input.display()));
        }
        if self.key_index >= header.len() {
            return Err(
                anyhow!(
                    "key column {} is out of range, header of {} has {} columns",
                    self.key_index,
                    self.input.display(),
                    header.len(),
                )
            );
        }

        let batch_capacity = min(self.max_chunk_records, 65_536);
        let mut chunks = Vec::new();
        let mut batch: Vec<Row> = Vec::with_capacity(batch_capacity);
        for result in reader.into_records() {
            let record = result.with_context(|| format!("path: {}", self.input.display()))?;
            batch.push(Row::new(record, self.key_index)?);
            if batch.len() >= self.max_chunk_records {
                let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_capacity));
                chunks.push(self.write_sorted_chunk(&header, full)?);
            }
        }
        if !batch.is_empty() {
            chunks.push(self.write_sorted_chunk(&header, batch)?);
        }
        log::info!("Split {} into {} sorted chunks", self.input.display(), chunks.len());
        Ok((header, chunks))
    }

    /// Sort one batch in memory and persist it as a chunk file, header first.
    /// The in-memory sort is stable so equal keys keep their input order.
    fn write_sorted_chunk(
        &self,
        header: &StringRecord,
        mut batch: Vec<Row>,
    ) -> Result<SortedChunkFile, anyhow::Error> {
        batch.sort();
        let tmp_file = create_tmp_file(&self.tmp)?;
        let (chunk_file, path) = tmp_file
            .keep()
            .map_err(|e| anyhow!("Failed to persist temp file: {}", e))?;
        let mut writer = self.chunk_writer(chunk_file);
        writer
            .write_record(header)
            .with_context(|| format!("path: {}", path.display()))?;
        let rows = batch.len();
        for row in batch {
            writer
                .write_record(&row.into_record())
                .with_context(|| format!("path: {}", path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("path: {}", path.display()))?;
        log::debug!("Wrote sorted chunk {} with {} rows", path.display(), rows);
        Ok(SortedChunkFile::new(path, rows))
    }

    fn chunk_writer(&self, file: File) -> Writer<BufWriter<File>> {
        WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(BufWriter::new(file))
    }

    /// Merge the sorted chunk files into the output file and release every
    /// chunk resource. The chunk files are deleted on every exit path; the
    /// readers are closed when the merge loop drops them. Deletion failures
    /// are logged and never override the primary error.
    fn merge(&self, header: &StringRecord, chunks: Vec<SortedChunkFile>) -> Result<(), anyhow::Error> {
        let result = self.merge_chunks(header, &chunks);
        for chunk in &chunks {
            if let Err(e) = std::fs::remove_file(chunk.path()) {
                log::warn!("Failed to remove chunk file {}: {}", chunk.path().display(), e);
            }
        }
        result
    }

    fn merge_chunks(&self, header: &StringRecord, chunks: &[SortedChunkFile]) -> Result<(), anyhow::Error> {
        let total_rows: usize = chunks.iter().map(|chunk| chunk.rows()).sum();
        log::info!("Merging {} sorted chunks, {} rows", chunks.len(), total_rows);
        let output = File::create(&self.output)
            .with_context(|| format!("path: {}", self.output.display()))?;
        let mut writer = self.chunk_writer(output);
        writer
            .write_record(header)
            .with_context(|| format!("path: {}", self.output.display()))?;

        let mut unmerged_files: BinaryHeap<Reverse<UnmergedChunkFile>> =
            BinaryHeap::with_capacity(chunks.len());
        for (ordinal, chunk) in chunks.iter().enumerate() {
            let cursor = UnmergedChunkFile::open(
                chunk.path(),
                ordinal,
                self.key_index,
                self.delimiter,
            )?;
            if let Some(cursor) = cursor {
                unmerged_files.push(Reverse(cursor));
            }
        }

        let mut merged_rows: usize = 0;
        while let Some(Reverse(current_min)) = unmerged_files.pop() {
            let (row, rest) = current_min.advance()?;
            writer
                .write_record(&row.into_record())
                .with_context(|| format!("path: {}", self.output.display()))?;
            merged_rows += 1;
            if let Some(cursor) = rest {
                unmerged_files.push(Reverse(cursor));
            }
        }
        writer
            .flush()
            .with_context(|| format!("path: {}", self.output.display()))?;
        log::info!("Finished merging {} rows into {}", merged_rows, self.output.display());
        Ok(())
    }
}
