use std::path::PathBuf;

/// Handle to a persisted chunk file containing one sorted batch of rows.
/// Created by the split phase; the on-disk file is owned by the pipeline run
/// and is deleted by the merge phase.
pub(crate) struct SortedChunkFile {
    path: PathBuf,
    rows: usize,
}

impl SortedChunkFile {
    pub(crate) fn new(path: PathBuf, rows: usize) -> SortedChunkFile {
        SortedChunkFile {
            path,
            rows,
        }
    }

    pub(crate) fn path(&self) -> &PathBuf {
        &self.path
    }

    pub(crate) fn rows(&self) -> usize {
        self.rows
    }
}
