use std::cmp::Ordering;
use std::fs::File;
use std::path::Path;

use anyhow::Context;
use csv::{ReaderBuilder, StringRecordsIntoIter};

use crate::row::Row;

/// Merge cursor over one sorted chunk file: the currently buffered head row
/// plus the lazy sequence of the chunk's remaining records. The chunk ordinal
/// breaks ties between equal keys so that the merge order is deterministic and
/// preserves the original input order across chunks.
pub(crate) struct UnmergedChunkFile {
    head: Row,
    records: StringRecordsIntoIter<File>,
    ordinal: usize,
    key_index: usize,
}

impl UnmergedChunkFile {
    /// Open a chunk file and buffer its first data row. Returns None for a
    /// chunk that contains no data rows.
    pub(crate) fn open(
        path: &Path,
        ordinal: usize,
        key_index: usize,
        delimiter: u8,
    ) -> Result<Option<UnmergedChunkFile>, anyhow::Error> {
        let reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .from_path(path)
            .with_context(|| format!("path: {}", path.display()))?;
        let mut records = reader.into_records();
        match records.next() {
            None => Ok(None),
            Some(result) => {
                let record = result.with_context(|| format!("path: {}", path.display()))?;
                let head = Row::new(record, key_index)?;
                Ok(
                    Some(
                        UnmergedChunkFile {
                            head,
                            records,
                            ordinal,
                            key_index,
                        }
                    )
                )
            }
        }
    }

    /// Yield the buffered head row together with the cursor advanced to the
    /// next record, or None when the chunk is exhausted.
    pub(crate) fn advance(mut self) -> Result<(Row, Option<UnmergedChunkFile>), anyhow::Error> {
        match self.records.next() {
            None => Ok((self.head, None)),
            Some(result) => {
                let next = Row::new(result?, self.key_index)?;
                let head = std::mem::replace(&mut self.head, next);
                Ok((head, Some(self)))
            }
        }
    }
}

impl Eq for UnmergedChunkFile {}

impl PartialEq<Self> for UnmergedChunkFile {
    fn eq(&self, other: &Self) -> bool {
        self.head.eq(&other.head) && self.ordinal == other.ordinal
    }
}

impl PartialOrd<Self> for UnmergedChunkFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UnmergedChunkFile {
    fn cmp(&self, other: &Self) -> Ordering {
        self.head
            .cmp(&other.head)
            .then_with(|| self.ordinal.cmp(&other.ordinal))
    }
}
