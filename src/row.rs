use std::cmp::Ordering;

use anyhow::anyhow;
use csv::StringRecord;

/// A parsed data row paired with the index of the key column that determines
/// its sort position. The row content is immutable once read and is written
/// back out unchanged.
#[derive(Debug)]
pub(crate) struct Row {
    record: StringRecord,
    key_index: usize,
}

impl Row {
    pub(crate) fn new(record: StringRecord, key_index: usize) -> Result<Row, anyhow::Error> {
        if key_index >= record.len() {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            Err(anyhow!(
                "row at line {} has {} fields, key column {} is out of range",
                line,
                record.len(),
                key_index,
            ))
        } else {
            Ok(
                Row {
                    record,
                    key_index,
                }
            )
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.record[self.key_index]
    }

    pub(crate) fn into_record(self) -> StringRecord {
        self.record
    }
}

impl Eq for Row {}

impl PartialEq<Self> for Row {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl PartialOrd<Self> for Row {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Row {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(other.key())
    }
}

#[cfg(test)]
mod tests {
    use csv::StringRecord;

    use crate::row::Row;

    #[test]
    fn test_key_selection() -> Result<(), anyhow::Error> {
        let record = StringRecord::from(vec!["10", "b", "zz"]);
        let row = Row::new(record, 1)?;
        assert_eq!(row.key(), "b");
        Ok(())
    }

    #[test]
    fn test_lexicographic_order() -> Result<(), anyhow::Error> {
        let ten = Row::new(StringRecord::from(vec!["10"]), 0)?;
        let nine = Row::new(StringRecord::from(vec!["9"]), 0)?;
        // plain text comparison, not numeric
        assert!(ten < nine);
        Ok(())
    }

    #[test]
    fn test_key_out_of_range() {
        let record = StringRecord::from(vec!["a", "b"]);
        assert!(Row::new(record, 2).is_err());
    }
}
