use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};

/// Operator configuration loaded from a properties style key value file.
///
/// Required keys:
/// * `input.file.path` - the CSV file to sort
/// * `output.file.path` - where to write the sorted result
/// * `max.records.in.memory` - positive bound on records held in memory
/// * `key.field.index` - zero based index of the sort key column
///
/// Optional keys:
/// * `field.separator` - single ASCII delimiter character, default `,`
///
/// Lines starting with `#` or `!` and blank lines are ignored. All values are
/// validated here; the sort core never receives unvalidated configuration.
/// The key index is checked against the input header when the sort starts,
/// since the header is not known at load time.
#[derive(Clone, Debug)]
pub struct Config {
    input: PathBuf,
    output: PathBuf,
    max_chunk_records: usize,
    key_index: usize,
    delimiter: u8,
}

impl Config {
    /// Load and validate configuration from `path`.
    pub fn load(path: &Path) -> Result<Config, anyhow::Error> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("path: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("path: {}", path.display()))
    }

    fn parse(content: &str) -> Result<Config, anyhow::Error> {
        let mut properties: HashMap<&str, &str> = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| anyhow!("malformed property line: {}", line))?;
            properties.insert(key.trim(), value.trim());
        }

        let input = PathBuf::from(Self::required(&properties, "input.file.path")?);
        let output = PathBuf::from(Self::required(&properties, "output.file.path")?);
        let max_chunk_records: usize = Self::required(&properties, "max.records.in.memory")?
            .parse()
            .with_context(|| "max.records.in.memory must be a positive integer")?;
        if max_chunk_records == 0 {
            return Err(anyhow!("max.records.in.memory must be at least 1"));
        }
        let key_index: usize = Self::required(&properties, "key.field.index")?
            .parse()
            .with_context(|| "key.field.index must be a non-negative integer")?;
        let delimiter = match properties.get("field.separator") {
            None => b',',
            Some(value) => {
                let mut bytes = value.bytes();
                match (bytes.next(), bytes.next()) {
                    (Some(b), None) if b.is_ascii() => b,
                    _ => return Err(anyhow!("field.separator must be a single ASCII character, got: {}", value)),
                }
            }
        };

        Ok(
            Config {
                input,
                output,
                max_chunk_records,
                key_index,
                delimiter,
            }
        )
    }

    fn required<'a>(properties: &HashMap<&str, &'a str>, key: &str) -> Result<&'a str, anyhow::Error> {
        properties
            .get(key)
            .copied()
            .ok_or_else(|| anyhow!("missing required property: {}", key))
    }

    pub fn input(&self) -> &PathBuf {
        &self.input
    }

    pub fn output(&self) -> &PathBuf {
        &self.output
    }

    pub fn max_chunk_records(&self) -> usize {
        self.max_chunk_records
    }

    pub fn key_index(&self) -> usize {
        self.key_index
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }
}
