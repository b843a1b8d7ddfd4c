use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use data_encoding::HEXLOWER;

pub fn setup() {
    let results_dir_path = PathBuf::from_str("./target/results/").unwrap();

    if !results_dir_path.exists() {
        fs::create_dir_all(&results_dir_path).unwrap_or_else(|_|
            panic!("Failed to create results directory: {:?}", results_dir_path)
        );
    }
}

#[allow(dead_code)]
pub fn temp_file_name(dir: &str) -> PathBuf {
    let mut result = PathBuf::from(dir);
    let name = HEXLOWER.encode(&rand::random::<[u8; 16]>());
    result.push(name);
    result
}

#[allow(dead_code)]
pub fn write_csv(path: &PathBuf, header: &[&str], rows: &[Vec<String>]) -> Result<(), anyhow::Error> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[allow(dead_code)]
pub fn read_csv(path: &PathBuf) -> Result<(StringRecord, Vec<StringRecord>), anyhow::Error> {
    let mut reader = ReaderBuilder::new().from_path(path)?;
    let header = reader.headers()?.clone();
    let mut rows = Vec::new();
    for result in reader.into_records() {
        rows.push(result?);
    }
    Ok((header, rows))
}
