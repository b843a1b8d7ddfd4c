use std::path::PathBuf;

use anyhow::Error;
use clap::Parser;
use log::LevelFilter;
use simple_logger::SimpleLogger;

use csv_file_sort::config::Config;
use csv_file_sort::sort::Sort;

#[derive(Parser)]
#[command(name = "csv-file-sort")]
#[command(about = "Sort a CSV file by a key column using external merge sort")]
struct Args {
    #[arg(short, long, default_value = "config.properties", help = "Configuration file path")]
    config: PathBuf,

    #[arg(short, long, help = "Verbose output")]
    verbose: bool,
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    SimpleLogger::new().with_level(level).init()?;

    let config = Config::load(&args.config)?;
    log::info!(
        "Sorting {} into {} by column {}",
        config.input().display(),
        config.output().display(),
        config.key_index(),
    );
    let mut csv_sort = Sort::new(config.input().clone(), config.output().clone(), config.key_index());
    csv_sort.with_max_chunk_records(config.max_chunk_records());
    csv_sort.with_delimiter(config.delimiter());
    csv_sort.sort()?;
    Ok(())
}
