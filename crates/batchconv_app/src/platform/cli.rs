use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "batchconv",
    version,
    about = "Convert library archives into CAD symbol and footprint files"
)]
pub struct Cli {
    /// Settings file (RON). Defaults to ./batchconv.ron.
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Output directory for converted files.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<String>,

    /// Convert the given archives once, print the report and exit.
    #[arg(long)]
    pub run: bool,

    /// Write a settings file with default values and exit.
    #[arg(long)]
    pub init_settings: bool,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,

    /// Archive files to convert.
    #[arg(value_name = "ARCHIVE")]
    pub inputs: Vec<String>,
}
