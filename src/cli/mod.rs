//! Command-line interface

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod config;
mod convert;
mod info;

pub use config::Config;

/// mdv2rainbow - MDV radar volume to Rainbow5 converter
#[derive(Parser)]
#[command(name = "mdv2rainbow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input MDV file path
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output directory root (volumes land in OUTPUT_DIR/YYYYMMDD/)
    #[arg(value_name = "OUTPUT_DIR", required_unless_present = "info")]
    output_dir: Option<PathBuf>,

    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the decoded headers as JSON and exit
    #[arg(long)]
    info: bool,

    /// Export only these fields (comma separated, e.g. DBZ,VEL)
    #[arg(long, value_delimiter = ',', value_name = "FIELDS")]
    fields: Option<Vec<String>>,
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    if cli.info {
        return info::run(cli.input);
    }
    match cli.output_dir {
        Some(output_dir) => convert::run(cli.input, output_dir, cli.config, cli.fields),
        None => anyhow::bail!("OUTPUT_DIR is required unless --info is given"),
    }
}
