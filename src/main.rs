//! # mdv2rainbow
//!
//! A command-line tool for converting MDV radar volumes to Rainbow5 `.vol` files.
//!
//! ## Usage
//!
//! ```bash
//! # Write one volume per exportable field under out/YYYYMMDD/
//! mdv2rainbow input.mdv out/
//!
//! # Only reflectivity and velocity, with a config file
//! mdv2rainbow --config mdv2rainbow.toml --fields DBZ,VEL input.mdv out/
//!
//! # Dump the decoded headers as JSON
//! mdv2rainbow --info input.mdv
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
