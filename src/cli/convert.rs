//! Convert command

use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use mdv2rainbow::convert::VolumeConverter;

use super::Config;

/// Convert one MDV file into Rainbow volumes
pub fn run(
    input: PathBuf,
    output_dir: PathBuf,
    config_path: Option<PathBuf>,
    fields: Option<Vec<String>>,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let file_config = match &config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let config = file_config.resolve(fields);

    info!("mdv2rainbow - MDV to Rainbow5");
    info!("Input:  {}", input.display());
    info!("Output: {}", output_dir.display());
    if let Some(path) = &config_path {
        info!("Config: {}", path.display());
    }
    match &config.fields {
        Some(fields) => info!("Fields: {}", fields.join(", ")),
        None => info!("Fields: all exportable"),
    }
    info!("Compression level: {}", config.compression_level);

    let converter = VolumeConverter::with_config(config);
    let stats = converter
        .convert(&input, &output_dir)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    info!("{}", stats);
    for path in &stats.outputs {
        info!("  {}", path.display());
    }

    Ok(())
}
