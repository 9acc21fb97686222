//! `--info` header dump

use anyhow::{Context, Result};
use std::path::PathBuf;

use mdv2rainbow::mdv::{decode_chunks, MdvReader};
use mdv2rainbow::volume::VolumeModel;

/// Print the headers and chunks of an MDV file as JSON
pub fn run(file: PathBuf) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let mut reader = MdvReader::open(&file).context("Failed to open MDV file")?;
    let headers = reader
        .read_headers()
        .context("Failed to decode MDV headers")?;
    let mut inner = reader.into_inner();
    let chunks = decode_chunks(&mut inner, &headers.chunks).context("Failed to decode chunks")?;

    let volume = VolumeModel::new(headers, chunks.params, chunks.elevations);
    let json = serde_json::to_string_pretty(&volume.summary())
        .context("Failed to serialize headers")?;
    println!("{}", json);

    Ok(())
}
