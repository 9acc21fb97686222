//! File-level MDV decoder

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::{debug, info, warn};

use super::chunks::decode_chunks;
use super::error::MdvError;
use super::headers::{read_headers, VolumeHeaders};
use super::payload::decode_field;
use crate::volume::VolumeModel;

/// Decoder for a single MDV file
pub struct MdvReader<R> {
    inner: R,
}

impl MdvReader<BufReader<File>> {
    /// Open an MDV file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MdvError> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read + Seek> MdvReader<R> {
    /// Wrap any seekable byte source
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Decode only the master, field, vlevel and chunk headers
    pub fn read_headers(&mut self) -> Result<VolumeHeaders, MdvError> {
        read_headers(&mut self.inner)
    }

    /// Decode the whole volume, keeping every field
    pub fn read_volume(&mut self) -> Result<VolumeModel, MdvError> {
        self.read_volume_filtered(|_| true)
    }

    /// Decode the volume, decoding grids only for fields accepted by `keep`.
    ///
    /// Headers and chunks are always decoded. Only the first field of each
    /// name is decoded. The first field that fails to decode aborts the whole
    /// volume.
    pub fn read_volume_filtered<F>(&mut self, keep: F) -> Result<VolumeModel, MdvError>
    where
        F: Fn(&str) -> bool,
    {
        let headers = read_headers(&mut self.inner)?;
        let chunks = decode_chunks(&mut self.inner, &headers.chunks)?;

        let mut seen = HashSet::new();
        let selected: Vec<_> = headers
            .fields
            .iter()
            .filter(|h| {
                if !keep(&h.field_name) {
                    debug!("Skipping field {}", h.field_name);
                    return false;
                }
                if !seen.insert(h.field_name.clone()) {
                    warn!("Ignoring duplicate field {}", h.field_name);
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        let mut volume = VolumeModel::new(headers, chunks.params, chunks.elevations);
        for header in &selected {
            let grid = decode_field(&mut self.inner, header)?;
            info!(
                "Decoded field {} ({} levels of {}x{})",
                header.field_name, header.nz, header.ny, header.nx
            );
            volume.insert_grid(header.field_name.clone(), grid);
        }

        Ok(volume)
    }

    /// Release the underlying reader
    pub fn into_inner(self) -> R {
        self.inner
    }
}
