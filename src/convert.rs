//! MDV to Rainbow conversion pipeline
//!
//! One input volume produces one Rainbow file per allow-listed field that is
//! present in the input:
//!
//! ```text
//! OUTPUT_DIR/YYYYMMDD/YYYYMMDDHHMMSS00<type>.vol
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{info, warn};
use ndarray::Axis;
use serde::Deserialize;

use crate::mdv::{FieldHeader, MdvError, MdvReader};
use crate::rainbow::{
    product_for, RadarSite, RainbowError, RainbowProduct, RainbowWriter, ScanHeader, SliceInfo,
};
use crate::volume::VolumeModel;

/// Errors that can occur during conversion
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Error decoding the input MDV file
    #[error("MDV decode error: {0}")]
    Mdv(#[from] MdvError),

    /// Error writing a Rainbow volume
    #[error("Rainbow writer error: {0}")]
    Rainbow(#[from] RainbowError),

    /// Output directory could not be created
    #[error("Cannot create output directory {}: {source}", path.display())]
    CreateDir {
        /// Directory that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Requested field is not in the export allow-list
    #[error("Field {0} has no Rainbow product")]
    UnknownField(String),

    /// zlib level outside 0-9
    #[error("Invalid compression level {0}, expected 0-9")]
    InvalidCompressionLevel(u32),
}

/// Configuration for the MDV to Rainbow conversion
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Restrict export to these MDV field names; `None` exports the full allow-list
    pub fields: Option<Vec<String>>,

    /// zlib level for blobs (0-9)
    pub compression_level: u32,

    /// Write into a `YYYYMMDD/` subdirectory of the output root
    pub date_subdir: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            fields: None,
            compression_level: 6,
            date_subdir: true,
        }
    }
}

impl ConversionConfig {
    /// Export only the named fields
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Check that every requested field has a product and the level is valid
    pub fn validate(&self) -> Result<(), ConversionError> {
        if self.compression_level > 9 {
            return Err(ConversionError::InvalidCompressionLevel(self.compression_level));
        }
        if let Some(fields) = &self.fields {
            if let Some(unknown) = fields.iter().find(|f| product_for(f).is_none()) {
                return Err(ConversionError::UnknownField(unknown.clone()));
            }
        }
        Ok(())
    }
}

/// Statistics from a completed conversion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionStats {
    /// Rainbow volumes written
    pub fields_written: usize,
    /// Slices written over all volumes
    pub slices_written: usize,
    /// Total bytes written
    pub bytes_written: u64,
    /// Paths of the written volumes
    pub outputs: Vec<PathBuf>,
}

impl fmt::Display for ConversionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} volumes ({} slices, {} bytes)",
            self.fields_written, self.slices_written, self.bytes_written
        )
    }
}

/// Converts MDV volumes to Rainbow volumes
#[derive(Debug, Clone, Default)]
pub struct VolumeConverter {
    config: ConversionConfig,
}

impl VolumeConverter {
    /// Create a converter with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a converter with a custom configuration
    pub fn with_config(config: ConversionConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Whether `field` is decoded and exported
    pub fn wants(&self, field: &str) -> bool {
        if product_for(field).is_none() {
            return false;
        }
        match &self.config.fields {
            Some(fields) => fields.iter().any(|f| f == field),
            None => true,
        }
    }

    /// Decode `input` and write its Rainbow volumes under `output_root`
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output_root: Q,
    ) -> Result<ConversionStats, ConversionError> {
        self.config.validate()?;
        let input = input.as_ref();
        info!("Converting {}", input.display());

        let mut reader = MdvReader::open(input)?;
        let volume = reader.read_volume_filtered(|name| self.wants(name))?;
        self.write_volume(&volume, output_root.as_ref())
    }

    /// Write one Rainbow volume per decoded, allow-listed field of `volume`
    pub fn write_volume(
        &self,
        volume: &VolumeModel,
        output_root: &Path,
    ) -> Result<ConversionStats, ConversionError> {
        let time = volume
            .begin_time()
            .ok_or(RainbowError::InvalidTime(volume.master.time_begin))?;
        let site = radar_site(volume);
        let mut stats = ConversionStats::default();

        let names: Vec<&str> = volume.field_names().filter(|n| self.wants(n)).collect();
        if names.is_empty() {
            warn!("No exportable fields in volume");
            return Ok(stats);
        }

        let dir = self.output_dir(output_root, &time);
        fs::create_dir_all(&dir).map_err(|source| ConversionError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        for name in names {
            let Some(product) = product_for(name) else {
                continue;
            };
            let path = dir.join(output_file_name(&time, product));
            let (slices, bytes) = self.write_field(volume, name, product, &time, &site, &path)?;
            info!(
                "Wrote {} ({} slices, {} bytes) to {}",
                name,
                slices,
                bytes,
                path.display()
            );
            stats.fields_written += 1;
            stats.slices_written += slices;
            stats.bytes_written += bytes;
            stats.outputs.push(path);
        }

        Ok(stats)
    }

    /// Directory receiving the volumes of a scan started at `time`
    pub fn output_dir(&self, output_root: &Path, time: &DateTime<Utc>) -> PathBuf {
        if self.config.date_subdir {
            output_root.join(time.format("%Y%m%d").to_string())
        } else {
            output_root.to_path_buf()
        }
    }

    fn write_field(
        &self,
        volume: &VolumeModel,
        name: &str,
        product: &'static RainbowProduct,
        time: &DateTime<Utc>,
        site: &RadarSite,
        path: &Path,
    ) -> Result<(usize, u64), ConversionError> {
        let (Some((header, _)), Some(grid)) = (volume.field(name), volume.grid(name)) else {
            return Ok((0, 0));
        };

        let levels = grid.dim().0;
        let angles = volume.elevation_angles(name);
        let count = angles.len().min(levels);
        if angles.len() != levels {
            warn!(
                "Field {}: {} elevation angles for {} levels, writing {} slices",
                name,
                angles.len(),
                levels,
                count
            );
        }

        let (_, rays, bins) = grid.dim();
        let geometry = SweepGeometry::new(volume, header, rays, bins);
        let scan = ScanHeader {
            time: *time,
            scan_name: scan_name(volume),
            num_elevations: count,
            start_range_km: geometry.start_range_km,
            stop_range_km: geometry.stop_range_km,
            range_step_km: geometry.range_step_km,
            angle_step_deg: geometry.angle_step_deg,
            time_samples: geometry.time_samples,
            range_samples: geometry.range_samples,
        };

        let mut writer = RainbowWriter::create(path, product, self.config.compression_level)?;
        writer.write_header(&scan)?;
        for (level, &angle) in angles.iter().take(count).enumerate() {
            let data = grid.index_axis(Axis(0), level);
            writer.write_slice(&geometry.slice(angle as f64), data)?;
        }
        writer.write_footer(site)?;
        writer.write_blobs()?;
        let (_, stats) = writer.finish()?;

        Ok((stats.slices_written, stats.bytes_written))
    }
}

/// `YYYYMMDDHHMMSS00<type>.vol`
pub fn output_file_name(time: &DateTime<Utc>, product: &RainbowProduct) -> String {
    format!("{}{}", time.format("%Y%m%d%H%M%S"), product.extension())
}

struct SweepGeometry {
    start_range_km: f64,
    stop_range_km: f64,
    range_step_km: f64,
    angle_step_deg: f64,
    time_samples: i32,
    range_samples: i32,
}

impl SweepGeometry {
    // Radar params win; the field grid supplies the geometry otherwise.
    fn new(volume: &VolumeModel, header: &FieldHeader, rays: usize, bins: usize) -> Self {
        let (start, step, samples) = match &volume.radar_params {
            Some(p) => (p.start_range as f64, p.gate_spacing as f64, p.samples_per_beam),
            None => (header.grid_minx as f64, header.grid_dx as f64, 0),
        };
        let angle_step = if header.grid_dy > 0.0 {
            header.grid_dy as f64
        } else if rays > 0 {
            360.0 / rays as f64
        } else {
            1.0
        };
        Self {
            start_range_km: start,
            stop_range_km: start + step * bins as f64,
            range_step_km: step,
            angle_step_deg: angle_step,
            time_samples: samples,
            range_samples: 1,
        }
    }

    fn slice(&self, elevation_deg: f64) -> SliceInfo {
        SliceInfo {
            elevation_deg,
            start_range_km: self.start_range_km,
            stop_range_km: self.stop_range_km,
            range_step_km: self.range_step_km,
            angle_step_deg: self.angle_step_deg,
            time_samples: self.time_samples,
            range_samples: self.range_samples,
        }
    }
}

fn scan_name(volume: &VolumeModel) -> String {
    let name = match &volume.radar_params {
        Some(p) if !p.scan_type_name.is_empty() => p.scan_type_name.as_str(),
        _ => volume.master.data_set_name.as_str(),
    };
    if name.is_empty() {
        "volume".to_string()
    } else {
        name.replace(char::is_whitespace, "_")
    }
}

fn radar_site(volume: &VolumeModel) -> RadarSite {
    let master = &volume.master;
    match &volume.radar_params {
        Some(p) => RadarSite {
            name: p.radar_name.clone(),
            id: p.radar_id.to_string(),
            altitude_m: p.altitude as f64 * 1000.0,
            longitude: p.longitude as f64,
            latitude: p.latitude as f64,
            wavelength_m: p.wavelength as f64 / 100.0,
            beamwidth_deg: p.horiz_beam_width as f64,
        },
        None => RadarSite {
            name: master.data_set_source.clone(),
            id: "0".to_string(),
            altitude_m: master.sensor_alt as f64 * 1000.0,
            longitude: master.sensor_lon as f64,
            latitude: master.sensor_lat as f64,
            wavelength_m: 0.0,
            beamwidth_deg: 0.0,
        },
    }
}
