//! Streaming writer for one Rainbow volume file
//!
//! The file is an XML document followed by the binary blobs it references.
//! Calls must follow the document order:
//!
//! ```text
//! Open ──write_header──▶ HeaderWritten ──write_slice──▶ SliceWritten ─┐
//!                             │                            ▲  │        │
//!                             │                            └──┘        │
//!                             └────────────write_footer◀───────────────┘
//!                                              │
//!                   FooterWritten ──write_blobs──▶ BlobsWritten ──finish──▶ Closed
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use log::debug;
use ndarray::ArrayView2;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::blob::{angle_table, quantize_slab, Blob, ANGLE_TABLE_LEN};
use super::error::RainbowError;
use super::products::RainbowProduct;

/// Rainbow software version advertised in the volume element
pub const RAINBOW_VERSION: &str = "5.34.16";

/// Position of a writer in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Nothing written yet
    Open,
    /// Volume, scan and parameter group opened
    HeaderWritten,
    /// At least one slice written
    SliceWritten,
    /// Scan closed and radar info written
    FooterWritten,
    /// All blobs appended
    BlobsWritten,
    /// Flushed; no further writes allowed
    Closed,
}

/// Scan-level metadata written in the header
#[derive(Debug, Clone, PartialEq)]
pub struct ScanHeader {
    /// Volume start time
    pub time: DateTime<Utc>,
    /// Scan strategy name
    pub scan_name: String,
    /// Number of slices that follow
    pub num_elevations: usize,
    /// Range of the first bin (km)
    pub start_range_km: f64,
    /// Range of the last bin (km)
    pub stop_range_km: f64,
    /// Bin spacing (km)
    pub range_step_km: f64,
    /// Ray spacing (degrees)
    pub angle_step_deg: f64,
    /// Pulses per ray
    pub time_samples: i32,
    /// Range samples per bin
    pub range_samples: i32,
}

/// One elevation sweep
#[derive(Debug, Clone, PartialEq)]
pub struct SliceInfo {
    /// Elevation angle (degrees)
    pub elevation_deg: f64,
    /// Range of the first bin (km)
    pub start_range_km: f64,
    /// Range of the last bin (km)
    pub stop_range_km: f64,
    /// Bin spacing (km)
    pub range_step_km: f64,
    /// Ray spacing (degrees)
    pub angle_step_deg: f64,
    /// Pulses per ray
    pub time_samples: i32,
    /// Range samples per bin
    pub range_samples: i32,
}

/// Radar site metadata written in the footer
#[derive(Debug, Clone, PartialEq)]
pub struct RadarSite {
    /// Radar name
    pub name: String,
    /// Radar identifier
    pub id: String,
    /// Antenna altitude (m)
    pub altitude_m: f64,
    /// Longitude (degrees)
    pub longitude: f64,
    /// Latitude (degrees)
    pub latitude: f64,
    /// Wavelength (m)
    pub wavelength_m: f64,
    /// Beam width (degrees)
    pub beamwidth_deg: f64,
}

/// Counters from a finished volume
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RainbowStats {
    /// Slices written
    pub slices_written: usize,
    /// Blobs written
    pub blobs_written: usize,
    /// Total bytes written, XML included
    pub bytes_written: u64,
}

/// Writes one Rainbow volume for a single product
pub struct RainbowWriter<W: Write> {
    xml: Writer<CountingWriter<W>>,
    product: &'static RainbowProduct,
    compression_level: u32,
    state: WriterState,
    time: Option<DateTime<Utc>>,
    blobs: Vec<Blob>,
    slices: usize,
}

impl RainbowWriter<BufWriter<File>> {
    /// Create the file at `path` and write into it through one buffered handle
    pub fn create<P: AsRef<Path>>(
        path: P,
        product: &'static RainbowProduct,
        compression_level: u32,
    ) -> Result<Self, RainbowError> {
        let file = File::create(path.as_ref())?;
        Ok(Self::new(BufWriter::new(file), product, compression_level))
    }
}

impl<W: Write> RainbowWriter<W> {
    /// Wrap an output sink
    pub fn new(inner: W, product: &'static RainbowProduct, compression_level: u32) -> Self {
        Self {
            xml: Writer::new_with_indent(CountingWriter::new(inner), b' ', 2),
            product,
            compression_level,
            state: WriterState::Open,
            time: None,
            blobs: Vec::new(),
            slices: 0,
        }
    }

    /// Current document position
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Write the XML declaration, volume and scan elements and the parameter group
    pub fn write_header(&mut self, header: &ScanHeader) -> Result<(), RainbowError> {
        self.expect(&[WriterState::Open], "write header")?;

        let datetime = header.time.format("%Y-%m-%dT%H:%M:%S").to_string();
        let (date, time) = date_time_attrs(&header.time);
        let scan_name = format!("{}.vol", header.scan_name);

        self.xml
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.start(
            "volume",
            &[
                ("version", RAINBOW_VERSION),
                ("datetime", &datetime),
                ("type", "vol"),
                ("owner", env!("CARGO_PKG_NAME")),
            ],
        )?;
        self.start(
            "scan",
            &[("name", &scan_name), ("time", &time), ("date", &date)],
        )?;
        self.start("pargroup", &[("refid", "sdfbase")])?;
        self.element("numele", header.num_elevations)?;
        self.element("startrange", fmt_f64(header.start_range_km))?;
        self.element("stoprange", fmt_f64(header.stop_range_km))?;
        self.element("rangestep", fmt_f64(header.range_step_km))?;
        self.element("anglestep", fmt_f64(header.angle_step_deg))?;
        self.element("timesamp", header.time_samples)?;
        self.element("rangesamp", header.range_samples)?;
        self.end("pargroup")?;

        self.time = Some(header.time);
        self.state = WriterState::HeaderWritten;
        Ok(())
    }

    /// Write one slice element and queue its angle and data blobs.
    ///
    /// `data` is the `(rays, bins)` level in physical units.
    pub fn write_slice(
        &mut self,
        slice: &SliceInfo,
        data: ArrayView2<'_, f32>,
    ) -> Result<(), RainbowError> {
        self.expect(
            &[WriterState::HeaderWritten, WriterState::SliceWritten],
            "write slice",
        )?;

        let index = self.slices;
        let angle_id = 2 * index;
        let data_id = 2 * index + 1;
        let (rays, bins) = data.dim();
        let product = self.product;
        let min = fmt_f64(product.min);
        let max = fmt_f64(product.max);
        let (date, time) = self
            .time
            .as_ref()
            .map(date_time_attrs)
            .unwrap_or_default();

        self.start("slice", &[("refid", &index.to_string())])?;
        self.element("posangle", format!("{:.1}", slice.elevation_deg))?;
        self.empty(product.dyn_element, &[("min", &min), ("max", &max)])?;
        self.element("startrange", fmt_f64(slice.start_range_km))?;
        self.element("stoprange", fmt_f64(slice.stop_range_km))?;
        self.element("rangestep", fmt_f64(slice.range_step_km))?;
        self.element("anglestep", fmt_f64(slice.angle_step_deg))?;
        self.element("timesamp", slice.time_samples)?;
        self.element("rangesamp", slice.range_samples)?;
        self.start("slicedata", &[("time", &time), ("date", &date)])?;
        self.empty(
            "rayinfo",
            &[
                ("refid", "startangle"),
                ("blobid", &angle_id.to_string()),
                ("rays", &ANGLE_TABLE_LEN.to_string()),
                ("min", "0"),
                ("max", "360"),
                ("depth", "16"),
            ],
        )?;
        self.empty(
            "rawdata",
            &[
                ("blobid", &data_id.to_string()),
                ("rays", &rays.to_string()),
                ("type", product.data_type),
                ("bins", &bins.to_string()),
                ("min", &min),
                ("max", &max),
                ("depth", "8"),
            ],
        )?;
        self.end("slicedata")?;
        self.end("slice")?;

        let codes = quantize_slab(data, product);
        self.blobs
            .push(Blob::compress(angle_id, &angle_table(), self.compression_level)?);
        self.blobs
            .push(Blob::compress(data_id, &codes, self.compression_level)?);
        debug!(
            "Slice {} at {:.1} deg: {} rays x {} bins",
            index, slice.elevation_deg, rays, bins
        );

        self.slices += 1;
        self.state = WriterState::SliceWritten;
        Ok(())
    }

    /// Close the scan, write the radar site element and end the XML section
    pub fn write_footer(&mut self, site: &RadarSite) -> Result<(), RainbowError> {
        self.expect(
            &[WriterState::HeaderWritten, WriterState::SliceWritten],
            "write footer",
        )?;

        self.end("scan")?;
        self.start(
            "radarinfo",
            &[
                ("alt", &format!("{:.1}", site.altitude_m)),
                ("lon", &format!("{:.4}", site.longitude)),
                ("lat", &format!("{:.4}", site.latitude)),
                ("id", &site.id),
            ],
        )?;
        self.element("name", &site.name)?;
        self.element("wavelen", fmt_f64(site.wavelength_m))?;
        self.element("beamwidth", fmt_f64(site.beamwidth_deg))?;
        self.end("radarinfo")?;
        self.end("volume")?;
        self.xml
            .write_event(Event::Comment(BytesText::new(" END XML ")))?;
        self.xml.get_mut().write_all(b"\n")?;

        self.state = WriterState::FooterWritten;
        Ok(())
    }

    /// Append every queued blob in id order
    pub fn write_blobs(&mut self) -> Result<(), RainbowError> {
        self.expect(&[WriterState::FooterWritten], "write blobs")?;

        self.blobs.sort_by_key(|b| b.id);
        let out = self.xml.get_mut();
        for blob in &self.blobs {
            blob.write_to(out)?;
        }

        self.state = WriterState::BlobsWritten;
        Ok(())
    }

    /// Flush and release the sink
    pub fn finish(mut self) -> Result<(W, RainbowStats), RainbowError> {
        self.expect(&[WriterState::BlobsWritten], "finish")?;
        self.state = WriterState::Closed;

        let stats = RainbowStats {
            slices_written: self.slices,
            blobs_written: self.blobs.len(),
            bytes_written: self.xml.get_ref().count,
        };
        let mut inner = self.xml.into_inner().inner;
        inner.flush()?;
        Ok((inner, stats))
    }

    fn expect(&self, allowed: &[WriterState], operation: &'static str) -> Result<(), RainbowError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(RainbowError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), RainbowError> {
        let tag = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.xml.write_event(Event::Start(tag))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), RainbowError> {
        let tag = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.xml.write_event(Event::Empty(tag))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), RainbowError> {
        self.xml.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn element(&mut self, name: &str, value: impl ToString) -> Result<(), RainbowError> {
        let text = value.to_string();
        self.start(name, &[])?;
        self.xml.write_event(Event::Text(BytesText::new(&text)))?;
        self.end(name)
    }
}

fn date_time_attrs(time: &DateTime<Utc>) -> (String, String) {
    (
        time.format("%Y-%m-%d").to_string(),
        time.format("%H:%M:%S").to_string(),
    )
}

// Rainbow readers parse plain decimals; avoid exponent notation.
fn fmt_f64(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    format!("{}", rounded)
}

/// Byte-counting pass-through sink
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
