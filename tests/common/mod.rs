//! Synthetic MDV file builder shared by the integration tests.
//!
//! Layout produced by [`MdvFixture::build`]:
//!
//! ```text
//! master | field headers | vlevel headers | chunk headers | chunk bodies | field blocks
//! ```

#![allow(dead_code)]

use std::io::Write;

use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;

use mdv2rainbow::mdv::record::Value;
use mdv2rainbow::mdv::{
    CompressionKind, CHUNK_DSRADAR_ELEVATIONS, CHUNK_DSRADAR_PARAMS, CHUNK_HEADER_LEN,
    CHUNK_LAYOUT, FIELD_HEADER_LEN, FIELD_LAYOUT, MASTER_HEADER_LEN, MASTER_LAYOUT,
    RADAR_PARAMS_LAYOUT, VLEVEL_HEADER_LEN, VLEVEL_LAYOUT,
};

/// Unix time of 2023-06-01 14:30:05 UTC
pub const BEGIN_TIME: i64 = 1_685_629_805;

pub const ENCODING_INT8: i64 = 1;
pub const ENCODING_INT16: i64 = 2;
pub const ENCODING_FLOAT32: i64 = 5;
pub const ENCODING_RGBA32: i64 = 7;

pub const PROJ_LATLON: i64 = 0;
pub const PROJ_FLAT: i64 = 8;
pub const PROJ_POLAR: i64 = 9;

/// One field of a fixture
#[derive(Debug, Clone)]
pub struct FixtureField {
    pub name: String,
    pub nx: usize,
    pub ny: usize,
    /// Raw big-endian sample bytes, one entry per level
    pub planes: Vec<Vec<u8>>,
    pub encoding: i64,
    pub nbytes: i64,
    pub proj_type: i64,
    pub transform: i64,
    pub compression: CompressionKind,
    pub scale: f64,
    pub bias: f64,
    /// Vlevel values (elevation angles)
    pub levels: Vec<f64>,
    pub grid_dx: f64,
    pub grid_dy: f64,
    pub grid_minx: f64,
}

impl FixtureField {
    /// Polar 8-bit zlib field with identity scaling
    pub fn int8(name: &str, nx: usize, ny: usize, planes: Vec<Vec<u8>>) -> Self {
        let levels = (0..planes.len()).map(|i| 0.5 + i as f64).collect();
        Self {
            name: name.to_string(),
            nx,
            ny,
            planes,
            encoding: ENCODING_INT8,
            nbytes: 1,
            proj_type: PROJ_POLAR,
            transform: 0,
            compression: CompressionKind::Zlib,
            scale: 1.0,
            bias: 0.0,
            levels,
            grid_dx: 0.25,
            grid_dy: 1.0,
            grid_minx: 0.125,
        }
    }

    /// Polar 16-bit zlib field
    pub fn int16(name: &str, nx: usize, ny: usize, planes: &[Vec<u16>]) -> Self {
        Self {
            encoding: ENCODING_INT16,
            nbytes: 2,
            ..Self::int8(name, nx, ny, planes.iter().map(|p| u16_bytes(p)).collect())
        }
    }

    /// Polar 32-bit float zlib field
    pub fn float32(name: &str, nx: usize, ny: usize, planes: &[Vec<f32>]) -> Self {
        Self {
            encoding: ENCODING_FLOAT32,
            nbytes: 4,
            ..Self::int8(name, nx, ny, planes.iter().map(|p| f32_bytes(p)).collect())
        }
    }

    pub fn with_scale(mut self, scale: f64, bias: f64) -> Self {
        self.scale = scale;
        self.bias = bias;
        self
    }

    pub fn with_compression(mut self, compression: CompressionKind) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_projection(mut self, proj_type: i64) -> Self {
        self.proj_type = proj_type;
        self
    }

    pub fn with_transform(mut self, transform: i64) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_levels(mut self, levels: &[f64]) -> Self {
        self.levels = levels.to_vec();
        self
    }

    fn nz(&self) -> usize {
        self.planes.len()
    }

    /// Level table plus compressed planes
    fn block(&self) -> Vec<u8> {
        let planes: Vec<Vec<u8>> = self
            .planes
            .iter()
            .map(|raw| compressed_plane(raw, self.compression))
            .collect();

        let mut offsets = Vec::new();
        let mut sizes = Vec::new();
        let mut next = 0u32;
        for plane in &planes {
            offsets.push(next);
            sizes.push(plane.len() as u32);
            next += plane.len() as u32;
        }

        let mut out = Vec::new();
        for v in offsets.iter().chain(&sizes) {
            out.extend_from_slice(&v.to_be_bytes());
        }
        for plane in &planes {
            out.extend_from_slice(plane);
        }
        out
    }
}

/// Radar parameter chunk contents
#[derive(Debug, Clone)]
pub struct FixtureRadar {
    pub radar_id: i64,
    pub radar_name: String,
    pub scan_type_name: String,
    pub altitude_km: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub gate_spacing_km: f64,
    pub start_range_km: f64,
    pub beam_width: f64,
    pub wavelength_cm: f64,
    pub samples_per_beam: i64,
}

impl Default for FixtureRadar {
    fn default() -> Self {
        Self {
            radar_id: 17,
            radar_name: "OPERA".to_string(),
            scan_type_name: "SUR".to_string(),
            altitude_km: 0.5,
            latitude: 46.25,
            longitude: 7.5,
            gate_spacing_km: 0.25,
            start_range_km: 0.0,
            beam_width: 0.95,
            wavelength_cm: 5.3,
            samples_per_beam: 32,
        }
    }
}

impl FixtureRadar {
    fn body(&self) -> Vec<u8> {
        RADAR_PARAMS_LAYOUT.encode(&[
            ("radar_id", Value::Int(self.radar_id)),
            ("samples_per_beam", Value::Int(self.samples_per_beam)),
            ("altitude", Value::Float(self.altitude_km)),
            ("latitude", Value::Float(self.latitude)),
            ("longitude", Value::Float(self.longitude)),
            ("gate_spacing", Value::Float(self.gate_spacing_km)),
            ("start_range", Value::Float(self.start_range_km)),
            ("horiz_beam_width", Value::Float(self.beam_width)),
            ("vert_beam_width", Value::Float(self.beam_width)),
            ("wavelength", Value::Float(self.wavelength_cm)),
            ("radar_name", Value::Text(self.radar_name.clone())),
            ("scan_type_name", Value::Text(self.scan_type_name.clone())),
        ])
    }
}

/// A complete MDV file description
#[derive(Debug, Clone, Default)]
pub struct MdvFixture {
    pub time_begin: i64,
    pub fields: Vec<FixtureField>,
    pub radar: Option<FixtureRadar>,
    pub elevations: Option<Vec<f32>>,
    /// Add a chunk with an id the decoder does not interpret
    pub unknown_chunk: bool,
    pub sensor: (f64, f64, f64),
    pub data_set_name: String,
    pub data_set_source: String,
}

impl MdvFixture {
    pub fn new() -> Self {
        Self {
            time_begin: BEGIN_TIME,
            sensor: (7.25, 46.5, 0.75),
            data_set_name: "test volume".to_string(),
            data_set_source: "fixture".to_string(),
            ..Default::default()
        }
    }

    pub fn field(mut self, field: FixtureField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn radar(mut self, radar: FixtureRadar) -> Self {
        self.radar = Some(radar);
        self
    }

    pub fn elevations(mut self, angles: &[f32]) -> Self {
        self.elevations = Some(angles.to_vec());
        self
    }

    pub fn unknown_chunk(mut self) -> Self {
        self.unknown_chunk = true;
        self
    }

    /// Serialize to MDV bytes
    pub fn build(&self) -> Vec<u8> {
        let mut chunks: Vec<(i64, String, Vec<u8>)> = Vec::new();
        if let Some(radar) = &self.radar {
            chunks.push((CHUNK_DSRADAR_PARAMS as i64, "DsRadar params".into(), radar.body()));
        }
        if let Some(angles) = &self.elevations {
            let mut body = (angles.len() as i32).to_be_bytes().to_vec();
            for a in angles {
                body.extend_from_slice(&a.to_be_bytes());
            }
            chunks.push((CHUNK_DSRADAR_ELEVATIONS as i64, "Elevation list".into(), body));
        }
        if self.unknown_chunk {
            chunks.push((99, "Calibration".into(), vec![0xAB; 40]));
        }

        let n_fields = self.fields.len();
        let field_hdr_offset = MASTER_HEADER_LEN;
        let vlevel_hdr_offset = field_hdr_offset + n_fields * FIELD_HEADER_LEN;
        let chunk_hdr_offset = vlevel_hdr_offset + n_fields * VLEVEL_HEADER_LEN;
        let mut cursor = chunk_hdr_offset + chunks.len() * CHUNK_HEADER_LEN;

        let mut chunk_offsets = Vec::new();
        for (_, _, body) in &chunks {
            chunk_offsets.push(cursor);
            cursor += body.len();
        }

        let blocks: Vec<Vec<u8>> = self.fields.iter().map(FixtureField::block).collect();
        let mut field_offsets = Vec::new();
        for block in &blocks {
            field_offsets.push(cursor);
            cursor += block.len();
        }

        let max_nz = self.fields.iter().map(FixtureField::nz).max().unwrap_or(0);
        let mut out = MASTER_LAYOUT.encode(&[
            ("record_len1", Value::Int(MASTER_HEADER_LEN as i64 - 8)),
            ("struct_id", Value::Int(14152)),
            ("revision_number", Value::Int(2)),
            ("time_gen", Value::Int(self.time_begin)),
            ("time_begin", Value::Int(self.time_begin)),
            ("time_end", Value::Int(self.time_begin + 300)),
            ("time_centroid", Value::Int(self.time_begin + 150)),
            ("data_dimension", Value::Int(3)),
            ("vlevel_included", Value::Int(1)),
            ("n_fields", Value::Int(n_fields as i64)),
            ("max_nz", Value::Int(max_nz as i64)),
            ("n_chunks", Value::Int(chunks.len() as i64)),
            ("field_hdr_offset", Value::Int(field_hdr_offset as i64)),
            ("vlevel_hdr_offset", Value::Int(vlevel_hdr_offset as i64)),
            ("chunk_hdr_offset", Value::Int(chunk_hdr_offset as i64)),
            ("sensor_lon", Value::Float(self.sensor.0)),
            ("sensor_lat", Value::Float(self.sensor.1)),
            ("sensor_alt", Value::Float(self.sensor.2)),
            ("data_set_name", Value::Text(self.data_set_name.clone())),
            ("data_set_source", Value::Text(self.data_set_source.clone())),
            ("record_len2", Value::Int(MASTER_HEADER_LEN as i64 - 8)),
        ]);

        for ((field, offset), block) in self.fields.iter().zip(&field_offsets).zip(&blocks) {
            out.extend(FIELD_LAYOUT.encode(&[
                ("record_len1", Value::Int(FIELD_HEADER_LEN as i64 - 8)),
                ("struct_id", Value::Int(14153)),
                ("nx", Value::Int(field.nx as i64)),
                ("ny", Value::Int(field.ny as i64)),
                ("nz", Value::Int(field.nz() as i64)),
                ("proj_type", Value::Int(field.proj_type)),
                ("encoding_type", Value::Int(field.encoding)),
                ("data_element_nbytes", Value::Int(field.nbytes)),
                ("field_data_offset", Value::Int(*offset as i64)),
                ("volume_size", Value::Int(block.len() as i64)),
                ("compression_type", Value::Int(3)),
                ("transform_type", Value::Int(field.transform)),
                ("grid_dx", Value::Float(field.grid_dx)),
                ("grid_dy", Value::Float(field.grid_dy)),
                ("grid_minx", Value::Float(field.grid_minx)),
                ("scale", Value::Float(field.scale)),
                ("bias", Value::Float(field.bias)),
                ("field_name_long", Value::Text(format!("{} long name", field.name))),
                ("field_name", Value::Text(field.name.clone())),
                ("units", Value::Text("unit".to_string())),
                ("record_len2", Value::Int(FIELD_HEADER_LEN as i64 - 8)),
            ]));
        }

        for field in &self.fields {
            out.extend(VLEVEL_LAYOUT.encode(&[
                ("record_len1", Value::Int(VLEVEL_HEADER_LEN as i64 - 8)),
                ("struct_id", Value::Int(14154)),
                ("type", Value::Ints(vec![9; field.nz()])),
                ("level", Value::Floats(field.levels.clone())),
                ("record_len2", Value::Int(VLEVEL_HEADER_LEN as i64 - 8)),
            ]));
        }

        for ((id, info, body), offset) in chunks.iter().zip(&chunk_offsets) {
            out.extend(CHUNK_LAYOUT.encode(&[
                ("record_len1", Value::Int(CHUNK_HEADER_LEN as i64 - 8)),
                ("struct_id", Value::Int(14155)),
                ("chunk_id", Value::Int(*id)),
                ("chunk_data_offset", Value::Int(*offset as i64)),
                ("size", Value::Int(body.len() as i64)),
                ("info", Value::Text(info.clone())),
                ("record_len2", Value::Int(CHUNK_HEADER_LEN as i64 - 8)),
            ]));
        }

        for (_, _, body) in &chunks {
            out.extend_from_slice(body);
        }
        for block in &blocks {
            out.extend_from_slice(block);
        }
        out
    }
}

/// Compression info record followed by the coded bytes
pub fn compressed_plane(raw: &[u8], kind: CompressionKind) -> Vec<u8> {
    let coded = match kind {
        CompressionKind::Zlib => {
            let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
            enc.write_all(raw).unwrap();
            enc.finish().unwrap()
        }
        CompressionKind::Gzip => {
            let mut enc = GzEncoder::new(Vec::new(), Compression::default());
            enc.write_all(raw).unwrap();
            enc.finish().unwrap()
        }
        _ => raw.to_vec(),
    };

    let mut out = Vec::with_capacity(24 + coded.len());
    for v in [
        kind.cookie(),
        raw.len() as u32,
        (coded.len() + 24) as u32,
        coded.len() as u32,
        0,
        0,
    ] {
        out.extend_from_slice(&v.to_be_bytes());
    }
    out.extend_from_slice(&coded);
    out
}

pub fn u16_bytes(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

/// Split a Rainbow volume into its XML text and `(blobid, payload)` pairs
pub fn split_rainbow(bytes: &[u8]) -> (String, Vec<(usize, Vec<u8>)>) {
    let marker = b"<!-- END XML -->\n";
    let end = bytes
        .windows(marker.len())
        .position(|w| w == marker)
        .expect("missing END XML marker")
        + marker.len();
    let xml = String::from_utf8(bytes[..end].to_vec()).unwrap();

    let mut blobs = Vec::new();
    let mut rest = &bytes[end..];
    while !rest.is_empty() {
        let newline = rest.iter().position(|&b| b == b'\n').unwrap();
        let tag = std::str::from_utf8(&rest[..newline]).unwrap();
        let id = attr(tag, "blobid");
        let size = attr(tag, "size");
        let payload = rest[newline + 1..newline + 1 + size].to_vec();
        let tail = &rest[newline + 1 + size..];
        assert!(tail.starts_with(b"\n</BLOB>\n"), "bad blob close for {}", id);
        rest = &tail[b"\n</BLOB>\n".len()..];
        blobs.push((id, payload));
    }
    (xml, blobs)
}

fn attr(tag: &str, name: &str) -> usize {
    let key = format!("{}=\"", name);
    let start = tag.find(&key).unwrap() + key.len();
    let len = tag[start..].find('"').unwrap();
    tag[start..start + len].parse().unwrap()
}
