//! Radar parameter and elevation chunks

use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ByteOrder};
use log::debug;
use serde::Serialize;

use super::constants::{CHUNK_DSRADAR_ELEVATIONS, CHUNK_DSRADAR_PARAMS};
use super::error::MdvError;
use super::headers::ChunkHeader;
use super::record::{read_exact_bytes, BinaryRecord, FieldSpec, RecordLayout, RecordValues};

const RADAR_PARAMS_FIELDS: &[FieldSpec] = &[
    FieldSpec::si32("radar_id"),
    FieldSpec::si32("radar_type"),
    FieldSpec::si32("nfields"),
    FieldSpec::si32("ngates"),
    FieldSpec::si32("samples_per_beam"),
    FieldSpec::si32("scan_type"),
    FieldSpec::si32("scan_mode"),
    FieldSpec::si32("nfields_current"),
    FieldSpec::si32("field_flag"),
    FieldSpec::si32("polarization"),
    FieldSpec::si32("follow_mode"),
    FieldSpec::si32("prf_mode"),
    FieldSpec::si32s("spare_ints", 2),
    FieldSpec::fl32("radar_constant"),
    FieldSpec::fl32("altitude"),
    FieldSpec::fl32("latitude"),
    FieldSpec::fl32("longitude"),
    FieldSpec::fl32("gate_spacing"),
    FieldSpec::fl32("start_range"),
    FieldSpec::fl32("horiz_beam_width"),
    FieldSpec::fl32("vert_beam_width"),
    FieldSpec::fl32("pulse_width"),
    FieldSpec::fl32("prf"),
    FieldSpec::fl32("wavelength"),
    FieldSpec::fl32("xmit_peak_pwr"),
    FieldSpec::fl32("receiver_mds"),
    FieldSpec::fl32("receiver_gain"),
    FieldSpec::fl32("antenna_gain"),
    FieldSpec::fl32("system_gain"),
    FieldSpec::fl32("unambig_vel"),
    FieldSpec::fl32("unambig_range"),
    FieldSpec::fl32("meas_xmit_power_dbm_h"),
    FieldSpec::fl32("meas_xmit_power_dbm_v"),
    FieldSpec::fl32("prt"),
    FieldSpec::fl32("prt2"),
    FieldSpec::fl32s("spare_floats", 4),
    FieldSpec::chars("radar_name", 32),
    FieldSpec::chars("scan_type_name", 32),
];

/// DsRadar parameter record layout
pub const RADAR_PARAMS_LAYOUT: RecordLayout =
    RecordLayout::new("radar params chunk", RADAR_PARAMS_FIELDS);

/// Radar, antenna and scan constants
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarParams {
    /// Radar identifier
    pub radar_id: i32,
    /// Radar type code
    pub radar_type: i32,
    /// Number of fields recorded
    pub nfields: i32,
    /// Gates per beam
    pub ngates: i32,
    /// Pulses averaged per beam
    pub samples_per_beam: i32,
    /// Scan strategy identifier
    pub scan_type: i32,
    /// Scan mode code (PPI, RHI, ...)
    pub scan_mode: i32,
    /// Polarization code
    pub polarization: i32,
    /// PRF mode code
    pub prf_mode: i32,
    /// Radar constant
    pub radar_constant: f32,
    /// Antenna altitude (km)
    pub altitude: f32,
    /// Latitude (degrees)
    pub latitude: f32,
    /// Longitude (degrees)
    pub longitude: f32,
    /// Gate spacing (km)
    pub gate_spacing: f32,
    /// Range to first gate (km)
    pub start_range: f32,
    /// Horizontal beam width (degrees)
    pub horiz_beam_width: f32,
    /// Vertical beam width (degrees)
    pub vert_beam_width: f32,
    /// Pulse width (microseconds)
    pub pulse_width: f32,
    /// Pulse repetition frequency (Hz)
    pub prf: f32,
    /// Wavelength (cm)
    pub wavelength: f32,
    /// Peak transmit power (dBm)
    pub xmit_peak_pwr: f32,
    /// Receiver minimum detectable signal (dBm)
    pub receiver_mds: f32,
    /// Receiver gain (dB)
    pub receiver_gain: f32,
    /// Antenna gain (dB)
    pub antenna_gain: f32,
    /// System gain (dB)
    pub system_gain: f32,
    /// Nyquist velocity (m/s)
    pub unambig_vel: f32,
    /// Unambiguous range (km)
    pub unambig_range: f32,
    /// Radar name
    pub radar_name: String,
    /// Scan strategy name
    pub scan_type_name: String,
}

impl BinaryRecord for RadarParams {
    const LAYOUT: RecordLayout = RADAR_PARAMS_LAYOUT;

    fn from_values(v: &RecordValues) -> Result<Self, MdvError> {
        Ok(Self {
            radar_id: v.i32("radar_id")?,
            radar_type: v.i32("radar_type")?,
            nfields: v.i32("nfields")?,
            ngates: v.i32("ngates")?,
            samples_per_beam: v.i32("samples_per_beam")?,
            scan_type: v.i32("scan_type")?,
            scan_mode: v.i32("scan_mode")?,
            polarization: v.i32("polarization")?,
            prf_mode: v.i32("prf_mode")?,
            radar_constant: v.f32("radar_constant")?,
            altitude: v.f32("altitude")?,
            latitude: v.f32("latitude")?,
            longitude: v.f32("longitude")?,
            gate_spacing: v.f32("gate_spacing")?,
            start_range: v.f32("start_range")?,
            horiz_beam_width: v.f32("horiz_beam_width")?,
            vert_beam_width: v.f32("vert_beam_width")?,
            pulse_width: v.f32("pulse_width")?,
            prf: v.f32("prf")?,
            wavelength: v.f32("wavelength")?,
            xmit_peak_pwr: v.f32("xmit_peak_pwr")?,
            receiver_mds: v.f32("receiver_mds")?,
            receiver_gain: v.f32("receiver_gain")?,
            antenna_gain: v.f32("antenna_gain")?,
            system_gain: v.f32("system_gain")?,
            unambig_vel: v.f32("unambig_vel")?,
            unambig_range: v.f32("unambig_range")?,
            radar_name: v.text("radar_name")?.to_string(),
            scan_type_name: v.text("scan_type_name")?.to_string(),
        })
    }
}

/// Elevation angle of each sweep, in sweep order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ElevationList {
    /// Angles in degrees
    pub angles: Vec<f32>,
}

impl ElevationList {
    /// Number of sweeps
    pub fn len(&self) -> usize {
        self.angles.len()
    }

    /// True when no sweeps are listed
    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    /// Parse a chunk body: a 32-bit count followed by that many float angles
    pub fn from_chunk(body: &[u8]) -> Result<Self, MdvError> {
        if body.len() < 4 {
            return Err(MdvError::Truncated {
                record: "elevation chunk".to_string(),
                expected: 4,
                available: body.len(),
            });
        }
        let count = BigEndian::read_i32(&body[..4]);
        let count = usize::try_from(count).map_err(|_| {
            MdvError::InvalidHeader(format!("negative elevation count {}", count))
        })?;
        let needed = count.saturating_mul(4).saturating_add(4);
        if body.len() < needed {
            return Err(MdvError::Truncated {
                record: "elevation chunk".to_string(),
                expected: needed,
                available: body.len(),
            });
        }
        let angles = body[4..needed]
            .chunks_exact(4)
            .map(BigEndian::read_f32)
            .collect();
        Ok(Self { angles })
    }
}

/// Side records decoded from the chunk table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RadarChunks {
    /// Radar parameters, if a parameter chunk is present
    pub params: Option<RadarParams>,
    /// Elevation angles, if an elevation chunk is present
    pub elevations: Option<ElevationList>,
}

/// Decode the radar parameter and elevation chunks; other chunk types are skipped.
pub fn decode_chunks<R: Read + Seek>(
    reader: &mut R,
    chunks: &[ChunkHeader],
) -> Result<RadarChunks, MdvError> {
    let mut out = RadarChunks::default();

    for chunk in chunks {
        match chunk.chunk_id {
            CHUNK_DSRADAR_PARAMS => {
                if chunk.size < RADAR_PARAMS_LAYOUT.byte_len() {
                    return Err(MdvError::Truncated {
                        record: RADAR_PARAMS_LAYOUT.name.to_string(),
                        expected: RADAR_PARAMS_LAYOUT.byte_len(),
                        available: chunk.size,
                    });
                }
                reader.seek(SeekFrom::Start(chunk.chunk_data_offset))?;
                let params = RadarParams::read_from(reader)?;
                debug!(
                    "Radar params: {} ({} gates, {} samples/beam)",
                    params.radar_name, params.ngates, params.samples_per_beam
                );
                out.params = Some(params);
            }
            CHUNK_DSRADAR_ELEVATIONS => {
                reader.seek(SeekFrom::Start(chunk.chunk_data_offset))?;
                let body = read_exact_bytes(reader, chunk.size, "elevation chunk")?;
                let elevations = ElevationList::from_chunk(&body)?;
                debug!("Elevation list: {:?}", elevations.angles);
                out.elevations = Some(elevations);
            }
            other => {
                debug!("Ignoring chunk id {} ({})", other, chunk.info);
            }
        }
    }

    Ok(out)
}
