//! MDV master, field, vlevel and chunk headers

use std::io::{Read, Seek, SeekFrom};

use log::debug;
use serde::Serialize;

use super::constants::{
    EncodingType, ProjectionType, TransformType, CHUNK_HEADER_LEN, FIELD_HEADER_LEN,
    MASTER_HEADER_LEN, MAX_VLEVELS, VLEVEL_HEADER_LEN,
};
use super::error::MdvError;
use super::record::{BinaryRecord, FieldSpec, RecordLayout, RecordValues};

const MASTER_FIELDS: &[FieldSpec] = &[
    FieldSpec::si32("record_len1"),
    FieldSpec::si32("struct_id"),
    FieldSpec::si32("revision_number"),
    FieldSpec::si32("time_gen"),
    FieldSpec::si32("user_time"),
    FieldSpec::si32("time_begin"),
    FieldSpec::si32("time_end"),
    FieldSpec::si32("time_centroid"),
    FieldSpec::si32("time_expire"),
    FieldSpec::si32("num_data_times"),
    FieldSpec::si32("index_number"),
    FieldSpec::si32("data_dimension"),
    FieldSpec::si32("data_collection_type"),
    FieldSpec::si32("user_data"),
    FieldSpec::si32("native_vlevel_type"),
    FieldSpec::si32("vlevel_type"),
    FieldSpec::si32("vlevel_included"),
    FieldSpec::si32("grid_orientation"),
    FieldSpec::si32("data_ordering"),
    FieldSpec::si32("n_fields"),
    FieldSpec::si32("max_nx"),
    FieldSpec::si32("max_ny"),
    FieldSpec::si32("max_nz"),
    FieldSpec::si32("n_chunks"),
    FieldSpec::si32("field_hdr_offset"),
    FieldSpec::si32("vlevel_hdr_offset"),
    FieldSpec::si32("chunk_hdr_offset"),
    FieldSpec::si32("field_grids_differ"),
    FieldSpec::si32s("user_data_si32", 8),
    FieldSpec::si32("time_written"),
    FieldSpec::si32("epoch"),
    FieldSpec::si32("forecast_time"),
    FieldSpec::si32("forecast_delta"),
    FieldSpec::si32s("unused_si32", 2),
    FieldSpec::fl32s("user_data_fl32", 6),
    FieldSpec::fl32("sensor_lon"),
    FieldSpec::fl32("sensor_lat"),
    FieldSpec::fl32("sensor_alt"),
    FieldSpec::fl32s("unused_fl32", 12),
    FieldSpec::chars("data_set_info", 512),
    FieldSpec::chars("data_set_name", 128),
    FieldSpec::chars("data_set_source", 128),
    FieldSpec::si32("record_len2"),
];

const FIELD_FIELDS: &[FieldSpec] = &[
    FieldSpec::si32("record_len1"),
    FieldSpec::si32("struct_id"),
    FieldSpec::si32("field_code"),
    FieldSpec::si32("user_time1"),
    FieldSpec::si32("forecast_delta"),
    FieldSpec::si32("user_time2"),
    FieldSpec::si32("user_time3"),
    FieldSpec::si32("forecast_time"),
    FieldSpec::si32("user_time4"),
    FieldSpec::si32("nx"),
    FieldSpec::si32("ny"),
    FieldSpec::si32("nz"),
    FieldSpec::si32("proj_type"),
    FieldSpec::si32("encoding_type"),
    FieldSpec::si32("data_element_nbytes"),
    FieldSpec::si32("field_data_offset"),
    FieldSpec::si32("volume_size"),
    FieldSpec::si32s("user_data_si32", 10),
    FieldSpec::si32("compression_type"),
    FieldSpec::si32("transform_type"),
    FieldSpec::si32("scaling_type"),
    FieldSpec::si32("native_vlevel_type"),
    FieldSpec::si32("vlevel_type"),
    FieldSpec::si32("dz_constant"),
    FieldSpec::si32("data_dimension"),
    FieldSpec::si32("zoom_clipped"),
    FieldSpec::si32("zoom_no_overlap"),
    FieldSpec::si32("requested_compression"),
    FieldSpec::si32("unused_si32"),
    FieldSpec::fl32("proj_origin_lat"),
    FieldSpec::fl32("proj_origin_lon"),
    FieldSpec::fl32s("proj_param", 8),
    FieldSpec::fl32("vert_reference"),
    FieldSpec::fl32("grid_dx"),
    FieldSpec::fl32("grid_dy"),
    FieldSpec::fl32("grid_dz"),
    FieldSpec::fl32("grid_minx"),
    FieldSpec::fl32("grid_miny"),
    FieldSpec::fl32("grid_minz"),
    FieldSpec::fl32("scale"),
    FieldSpec::fl32("bias"),
    FieldSpec::fl32("bad_data_value"),
    FieldSpec::fl32("missing_data_value"),
    FieldSpec::fl32("proj_rotation"),
    FieldSpec::fl32s("user_data_fl32", 4),
    FieldSpec::fl32("min_value"),
    FieldSpec::fl32("max_value"),
    FieldSpec::fl32("min_value_orig_vol"),
    FieldSpec::fl32("max_value_orig_vol"),
    FieldSpec::fl32s("unused_fl32", 3),
    FieldSpec::chars("field_name_long", 64),
    FieldSpec::chars("field_name", 16),
    FieldSpec::chars("units", 16),
    FieldSpec::chars("transform", 16),
    FieldSpec::chars("unused_char", 16),
    FieldSpec::si32("record_len2"),
];

const VLEVEL_FIELDS: &[FieldSpec] = &[
    FieldSpec::si32("record_len1"),
    FieldSpec::si32("struct_id"),
    FieldSpec::si32s("type", MAX_VLEVELS),
    FieldSpec::si32s("unused_si32", 4),
    FieldSpec::fl32s("level", MAX_VLEVELS),
    FieldSpec::fl32s("unused_fl32", 5),
    FieldSpec::si32("record_len2"),
];

const CHUNK_FIELDS: &[FieldSpec] = &[
    FieldSpec::si32("record_len1"),
    FieldSpec::si32("struct_id"),
    FieldSpec::si32("chunk_id"),
    FieldSpec::si32("chunk_data_offset"),
    FieldSpec::si32("size"),
    FieldSpec::si32s("unused_si32", 2),
    FieldSpec::chars("info", 480),
    FieldSpec::si32("record_len2"),
];

/// Master header layout
pub const MASTER_LAYOUT: RecordLayout = RecordLayout::new("master header", MASTER_FIELDS);
/// Field header layout
pub const FIELD_LAYOUT: RecordLayout = RecordLayout::new("field header", FIELD_FIELDS);
/// Vlevel header layout
pub const VLEVEL_LAYOUT: RecordLayout = RecordLayout::new("vlevel header", VLEVEL_FIELDS);
/// Chunk header layout
pub const CHUNK_LAYOUT: RecordLayout = RecordLayout::new("chunk header", CHUNK_FIELDS);

const _: () = assert!(MASTER_LAYOUT.byte_len() == MASTER_HEADER_LEN);
const _: () = assert!(FIELD_LAYOUT.byte_len() == FIELD_HEADER_LEN);
const _: () = assert!(VLEVEL_LAYOUT.byte_len() == VLEVEL_HEADER_LEN);
const _: () = assert!(CHUNK_LAYOUT.byte_len() == CHUNK_HEADER_LEN);

/// Leading record of an MDV file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasterHeader {
    /// Generation time (Unix seconds)
    pub time_gen: i64,
    /// Start of the data interval (Unix seconds)
    pub time_begin: i64,
    /// End of the data interval (Unix seconds)
    pub time_end: i64,
    /// Centroid time (Unix seconds)
    pub time_centroid: i64,
    /// Expiry time (Unix seconds)
    pub time_expire: i64,
    /// Time the file was written (Unix seconds)
    pub time_written: i64,
    /// 2 or 3
    pub data_dimension: i32,
    /// Measured, extrapolated, forecast, ...
    pub data_collection_type: i32,
    /// Vertical level type in the native data
    pub native_vlevel_type: i32,
    /// Vertical level type of the stored grids
    pub vlevel_type: i32,
    /// Whether vlevel headers are present
    pub vlevel_included: bool,
    /// Grid orientation code
    pub grid_orientation: i32,
    /// Data ordering code
    pub data_ordering: i32,
    /// Number of fields
    pub n_fields: usize,
    /// Largest nx over all fields
    pub max_nx: i32,
    /// Largest ny over all fields
    pub max_ny: i32,
    /// Largest nz over all fields
    pub max_nz: i32,
    /// Number of chunks
    pub n_chunks: usize,
    /// Absolute offset of the field header array
    pub field_hdr_offset: u64,
    /// Absolute offset of the vlevel header array
    pub vlevel_hdr_offset: u64,
    /// Absolute offset of the chunk header array
    pub chunk_hdr_offset: u64,
    /// Whether fields have different grids
    pub field_grids_differ: bool,
    /// Sensor longitude (degrees)
    pub sensor_lon: f32,
    /// Sensor latitude (degrees)
    pub sensor_lat: f32,
    /// Sensor altitude (km)
    pub sensor_alt: f32,
    /// Free-text dataset description
    pub data_set_info: String,
    /// Dataset name
    pub data_set_name: String,
    /// Dataset source
    pub data_set_source: String,
}

impl BinaryRecord for MasterHeader {
    const LAYOUT: RecordLayout = MASTER_LAYOUT;

    fn from_values(v: &RecordValues) -> Result<Self, MdvError> {
        check_record_len(v, &Self::LAYOUT)?;
        Ok(Self {
            time_gen: v.int("time_gen")?,
            time_begin: v.int("time_begin")?,
            time_end: v.int("time_end")?,
            time_centroid: v.int("time_centroid")?,
            time_expire: v.int("time_expire")?,
            time_written: v.int("time_written")?,
            data_dimension: v.i32("data_dimension")?,
            data_collection_type: v.i32("data_collection_type")?,
            native_vlevel_type: v.i32("native_vlevel_type")?,
            vlevel_type: v.i32("vlevel_type")?,
            vlevel_included: v.int("vlevel_included")? != 0,
            grid_orientation: v.i32("grid_orientation")?,
            data_ordering: v.i32("data_ordering")?,
            n_fields: non_negative(v, "n_fields")?,
            max_nx: v.i32("max_nx")?,
            max_ny: v.i32("max_ny")?,
            max_nz: v.i32("max_nz")?,
            n_chunks: non_negative(v, "n_chunks")?,
            field_hdr_offset: non_negative(v, "field_hdr_offset")? as u64,
            vlevel_hdr_offset: non_negative(v, "vlevel_hdr_offset")? as u64,
            chunk_hdr_offset: non_negative(v, "chunk_hdr_offset")? as u64,
            field_grids_differ: v.int("field_grids_differ")? != 0,
            sensor_lon: v.f32("sensor_lon")?,
            sensor_lat: v.f32("sensor_lat")?,
            sensor_alt: v.f32("sensor_alt")?,
            data_set_info: v.text("data_set_info")?.to_string(),
            data_set_name: v.text("data_set_name")?.to_string(),
            data_set_source: v.text("data_set_source")?.to_string(),
        })
    }
}

/// Per-field description of grid shape, encoding and scaling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldHeader {
    /// GRIB-style field code
    pub field_code: i32,
    /// Number of columns (gates for polar grids)
    pub nx: usize,
    /// Number of rows (azimuths for polar grids)
    pub ny: usize,
    /// Number of vertical levels
    pub nz: usize,
    /// Grid projection
    pub proj_type: ProjectionType,
    /// Sample encoding
    pub encoding_type: EncodingType,
    /// Bytes per stored sample
    pub data_element_nbytes: usize,
    /// Absolute offset of this field's data block
    pub field_data_offset: u64,
    /// Size of the data block in bytes
    pub volume_size: u64,
    /// Compression requested when the file was written
    pub compression_type: i32,
    /// Nonlinear transform
    pub transform_type: TransformType,
    /// Scaling type code
    pub scaling_type: i32,
    /// Native vertical level type
    pub native_vlevel_type: i32,
    /// Stored vertical level type
    pub vlevel_type: i32,
    /// Projection origin latitude
    pub proj_origin_lat: f32,
    /// Projection origin longitude
    pub proj_origin_lon: f32,
    /// Column spacing (km, or degrees for lat/lon)
    pub grid_dx: f32,
    /// Row spacing (km, or degrees of azimuth for polar grids)
    pub grid_dy: f32,
    /// Level spacing
    pub grid_dz: f32,
    /// First column coordinate (start range for polar grids)
    pub grid_minx: f32,
    /// First row coordinate
    pub grid_miny: f32,
    /// First level coordinate
    pub grid_minz: f32,
    /// Physical value = raw * scale + bias
    pub scale: f32,
    /// Physical value = raw * scale + bias
    pub bias: f32,
    /// Raw value marking bad data
    pub bad_data_value: f32,
    /// Raw value marking missing data
    pub missing_data_value: f32,
    /// Minimum physical value in the volume
    pub min_value: f32,
    /// Maximum physical value in the volume
    pub max_value: f32,
    /// Long field name
    pub field_name_long: String,
    /// Short field name, e.g. `DBZ`
    pub field_name: String,
    /// Physical units
    pub units: String,
    /// Transform description
    pub transform: String,
}

impl BinaryRecord for FieldHeader {
    const LAYOUT: RecordLayout = FIELD_LAYOUT;

    fn from_values(v: &RecordValues) -> Result<Self, MdvError> {
        check_record_len(v, &Self::LAYOUT)?;
        let nz = non_negative(v, "nz")?;
        if nz > MAX_VLEVELS {
            return Err(MdvError::InvalidHeader(format!(
                "field header nz {} exceeds {} levels",
                nz, MAX_VLEVELS
            )));
        }
        Ok(Self {
            field_code: v.i32("field_code")?,
            nx: non_negative(v, "nx")?,
            ny: non_negative(v, "ny")?,
            nz,
            proj_type: ProjectionType::from(v.i32("proj_type")?),
            encoding_type: EncodingType::try_from(v.i32("encoding_type")?)?,
            data_element_nbytes: non_negative(v, "data_element_nbytes")?,
            field_data_offset: non_negative(v, "field_data_offset")? as u64,
            volume_size: non_negative(v, "volume_size")? as u64,
            compression_type: v.i32("compression_type")?,
            transform_type: TransformType::try_from(v.i32("transform_type")?)?,
            scaling_type: v.i32("scaling_type")?,
            native_vlevel_type: v.i32("native_vlevel_type")?,
            vlevel_type: v.i32("vlevel_type")?,
            proj_origin_lat: v.f32("proj_origin_lat")?,
            proj_origin_lon: v.f32("proj_origin_lon")?,
            grid_dx: v.f32("grid_dx")?,
            grid_dy: v.f32("grid_dy")?,
            grid_dz: v.f32("grid_dz")?,
            grid_minx: v.f32("grid_minx")?,
            grid_miny: v.f32("grid_miny")?,
            grid_minz: v.f32("grid_minz")?,
            scale: v.f32("scale")?,
            bias: v.f32("bias")?,
            bad_data_value: v.f32("bad_data_value")?,
            missing_data_value: v.f32("missing_data_value")?,
            min_value: v.f32("min_value")?,
            max_value: v.f32("max_value")?,
            field_name_long: v.text("field_name_long")?.to_string(),
            field_name: v.text("field_name")?.to_string(),
            units: v.text("units")?.to_string(),
            transform: v.text("transform")?.to_string(),
        })
    }
}

/// Vertical levels of one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VlevelHeader {
    /// Level type code per level
    pub types: Vec<i32>,
    /// Level value per level (elevation angle for polar grids)
    pub levels: Vec<f32>,
}

impl VlevelHeader {
    /// Drop the unused tail beyond the field's `nz` levels
    pub fn truncate(&mut self, nz: usize) {
        self.types.truncate(nz);
        self.levels.truncate(nz);
    }
}

impl BinaryRecord for VlevelHeader {
    const LAYOUT: RecordLayout = VLEVEL_LAYOUT;

    fn from_values(v: &RecordValues) -> Result<Self, MdvError> {
        check_record_len(v, &Self::LAYOUT)?;
        Ok(Self {
            types: v.ints("type")?.iter().map(|&t| t as i32).collect(),
            levels: v.floats("level")?.iter().map(|&l| l as f32).collect(),
        })
    }
}

/// Type-tagged side record descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkHeader {
    /// Chunk type identifier
    pub chunk_id: i32,
    /// Absolute offset of the chunk body
    pub chunk_data_offset: u64,
    /// Chunk body size in bytes
    pub size: usize,
    /// Free-text description
    pub info: String,
}

impl BinaryRecord for ChunkHeader {
    const LAYOUT: RecordLayout = CHUNK_LAYOUT;

    fn from_values(v: &RecordValues) -> Result<Self, MdvError> {
        check_record_len(v, &Self::LAYOUT)?;
        Ok(Self {
            chunk_id: v.i32("chunk_id")?,
            chunk_data_offset: non_negative(v, "chunk_data_offset")? as u64,
            size: non_negative(v, "size")?,
            info: v.text("info")?.to_string(),
        })
    }
}

/// All headers of one MDV file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeHeaders {
    /// Master header
    pub master: MasterHeader,
    /// One header per field, in file order
    pub fields: Vec<FieldHeader>,
    /// One vlevel header per field, truncated to the field's `nz`
    pub vlevels: Vec<VlevelHeader>,
    /// Chunk headers (empty when `n_chunks == 0`)
    pub chunks: Vec<ChunkHeader>,
}

/// Read the master header and the header arrays it declares.
pub fn read_headers<R: Read + Seek>(reader: &mut R) -> Result<VolumeHeaders, MdvError> {
    reader.seek(SeekFrom::Start(0))?;
    let master = MasterHeader::read_from(reader)?;
    debug!(
        "Master header: {} fields, {} chunks, begin time {}",
        master.n_fields, master.n_chunks, master.time_begin
    );

    reader.seek(SeekFrom::Start(master.field_hdr_offset))?;
    let fields = (0..master.n_fields)
        .map(|_| FieldHeader::read_from(reader))
        .collect::<Result<Vec<_>, _>>()?;

    reader.seek(SeekFrom::Start(master.vlevel_hdr_offset))?;
    let mut vlevels = (0..master.n_fields)
        .map(|_| VlevelHeader::read_from(reader))
        .collect::<Result<Vec<_>, _>>()?;
    for (vlevel, field) in vlevels.iter_mut().zip(&fields) {
        vlevel.truncate(field.nz);
    }

    let chunks = if master.n_chunks > 0 {
        reader.seek(SeekFrom::Start(master.chunk_hdr_offset))?;
        (0..master.n_chunks)
            .map(|_| ChunkHeader::read_from(reader))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        Vec::new()
    };

    for field in &fields {
        debug!(
            "Field {}: {}x{}x{} {:?} {:?}",
            field.field_name, field.nx, field.ny, field.nz, field.encoding_type, field.proj_type
        );
    }

    Ok(VolumeHeaders {
        master,
        fields,
        vlevels,
        chunks,
    })
}

fn non_negative(v: &RecordValues, name: &str) -> Result<usize, MdvError> {
    let value = v.int(name)?;
    usize::try_from(value)
        .map_err(|_| MdvError::InvalidHeader(format!("{} must be non-negative, got {}", name, value)))
}

// Both FORTRAN record markers hold the body length, excluding the markers.
fn check_record_len(v: &RecordValues, layout: &RecordLayout) -> Result<(), MdvError> {
    let expected = (layout.byte_len() - 8) as i64;
    for marker in ["record_len1", "record_len2"] {
        let found = v.int(marker)?;
        if found != expected {
            return Err(MdvError::InvalidHeader(format!(
                "{} {} is {}, expected {}",
                layout.name, marker, found, expected
            )));
        }
    }
    Ok(())
}
