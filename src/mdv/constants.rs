//! MDV format constants and closed code enumerations

use serde::Serialize;

use super::error::MdvError;

/// Size of the master header in bytes
pub const MASTER_HEADER_LEN: usize = 1024;
/// Size of one field header in bytes
pub const FIELD_HEADER_LEN: usize = 416;
/// Size of one vlevel header in bytes
pub const VLEVEL_HEADER_LEN: usize = 1024;
/// Size of one chunk header in bytes
pub const CHUNK_HEADER_LEN: usize = 512;

/// Maximum number of vertical levels a vlevel header can describe
pub const MAX_VLEVELS: usize = 122;

/// Size of the compression info record preceding each compressed plane
pub const COMPRESSION_INFO_LEN: usize = 24;

/// Chunk id of the DsRadar parameter record
pub const CHUNK_DSRADAR_PARAMS: i32 = 3;
/// Chunk id of the DsRadar elevation list
pub const CHUNK_DSRADAR_ELEVATIONS: i32 = 4;

/// Sample encoding of a field's data planes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EncodingType {
    /// 8-bit unsigned integer
    Int8,
    /// 16-bit unsigned integer
    Int16,
    /// 32-bit float
    Float32,
    /// 32-bit packed RGBA image; never decoded
    Rgba32,
}

impl EncodingType {
    /// Bytes per sample
    pub fn byte_size(&self) -> usize {
        match self {
            EncodingType::Int8 => 1,
            EncodingType::Int16 => 2,
            EncodingType::Float32 | EncodingType::Rgba32 => 4,
        }
    }
}

impl TryFrom<i32> for EncodingType {
    type Error = MdvError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(EncodingType::Int8),
            2 => Ok(EncodingType::Int16),
            5 => Ok(EncodingType::Float32),
            7 => Ok(EncodingType::Rgba32),
            _ => Err(MdvError::UnknownCode {
                what: "encoding type",
                value: code as i64,
            }),
        }
    }
}

/// Nonlinear transform applied after scale/bias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransformType {
    /// Values are stored linearly
    None,
    /// Values are stored logarithmically; never inverted
    Log,
}

impl TryFrom<i32> for TransformType {
    type Error = MdvError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(TransformType::None),
            1 => Ok(TransformType::Log),
            _ => Err(MdvError::UnknownCode {
                what: "transform type",
                value: code as i64,
            }),
        }
    }
}

/// Grid projection of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProjectionType {
    /// Regular latitude/longitude grid
    LatLon,
    /// Flat Cartesian grid (km)
    Flat,
    /// Polar radar grid: rows are azimuths, columns gates
    PolarRadar,
    /// RHI radar grid
    RhiRadar,
    /// Any other MDV projection, carried by code
    Other(i32),
}

impl ProjectionType {
    /// True for the grids whose rows are stored south-up
    pub fn is_cartesian(&self) -> bool {
        matches!(self, ProjectionType::LatLon | ProjectionType::Flat)
    }

    /// MDV projection code
    pub fn code(&self) -> i32 {
        match self {
            ProjectionType::LatLon => 0,
            ProjectionType::Flat => 8,
            ProjectionType::PolarRadar => 9,
            ProjectionType::RhiRadar => 13,
            ProjectionType::Other(code) => *code,
        }
    }
}

impl From<i32> for ProjectionType {
    fn from(code: i32) -> Self {
        match code {
            0 => ProjectionType::LatLon,
            8 => ProjectionType::Flat,
            9 => ProjectionType::PolarRadar,
            13 => ProjectionType::RhiRadar,
            other => ProjectionType::Other(other),
        }
    }
}

/// Compression scheme identified by a plane's magic cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompressionKind {
    /// Plain data with a compression header
    NotCompressed,
    /// zlib stream
    Zlib,
    /// zlib requested but stored plain
    ZlibNotCompressed,
    /// gzip stream
    Gzip,
    /// gzip requested but stored plain
    GzipNotCompressed,
    /// bzip2 stream
    Bzip,
    /// bzip2 requested but stored plain
    BzipNotCompressed,
}

impl CompressionKind {
    /// Identify the scheme from its magic cookie
    pub fn from_cookie(cookie: u32) -> Option<Self> {
        match cookie {
            0x2f2f_2f2f => Some(CompressionKind::NotCompressed),
            0xf3f3_f3f3 => Some(CompressionKind::Bzip),
            0xf4f4_f4f4 => Some(CompressionKind::BzipNotCompressed),
            0xf5f5_f5f5 => Some(CompressionKind::Zlib),
            0xf6f6_f6f6 => Some(CompressionKind::ZlibNotCompressed),
            0xf7f7_f7f7 => Some(CompressionKind::Gzip),
            0xf8f8_f8f8 => Some(CompressionKind::GzipNotCompressed),
            _ => None,
        }
    }

    /// Magic cookie written for this scheme
    pub fn cookie(&self) -> u32 {
        match self {
            CompressionKind::NotCompressed => 0x2f2f_2f2f,
            CompressionKind::Bzip => 0xf3f3_f3f3,
            CompressionKind::BzipNotCompressed => 0xf4f4_f4f4,
            CompressionKind::Zlib => 0xf5f5_f5f5,
            CompressionKind::ZlibNotCompressed => 0xf6f6_f6f6,
            CompressionKind::Gzip => 0xf7f7_f7f7,
            CompressionKind::GzipNotCompressed => 0xf8f8_f8f8,
        }
    }
}
