//! Field payload decoding
//!
//! Each field's data block starts with a level table (`nz` plane offsets, then
//! `nz` plane sizes, big-endian u32) followed by one compressed plane per level.
//! Decoding a plane runs the pipeline:
//!
//! 1. Read the 24-byte compression info record
//! 2. Decompress (zlib or gzip)
//! 3. Interpret bytes as u8 / u16 / f32 samples (big-endian)
//! 4. Apply `value = raw * scale + bias`
//! 5. Apply the field transform (only `None` is invertible)
//! 6. Flip row order for Cartesian grids

use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ByteOrder};
use flate2::read::{GzDecoder, ZlibDecoder};
use log::debug;
use ndarray::{s, Array2, Array3};

use super::constants::{
    CompressionKind, EncodingType, ProjectionType, TransformType, COMPRESSION_INFO_LEN,
};
use super::error::MdvError;
use super::headers::FieldHeader;
use super::record::{read_exact_bytes, BinaryRecord, FieldSpec, RecordLayout, RecordValues};
use crate::volume::FieldGrid;

/// Largest grid (in points) a single field may declare
pub const MAX_GRID_POINTS: usize = 1 << 28;

const COMPRESSION_INFO_FIELDS: &[FieldSpec] = &[
    FieldSpec::ui32("magic_cookie"),
    FieldSpec::ui32("nbytes_uncompressed"),
    FieldSpec::ui32("nbytes_compressed"),
    FieldSpec::ui32("nbytes_coded"),
    FieldSpec::ui32("spare0"),
    FieldSpec::ui32("spare1"),
];

/// Compression info record layout
pub const COMPRESSION_INFO_LAYOUT: RecordLayout =
    RecordLayout::new("compression info", COMPRESSION_INFO_FIELDS);

const _: () = assert!(COMPRESSION_INFO_LAYOUT.byte_len() == COMPRESSION_INFO_LEN);

/// Header preceding each compressed plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionInfo {
    /// Identifies the compression scheme
    pub magic_cookie: u32,
    /// Plane size after decompression
    pub nbytes_uncompressed: u32,
    /// Coded size plus this header
    pub nbytes_compressed: u32,
    /// Size of the coded bytes following this header
    pub nbytes_coded: u32,
}

impl BinaryRecord for CompressionInfo {
    const LAYOUT: RecordLayout = COMPRESSION_INFO_LAYOUT;

    fn from_values(v: &RecordValues) -> Result<Self, MdvError> {
        Ok(Self {
            magic_cookie: v.u32("magic_cookie")?,
            nbytes_uncompressed: v.u32("nbytes_uncompressed")?,
            nbytes_compressed: v.u32("nbytes_compressed")?,
            nbytes_coded: v.u32("nbytes_coded")?,
        })
    }
}

/// Plane offsets and sizes of one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTable {
    /// Offset of each plane, relative to the end of the table
    pub offsets: Vec<u32>,
    /// Stored size of each plane
    pub sizes: Vec<u32>,
}

impl LevelTable {
    /// Bytes the table occupies for `nz` levels
    pub fn byte_len(nz: usize) -> usize {
        2 * nz * 4
    }

    /// Read the table for `nz` levels
    pub fn read<R: Read>(reader: &mut R, nz: usize) -> Result<Self, MdvError> {
        let bytes = read_exact_bytes(reader, Self::byte_len(nz), "level table")?;
        let (offsets, sizes) = bytes.split_at(4 * nz);
        Ok(Self {
            offsets: offsets.chunks_exact(4).map(BigEndian::read_u32).collect(),
            sizes: sizes.chunks_exact(4).map(BigEndian::read_u32).collect(),
        })
    }
}

/// Read the coded bytes following `info` and decompress them.
pub fn decompress_plane<R: Read>(
    reader: &mut R,
    info: &CompressionInfo,
    field: &str,
    level: usize,
) -> Result<Vec<u8>, MdvError> {
    let kind = CompressionKind::from_cookie(info.magic_cookie).ok_or_else(|| {
        MdvError::UnknownCompressionCookie {
            field: field.to_string(),
            level,
            cookie: info.magic_cookie,
        }
    })?;

    let coded = read_exact_bytes(reader, info.nbytes_coded as usize, "compressed plane")?;
    let expected = info.nbytes_uncompressed as usize;
    let mut plane = Vec::with_capacity(expected.min(1 << 24));

    // One byte past the declared length is enough to detect an oversized stream.
    let limit = expected as u64 + 1;
    let result = match kind {
        CompressionKind::Zlib => ZlibDecoder::new(&coded[..])
            .take(limit)
            .read_to_end(&mut plane),
        CompressionKind::Gzip => GzDecoder::new(&coded[..])
            .take(limit)
            .read_to_end(&mut plane),
        CompressionKind::NotCompressed
        | CompressionKind::ZlibNotCompressed
        | CompressionKind::GzipNotCompressed
        | CompressionKind::Bzip
        | CompressionKind::BzipNotCompressed => {
            return Err(MdvError::UnsupportedCompression {
                field: field.to_string(),
                level,
                kind,
            });
        }
    };
    result.map_err(|source| MdvError::Decompression {
        field: field.to_string(),
        level,
        source,
    })?;

    if plane.len() != expected {
        let detail = if plane.len() > expected {
            format!("stream exceeds the {} bytes the header declares", expected)
        } else {
            format!(
                "decompressed {} bytes, header declares {}",
                plane.len(),
                expected
            )
        };
        return Err(MdvError::Decompression {
            field: field.to_string(),
            level,
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, detail),
        });
    }

    Ok(plane)
}

/// Interpret decompressed bytes as samples of the given encoding.
pub fn unpack_samples(
    bytes: &[u8],
    encoding: EncodingType,
    field: &str,
) -> Result<Vec<f32>, MdvError> {
    let samples = match encoding {
        EncodingType::Int8 => bytes.iter().map(|&b| b as f32).collect(),
        EncodingType::Int16 => bytes
            .chunks_exact(2)
            .map(|c| BigEndian::read_u16(c) as f32)
            .collect(),
        EncodingType::Float32 => bytes.chunks_exact(4).map(BigEndian::read_f32).collect(),
        EncodingType::Rgba32 => {
            return Err(MdvError::UnsupportedEncoding {
                field: field.to_string(),
                encoding,
            });
        }
    };
    Ok(samples)
}

/// Convert raw samples to physical values in place
pub fn apply_scale_bias(values: &mut [f32], scale: f32, bias: f32) {
    let (scale, bias) = (scale as f64, bias as f64);
    for v in values.iter_mut() {
        *v = (*v as f64 * scale + bias) as f32;
    }
}

/// Apply the field transform; only the identity is supported.
pub fn apply_transform(
    values: Vec<f32>,
    transform: TransformType,
    field: &str,
) -> Result<Vec<f32>, MdvError> {
    match transform {
        TransformType::None => Ok(values),
        TransformType::Log => Err(MdvError::UnsupportedTransform {
            field: field.to_string(),
            transform,
        }),
    }
}

/// Put a `(ny, nx)` plane into north-up row order.
pub fn orient_rows(plane: Array2<f32>, proj: ProjectionType) -> Array2<f32> {
    if proj.is_cartesian() {
        plane.slice(s![..;-1, ..]).to_owned()
    } else {
        plane
    }
}

/// Decode every level of one field into a `(nz, ny, nx)` grid.
pub fn decode_field<R: Read + Seek>(
    reader: &mut R,
    header: &FieldHeader,
) -> Result<FieldGrid, MdvError> {
    let name = header.field_name.as_str();

    match (header.encoding_type, header.transform_type) {
        (EncodingType::Rgba32, _) => {
            return Err(MdvError::UnsupportedEncoding {
                field: name.to_string(),
                encoding: header.encoding_type,
            })
        }
        (_, TransformType::Log) => {
            return Err(MdvError::UnsupportedTransform {
                field: name.to_string(),
                transform: header.transform_type,
            })
        }
        _ => {}
    }
    if header.encoding_type.byte_size() != header.data_element_nbytes {
        return Err(MdvError::InvalidHeader(format!(
            "field {}: {:?} samples are {} bytes, header declares {}",
            name,
            header.encoding_type,
            header.encoding_type.byte_size(),
            header.data_element_nbytes
        )));
    }

    let (nx, ny, nz) = (header.nx, header.ny, header.nz);
    let points = nx.checked_mul(ny).and_then(|n| n.checked_mul(nz));
    if points.map_or(true, |n| n > MAX_GRID_POINTS) {
        return Err(MdvError::InvalidHeader(format!(
            "field {}: grid {}x{}x{} is too large",
            name, nx, ny, nz
        )));
    }

    reader.seek(SeekFrom::Start(header.field_data_offset))?;
    let table = LevelTable::read(reader, nz)?;
    let planes_start = header.field_data_offset + LevelTable::byte_len(nz) as u64;

    let mut grid = Array3::<f32>::zeros((nz, ny, nx));

    for level in 0..nz {
        reader.seek(SeekFrom::Start(planes_start + table.offsets[level] as u64))?;
        let info = CompressionInfo::read_from(reader)?;
        let stored = COMPRESSION_INFO_LEN as u64 + info.nbytes_coded as u64;
        if stored > table.sizes[level] as u64 {
            return Err(MdvError::InvalidHeader(format!(
                "field {} level {}: plane needs {} bytes, level table allows {}",
                name, level, stored, table.sizes[level]
            )));
        }
        debug!(
            "Field {} level {}: cookie {:#010x}, {} coded -> {} bytes",
            name, level, info.magic_cookie, info.nbytes_coded, info.nbytes_uncompressed
        );

        let bytes = decompress_plane(reader, &info, name, level)?;
        let mut values = unpack_samples(&bytes, header.encoding_type, name)?;
        apply_scale_bias(&mut values, header.scale, header.bias);
        let values = apply_transform(values, header.transform_type, name)?;

        if values.len() != nx * ny {
            return Err(MdvError::PlaneSize {
                field: name.to_string(),
                level,
                expected: nx * ny,
                actual: values.len(),
            });
        }
        let plane = Array2::from_shape_vec((ny, nx), values).map_err(|e| {
            MdvError::InvalidHeader(format!("field {} level {}: {}", name, level, e))
        })?;
        let plane = orient_rows(plane, header.proj_type);
        grid.slice_mut(s![level, .., ..]).assign(&plane);
    }

    Ok(grid)
}
