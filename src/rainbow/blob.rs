//! Rainbow binary blobs
//!
//! Every blob is stored "qt" compressed: a 4-byte big-endian uncompressed
//! length followed by a zlib stream.

use std::io::{Read, Write};

use byteorder::{BigEndian, ByteOrder};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use ndarray::ArrayView2;

use super::error::RainbowError;
use super::products::RainbowProduct;

/// Number of rays described by the angle table
pub const ANGLE_TABLE_LEN: usize = 360;

/// 16-bit start angle of each one-degree ray, big-endian
pub fn angle_table() -> Vec<u8> {
    let mut out = Vec::with_capacity(ANGLE_TABLE_LEN * 2);
    for i in 0..ANGLE_TABLE_LEN {
        let raw = (65536.0 * i as f64 / ANGLE_TABLE_LEN as f64).round() as u16;
        out.extend_from_slice(&raw.to_be_bytes());
    }
    out
}

/// Map a physical value to its 8-bit code.
///
/// `min` maps to 1; anything below `min` (and NaN) saturates to the code of
/// `min - step`, i.e. 0. The top saturates at 254.
pub fn quantize(value: f64, min: f64, max: f64) -> u8 {
    let step = (max - min) / 254.0;
    let clamped = if value >= min { value } else { min - step };
    let code = ((clamped + min.abs() + step) / step).floor();
    code.clamp(0.0, 254.0) as u8
}

/// Quantize one `(rays, bins)` level, row-major
pub fn quantize_slab(slab: ArrayView2<'_, f32>, product: &RainbowProduct) -> Vec<u8> {
    slab.iter()
        .map(|&v| quantize(v as f64, product.min, product.max))
        .collect()
}

/// Compress `data` in qt framing: uncompressed length prefix + zlib stream.
pub fn qt_compress(data: &[u8], level: u32) -> Result<Vec<u8>, RainbowError> {
    let len = u32::try_from(data.len())
        .map_err(|_| RainbowError::InvalidBlob(format!("{} bytes exceeds u32", data.len())))?;
    let mut framed = Vec::with_capacity(data.len() / 2 + 4);
    framed.extend_from_slice(&len.to_be_bytes());
    let mut encoder = ZlibEncoder::new(framed, Compression::new(level));
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Inverse of [`qt_compress`], verifying the length prefix
pub fn qt_decompress(blob: &[u8]) -> Result<Vec<u8>, RainbowError> {
    if blob.len() < 4 {
        return Err(RainbowError::InvalidBlob(format!(
            "{} bytes is shorter than the length prefix",
            blob.len()
        )));
    }
    let expected = BigEndian::read_u32(&blob[..4]) as usize;
    let mut out = Vec::with_capacity(expected.min(1 << 24));
    ZlibDecoder::new(&blob[4..]).read_to_end(&mut out)?;
    if out.len() != expected {
        return Err(RainbowError::InvalidBlob(format!(
            "prefix declares {} bytes, stream holds {}",
            expected,
            out.len()
        )));
    }
    Ok(out)
}

/// A framed blob awaiting output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// Blob id referenced from the XML
    pub id: usize,
    /// qt-compressed bytes, length prefix included
    pub payload: Vec<u8>,
}

impl Blob {
    /// Compress `data` into a blob
    pub fn compress(id: usize, data: &[u8], level: u32) -> Result<Self, RainbowError> {
        Ok(Self {
            id,
            payload: qt_compress(data, level)?,
        })
    }

    /// Write the `<BLOB>` element; `size` is the framed payload length.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<usize, RainbowError> {
        let open = format!(
            "<BLOB blobid=\"{}\" size=\"{}\" compression=\"qt\">\n",
            self.id,
            self.payload.len()
        );
        let close = "\n</BLOB>\n";
        out.write_all(open.as_bytes())?;
        out.write_all(&self.payload)?;
        out.write_all(close.as_bytes())?;
        Ok(open.len() + self.payload.len() + close.len())
    }
}
