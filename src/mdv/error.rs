//! MDV decoding errors

use super::constants::{CompressionKind, EncodingType, TransformType};

/// Errors that can occur while decoding an MDV volume
#[derive(Debug, thiserror::Error)]
pub enum MdvError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes were available than a record or payload declares
    #[error("Truncated input reading {record}: expected {expected} bytes, got {available}")]
    Truncated {
        /// Record or payload being read
        record: String,
        /// Bytes the layout requires
        expected: usize,
        /// Bytes actually available
        available: usize,
    },

    /// A header code is outside its closed set of values
    #[error("Unknown {what} code: {value}")]
    UnknownCode {
        /// Which enumeration was being decoded
        what: &'static str,
        /// Raw value found in the file
        value: i64,
    },

    /// Header is structurally inconsistent
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Sample encoding is recognised but cannot be decoded
    #[error("Unsupported encoding {encoding:?} in field {field}")]
    UnsupportedEncoding {
        /// Field short name
        field: String,
        /// Encoding declared by the field header
        encoding: EncodingType,
    },

    /// Compression scheme is recognised but cannot be decoded
    #[error("Unsupported compression {kind:?} in field {field}, level {level}")]
    UnsupportedCompression {
        /// Field short name
        field: String,
        /// Vertical level index (0-based)
        level: usize,
        /// Compression identified by the magic cookie
        kind: CompressionKind,
    },

    /// Magic cookie does not identify any known compression scheme
    #[error("Unknown compression cookie {cookie:#010x} in field {field}, level {level}")]
    UnknownCompressionCookie {
        /// Field short name
        field: String,
        /// Vertical level index (0-based)
        level: usize,
        /// Raw cookie value
        cookie: u32,
    },

    /// Transform is declared but cannot be inverted
    #[error("Unsupported transform {transform:?} in field {field}")]
    UnsupportedTransform {
        /// Field short name
        field: String,
        /// Transform declared by the field header
        transform: TransformType,
    },

    /// Decompressor rejected a plane
    #[error("Decompression error in field {field}, level {level}: {source}")]
    Decompression {
        /// Field short name
        field: String,
        /// Vertical level index (0-based)
        level: usize,
        /// Underlying decoder error
        #[source]
        source: std::io::Error,
    },

    /// Decoded plane does not hold `nx * ny` samples
    #[error("Plane size mismatch in field {field}, level {level}: expected {expected} samples, got {actual}")]
    PlaneSize {
        /// Field short name
        field: String,
        /// Vertical level index (0-based)
        level: usize,
        /// `nx * ny`
        expected: usize,
        /// Samples actually decoded
        actual: usize,
    },
}
