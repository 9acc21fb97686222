//! # MDV Reader Module
//!
//! Decoding of MDV (Meteorological Data Volume) files, the big-endian gridded
//! format used by the TITAN/LROSE radar tool chain.
//!
//! ## File Structure
//!
//! ```text
//! MDV file
//! ├── master header            (1024 bytes, offset 0)
//! ├── field headers [n_fields] (416 bytes each, at field_hdr_offset)
//! ├── vlevel headers [n_fields](1024 bytes each, at vlevel_hdr_offset)
//! ├── chunk headers [n_chunks] (512 bytes each, at chunk_hdr_offset)
//! ├── chunk bodies             (radar params, elevation list, ...)
//! └── field data [n_fields]    (at field_data_offset)
//!     ├── plane offsets [nz]
//!     ├── plane sizes [nz]
//!     └── plane* (compression info + zlib/gzip stream)
//! ```
//!
//! Record lengths and array counts are always taken from the headers, never
//! from the file size.

mod chunks;
mod constants;
mod error;
mod headers;
mod payload;
mod reader;
pub mod record;


pub use chunks::{decode_chunks, ElevationList, RadarChunks, RadarParams, RADAR_PARAMS_LAYOUT};
pub use constants::*;
pub use error::MdvError;
pub use headers::{
    read_headers, ChunkHeader, FieldHeader, MasterHeader, VlevelHeader, VolumeHeaders,
    CHUNK_LAYOUT, FIELD_LAYOUT, MASTER_LAYOUT, VLEVEL_LAYOUT,
};
pub use payload::{
    apply_scale_bias, apply_transform, decode_field, decompress_plane, orient_rows,
    unpack_samples, CompressionInfo, LevelTable, COMPRESSION_INFO_LAYOUT, MAX_GRID_POINTS,
};
pub use reader::MdvReader;
