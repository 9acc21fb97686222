//! # mdv2rainbow - MDV to Rainbow5 Radar Volume Translation
//!
//! `mdv2rainbow` decodes MDV (Meteorological Data Volume) files, the
//! big-endian gridded container of the TITAN/LROSE radar tool chain, and
//! re-encodes selected fields as Rainbow5 `.vol` files.
//!
//! ## Pipeline
//!
//! ```text
//! record ──▶ headers / chunks ──▶ payload ──▶ VolumeModel ──▶ RainbowWriter
//! (layouts)  (master, field,      (zlib/gzip,   (one grid       (XML + qt
//!             vlevel, chunk)       scale/bias)   per field)      blobs)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mdv2rainbow::convert::{ConversionConfig, VolumeConverter};
//!
//! let config = ConversionConfig::default().with_fields(["DBZ", "VEL"]);
//! let converter = VolumeConverter::with_config(config);
//! let stats = converter.convert("input.mdv", "out")?;
//! println!("{}", stats);
//! # Ok::<(), mdv2rainbow::convert::ConversionError>(())
//! ```
//!
//! Decoding on its own:
//!
//! ```rust,no_run
//! use mdv2rainbow::mdv::MdvReader;
//!
//! let mut reader = MdvReader::open("input.mdv")?;
//! let volume = reader.read_volume()?;
//! for name in volume.field_names() {
//!     let grid = volume.grid(name).unwrap();
//!     println!("{}: {:?}", name, grid.dim());
//! }
//! # Ok::<(), mdv2rainbow::mdv::MdvError>(())
//! ```

#![deny(missing_docs)]

pub mod convert;
pub mod mdv;
pub mod rainbow;
pub mod volume;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::convert::{ConversionConfig, ConversionError, ConversionStats, VolumeConverter};
    pub use crate::mdv::{MdvError, MdvReader, VolumeHeaders};
    pub use crate::rainbow::{product_for, RainbowError, RainbowProduct, RainbowWriter};
    pub use crate::volume::{FieldGrid, VolumeModel};
}
