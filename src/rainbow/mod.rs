//! # Rainbow Volume Writer Module
//!
//! Encoding of decoded fields into Rainbow 5 `.vol` files: an XML document
//! describing the scan followed by "qt" compressed binary blobs.
//!
//! ## File Structure
//!
//! ```text
//! <volume>
//!   <scan>
//!     <pargroup/>            scan-wide sampling constants
//!     <slice refid="e"/>*    one per elevation, referencing blobs 2e and 2e+1
//!   </scan>
//!   <radarinfo/>             site location and antenna
//! </volume>
//! <!-- END XML -->
//! <BLOB blobid="k" size="S" compression="qt">...</BLOB>*
//! ```
//!
//! Blob `2e` holds the 360-entry ray angle table; blob `2e+1` holds the
//! 8-bit quantized data of slice `e`.

mod blob;
mod error;
mod products;
mod writer;


pub use blob::{
    angle_table, qt_compress, qt_decompress, quantize, quantize_slab, Blob, ANGLE_TABLE_LEN,
};
pub use error::RainbowError;
pub use products::{product_for, RainbowProduct, PRODUCTS};
pub use writer::{
    RadarSite, RainbowStats, RainbowWriter, ScanHeader, SliceInfo, WriterState, RAINBOW_VERSION,
};
