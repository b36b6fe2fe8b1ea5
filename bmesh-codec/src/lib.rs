//! Canonicalizes surface meshes into triangles with per-corner attribute
//! indices and encodes them as versioned `binarymesh` documents.
//!
//! Layout (little-endian):
//!
//! ```text
//! "BINARYMESH" | version:u16
//! [v3+] rawLength:u64 | compressedLength:u64 | lz4 block of the payload
//! payload:
//!   part name          nameLength:u16 | bytes
//!   P, N, uv           count:u32 | count * width * (8 bytes, 4 in v4)
//!   materials          slotCount:u16 | (nameLength:u16 | bytes)*
//!   faces              faceCount:u32 | (vertexCount:u16 | (p:u32 n:u32 uv:u32)* | slot:u16)*
//! ```

pub mod encoder;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod processor;

pub use error::{CodecError, CodecResult};
pub use format::{
    DEFAULT_PART_NAME, ExportConfig, FALLBACK_MATERIAL, FILE_EXTENSION, FloatWidth, FormatVersion, MAGIC,
    has_binarymesh_extension,
};
pub use pipeline::{ExportSummary, PreparedMesh, export_binarymesh, save_binarymesh};
pub use processor::{MATERIAL_PATH, PolygonTessellator, TessellatedMesh, Tessellator, tessellate_polygons};
