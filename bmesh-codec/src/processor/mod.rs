pub mod accessor;
pub mod materials;
pub mod reconcile;
pub mod tessellate;
pub mod triangulate;

pub use materials::{MATERIAL_PATH, MaterialTable};
pub use reconcile::{CornerIndices, Reconciled, reconcile};
pub use tessellate::{PolygonTessellator, TessellatedMesh, Tessellator, compute_point_normals, tessellate_polygons};
