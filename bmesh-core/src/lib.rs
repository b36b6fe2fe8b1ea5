pub mod attribute;
pub mod error;
pub mod mesh;

pub use attribute::{AttributeChannel, Rate, StringAttribute};
pub use error::{CoreError, CoreResult};
pub use mesh::{NORMAL, POSITION, Primitive, PrimitiveKind, SurfaceMesh, UV};
