use bmesh_core::{AttributeChannel, NORMAL, POSITION, Rate, UV};
use log::{debug, warn};

use crate::error::{CodecError, CodecResult};
use crate::processor::tessellate::TessellatedMesh;

const FALLBACK_NORMAL: [f64; 3] = [0.0, 1.0, 0.0];
const FALLBACK_UV: [f64; 2] = [0.0, 0.0];

/// Finds a channel by name, vertex rate first.
pub fn find_channel(mesh: &TessellatedMesh, name: &str) -> Option<AttributeChannel> {
    mesh.find_attribute(name, None).cloned()
}

/// Point-rate positions; corner point indices address nothing else.
pub fn position_channel(mesh: &TessellatedMesh) -> CodecResult<AttributeChannel> {
    mesh.find_attribute(POSITION, Some(Rate::Point))
        .cloned()
        .ok_or(CodecError::MissingPositionChannel)
}

/// Normals as found, or a constant up vector per point if the tessellator
/// could not provide any.
pub fn normal_channel(mesh: &TessellatedMesh) -> CodecResult<AttributeChannel> {
    match find_channel(mesh, NORMAL) {
        Some(n) => Ok(n.repack(3)?),
        None => {
            warn!("No normals on tessellated mesh, writing {:?} for every point", FALLBACK_NORMAL);
            Ok(AttributeChannel::constant(NORMAL, Rate::Point, mesh.point_count(), &FALLBACK_NORMAL)?)
        }
    }
}

/// Texture coordinates packed to two components, or a zero channel per point.
pub fn uv_channel(mesh: &TessellatedMesh) -> CodecResult<AttributeChannel> {
    match find_channel(mesh, UV) {
        Some(uv) => {
            if uv.tuple_width() != 2 {
                debug!("Repacking uv from {} to 2 components", uv.tuple_width());
            }
            Ok(uv.repack(2)?)
        }
        None => Ok(AttributeChannel::constant(UV, Rate::Point, mesh.point_count(), &FALLBACK_UV)?),
    }
}
