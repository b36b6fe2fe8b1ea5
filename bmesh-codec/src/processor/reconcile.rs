use bmesh_core::AttributeChannel;
use bytemuck::{Pod, Zeroable};

use crate::processor::tessellate::TessellatedMesh;

/// Indices of one face corner into the position, normal and uv blocks.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct CornerIndices {
    pub point: u32,
    pub normal: u32,
    pub uv: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciled {
    pub normal_on_vertex: bool,
    pub uv_on_vertex: bool,
    /// One entry per corner, face-major.
    pub corners: Vec<CornerIndices>,
}

/// Computes per-corner indices for the three attribute blocks.
///
/// A channel is treated as vertex rate whenever its entry count differs from
/// the position count; equal counts always mean point rate, even if the
/// channel was authored per vertex.
pub fn reconcile(
    mesh: &TessellatedMesh,
    positions: &AttributeChannel,
    normals: &AttributeChannel,
    uvs: &AttributeChannel,
) -> Reconciled {
    let normal_on_vertex = positions.len() != normals.len();
    let uv_on_vertex = positions.len() != uvs.len();

    let mut corners = Vec::with_capacity(mesh.corner_count());
    let mut corner = 0u32;
    for face in 0..mesh.face_count() {
        for vertex in 0..mesh.vertex_count_of(face) {
            let point = mesh.point_index_of(face, vertex);
            corners.push(CornerIndices {
                point,
                normal: if normal_on_vertex { corner } else { point },
                uv: if uv_on_vertex { corner } else { point },
            });
            corner += 1;
        }
    }

    Reconciled {
        normal_on_vertex,
        uv_on_vertex,
        corners,
    }
}
