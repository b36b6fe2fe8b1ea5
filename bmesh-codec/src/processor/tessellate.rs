use bmesh_core::{
    AttributeChannel, CoreError, NORMAL, POSITION, Primitive, PrimitiveKind, Rate, StringAttribute, SurfaceMesh,
};
use glam::DVec3;
use log::{debug, warn};

use crate::error::{CodecError, CodecResult};
use crate::processor::materials::MATERIAL_PATH;
use crate::processor::triangulate::triangulate_polygon;

/// Normal assigned to points that no face contributes to.
const UP: [f64; 3] = [0.0, 1.0, 0.0];

/// Turns a host surface mesh into simple faces with uniformly indexed corners.
pub trait Tessellator: Send + Sync {
    fn tessellate(&self, mesh: &SurfaceMesh, compute_normals: bool) -> CodecResult<TessellatedMesh>;

    /// Converts a patch primitive into polygons over the mesh's points, or
    /// `None` if this tessellator cannot refine it and the patch is dropped.
    fn refine_patch(&self, _mesh: &SurfaceMesh, _primitive: &Primitive) -> Option<Vec<Vec<u32>>> {
        None
    }
}

/// Triangulated geometry addressed by a flat, face-major corner index.
///
/// Point-rate attributes hold one tuple per point; vertex-rate attributes hold
/// one tuple per corner, in corner order.
#[derive(Clone, Debug, Default)]
pub struct TessellatedMesh {
    point_count: usize,
    face_offsets: Vec<usize>,
    point_indices: Vec<u32>,
    attributes: Vec<AttributeChannel>,
    strings: Vec<StringAttribute>,
}

impl TessellatedMesh {
    pub fn from_faces<F: AsRef<[u32]>>(point_count: usize, faces: &[F]) -> Self {
        let mut face_offsets = Vec::with_capacity(faces.len() + 1);
        let mut point_indices = Vec::new();
        face_offsets.push(0);
        for face in faces {
            point_indices.extend_from_slice(face.as_ref());
            face_offsets.push(point_indices.len());
        }
        Self {
            point_count,
            face_offsets,
            point_indices,
            attributes: Vec::new(),
            strings: Vec::new(),
        }
    }

    pub fn set_attribute(&mut self, channel: AttributeChannel) {
        self.attributes
            .retain(|a| !(a.name() == channel.name() && a.rate() == channel.rate()));
        self.attributes.push(channel);
    }

    pub fn set_primitive_strings(&mut self, strings: StringAttribute) {
        self.strings.retain(|s| s.name() != strings.name());
        self.strings.push(strings);
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn face_count(&self) -> usize {
        self.face_offsets.len().saturating_sub(1)
    }

    pub fn corner_count(&self) -> usize {
        self.point_indices.len()
    }

    pub fn vertex_count_of(&self, face: usize) -> usize {
        self.face_offsets[face + 1] - self.face_offsets[face]
    }

    /// Corner index of the face's first vertex.
    pub fn first_corner_of(&self, face: usize) -> usize {
        self.face_offsets[face]
    }

    pub fn point_index_of(&self, face: usize, vertex: usize) -> u32 {
        self.point_indices[self.face_offsets[face] + vertex]
    }

    pub fn face_points(&self, face: usize) -> &[u32] {
        &self.point_indices[self.face_offsets[face]..self.face_offsets[face + 1]]
    }

    /// Vertex-rate attributes shadow point-rate ones unless a rate is pinned.
    pub fn find_attribute(&self, name: &str, rate: Option<Rate>) -> Option<&AttributeChannel> {
        let find = |rate: Rate| {
            self.attributes
                .iter()
                .find(|a| a.name() == name && a.rate() == rate)
        };
        match rate {
            Some(rate) => find(rate),
            None => find(Rate::Vertex).or_else(|| find(Rate::Point)),
        }
    }

    pub fn primitive_strings(&self, name: &str) -> Option<&StringAttribute> {
        self.strings.iter().find(|s| s.name() == name)
    }

    /// Checks corner point references and attribute entry counts.
    pub fn validate(&self) -> CodecResult<()> {
        if let Some(face) = (0..self.face_count()).find(|&f| {
            self.face_points(f)
                .iter()
                .any(|&p| p as usize >= self.point_count)
        }) {
            let point = self
                .face_points(face)
                .iter()
                .copied()
                .find(|&p| p as usize >= self.point_count)
                .unwrap_or_default();
            return Err(CoreError::InvalidPointReference {
                primitive: face,
                point,
                point_count: self.point_count,
            }
            .into());
        }
        for attr in &self.attributes {
            let expected = match attr.rate() {
                Rate::Point => self.point_count,
                Rate::Vertex => self.corner_count(),
            };
            if attr.len() != expected {
                return Err(CoreError::AttributeSizeMismatch {
                    name: attr.name().to_owned(),
                    rate: attr.rate(),
                    expected,
                    got: attr.len(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Material string index of a face, negative when unassigned.
    pub fn material_index_of(&self, face: usize) -> i32 {
        self.primitive_strings(MATERIAL_PATH)
            .map_or(-1, |m| m.string_index(face))
    }
}

/// Built-in tessellator for polygonal input.
///
/// Polygons and polygon-grid faces are ear-clipped into triangles. It does
/// not refine patches, so patches are dropped along with curves and volumes.
#[derive(Copy, Clone, Debug, Default)]
pub struct PolygonTessellator;

impl Tessellator for PolygonTessellator {
    fn tessellate(&self, mesh: &SurfaceMesh, compute_normals: bool) -> CodecResult<TessellatedMesh> {
        tessellate_polygons(self, mesh, compute_normals)
    }
}

/// Polygon tessellation shared by every [`Tessellator`]: polygons are
/// ear-clipped, patches go through `tessellator.refine_patch` and whatever
/// polygons it returns are ear-clipped in turn.
///
/// Corners of refined polygons take their vertex attributes from the patch
/// corner on the same point, or from the patch's first corner when no patch
/// corner shares it.
pub fn tessellate_polygons<T: Tessellator + ?Sized>(
    tessellator: &T,
    mesh: &SurfaceMesh,
    compute_normals: bool,
) -> CodecResult<TessellatedMesh> {
    if mesh.is_empty() {
        return Err(CodecError::EmptyInput);
    }
    let positions = mesh
        .find_attribute(POSITION, Some(Rate::Point))
        .ok_or(CodecError::MissingPositionChannel)?;
    if positions.tuple_width() != 3 {
        return Err(CoreError::InvalidTupleWidth {
            name: POSITION.to_owned(),
            width: positions.tuple_width(),
        }
        .into());
    }
    mesh.validate()?;

    let points: Vec<DVec3> = (0..positions.len())
        .map(|i| DVec3::from_slice(positions.tuple(i)))
        .collect();

    let mut faces: Vec<[u32; 3]> = Vec::new();
    let mut face_sources = Vec::new();
    let mut corner_sources = Vec::new();
    let mut dropped = 0usize;
    let mut first_vertex = 0usize;

    for (prim_index, prim) in mesh.primitives().iter().enumerate() {
        let offset = first_vertex;
        first_vertex += prim.vertices.len();

        let loops: Vec<(Vec<u32>, Vec<usize>)> = match prim.kind {
            PrimitiveKind::Polygon | PrimitiveKind::Mesh => {
                let corners = (offset..offset + prim.vertices.len()).collect();
                vec![(prim.vertices.clone(), corners)]
            }
            PrimitiveKind::Patch => match tessellator.refine_patch(mesh, prim) {
                Some(polygons) => {
                    let mut loops = Vec::with_capacity(polygons.len());
                    for polygon in polygons {
                        if let Some(&point) = polygon.iter().find(|&&p| p as usize >= points.len()) {
                            return Err(CoreError::InvalidPointReference {
                                primitive: prim_index,
                                point,
                                point_count: points.len(),
                            }
                            .into());
                        }
                        let corners = polygon
                            .iter()
                            .map(|p| offset + prim.vertices.iter().position(|v| v == p).unwrap_or(0))
                            .collect();
                        loops.push((polygon, corners));
                    }
                    loops
                }
                None => {
                    dropped += 1;
                    continue;
                }
            },
            PrimitiveKind::Curve | PrimitiveKind::Volume => {
                dropped += 1;
                continue;
            }
        };

        for (vertices, corners) in loops {
            let loop_points: Vec<DVec3> = vertices.iter().map(|&p| points[p as usize]).collect();
            for tri in triangulate_polygon(&loop_points) {
                faces.push(tri.map(|v| vertices[v]));
                corner_sources.extend(tri.map(|v| corners[v]));
                face_sources.push(prim_index);
            }
        }
    }

    if dropped > 0 {
        warn!("Dropped {} unsupported primitives", dropped);
    }
    if faces.is_empty() {
        return Err(CodecError::UnsupportedGeometry);
    }

    let mut tessellated = TessellatedMesh::from_faces(mesh.point_count(), &faces);
    for attr in mesh.attributes() {
        match attr.rate() {
            Rate::Point => tessellated.set_attribute(attr.clone()),
            Rate::Vertex => tessellated.set_attribute(attr.gather(Rate::Vertex, &corner_sources)),
        }
    }
    for strings in mesh.string_attributes() {
        tessellated.set_primitive_strings(strings.remapped(&face_sources));
    }

    debug!(
        "Tessellated {} primitives into {} faces ({} corners)",
        mesh.primitives().len(),
        tessellated.face_count(),
        tessellated.corner_count()
    );

    if compute_normals && tessellated.find_attribute(NORMAL, None).is_none() {
        match compute_point_normals(&tessellated) {
            Some(normals) => tessellated.set_attribute(normals),
            None => warn!("Could not compute normals, exporting without them"),
        }
    }

    Ok(tessellated)
}

/// Area-weighted smooth normals at point rate.
///
/// Returns `None` when the positions are missing or not finite.
pub fn compute_point_normals(mesh: &TessellatedMesh) -> Option<AttributeChannel> {
    let positions = mesh.find_attribute(POSITION, Some(Rate::Point))?;
    if positions.tuple_width() != 3 || positions.values().iter().any(|v| !v.is_finite()) {
        return None;
    }

    let point = |i: u32| DVec3::from_slice(positions.tuple(i as usize));
    let mut accum = vec![DVec3::ZERO; mesh.point_count()];

    for face in 0..mesh.face_count() {
        let verts = mesh.face_points(face);
        if verts.len() < 3 {
            continue;
        }
        // Fan cross products sum to twice the area-weighted face normal.
        let origin = point(verts[0]);
        let mut normal = DVec3::ZERO;
        for pair in verts[1..].windows(2) {
            normal += (point(pair[0]) - origin).cross(point(pair[1]) - origin);
        }
        for &v in verts {
            if let Some(n) = accum.get_mut(v as usize) {
                *n += normal;
            }
        }
    }

    let mut values = Vec::with_capacity(accum.len() * 3);
    for n in accum {
        let n = n.try_normalize().map_or(UP, |n| n.to_array());
        values.extend_from_slice(&n);
    }
    AttributeChannel::new(NORMAL, Rate::Point, 3, values).ok()
}
