use crate::attribute::{AttributeChannel, Rate, StringAttribute};
use crate::error::{CoreError, CoreResult};

/// Name of the position attribute.
pub const POSITION: &str = "P";
/// Name of the normal attribute.
pub const NORMAL: &str = "N";
/// Name of the texture coordinate attribute.
pub const UV: &str = "uv";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// A single polygonal face.
    Polygon,
    /// A face taken from a polygon grid; exported like a polygon.
    Mesh,
    /// A parametric surface patch that needs refinement before export.
    Patch,
    Curve,
    Volume,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    /// Point references, in winding order.
    pub vertices: Vec<u32>,
}

impl Primitive {
    pub fn polygon(vertices: impl Into<Vec<u32>>) -> Self {
        Self {
            kind: PrimitiveKind::Polygon,
            vertices: vertices.into(),
        }
    }
}

/// Host-side surface geometry: points, primitives and their attributes.
///
/// Positions are the point-rate `"P"` attribute. Vertex-rate attributes are
/// laid out primitive-major, one tuple per primitive vertex.
#[derive(Clone, Debug, Default)]
pub struct SurfaceMesh {
    primitives: Vec<Primitive>,
    attributes: Vec<AttributeChannel>,
    strings: Vec<StringAttribute>,
}

impl SurfaceMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: &[[f64; 3]]) -> Self {
        let mut mesh = Self::new();
        // Tuples of width 3 always form a valid channel.
        if let Ok(p) = AttributeChannel::from_tuples(POSITION, Rate::Point, points) {
            mesh.attributes.push(p);
        }
        mesh
    }

    pub fn add_polygon(&mut self, vertices: &[u32]) -> usize {
        self.add_primitive(Primitive::polygon(vertices))
    }

    pub fn add_primitive(&mut self, primitive: Primitive) -> usize {
        self.primitives.push(primitive);
        self.primitives.len() - 1
    }

    /// Adds an attribute, replacing any attribute with the same name and rate.
    pub fn set_attribute(&mut self, channel: AttributeChannel) {
        self.attributes
            .retain(|a| !(a.name() == channel.name() && a.rate() == channel.rate()));
        self.attributes.push(channel);
    }

    pub fn remove_attribute(&mut self, name: &str, rate: Rate) -> Option<AttributeChannel> {
        let index = self
            .attributes
            .iter()
            .position(|a| a.name() == name && a.rate() == rate)?;
        Some(self.attributes.remove(index))
    }

    pub fn set_primitive_strings(&mut self, strings: StringAttribute) {
        self.strings.retain(|s| s.name() != strings.name());
        self.strings.push(strings);
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn attributes(&self) -> &[AttributeChannel] {
        &self.attributes
    }

    pub fn point_count(&self) -> usize {
        self.find_attribute(POSITION, Some(Rate::Point))
            .map_or(0, AttributeChannel::len)
    }

    /// Total number of primitive vertices.
    pub fn vertex_count(&self) -> usize {
        self.primitives.iter().map(|p| p.vertices.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Looks up an attribute by name. Without a pinned rate, vertex attributes
    /// shadow point attributes of the same name.
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

    pub fn string_attributes(&self) -> &[StringAttribute] {
        &self.strings
    }

    /// Checks point references and attribute entry counts.
    pub fn validate(&self) -> CoreResult<()> {
        let point_count = self.point_count();
        for (index, prim) in self.primitives.iter().enumerate() {
            if let Some(&point) = prim.vertices.iter().find(|&&p| p as usize >= point_count) {
                return Err(CoreError::InvalidPointReference {
                    primitive: index,
                    point,
                    point_count,
                });
            }
        }

        let vertex_count = self.vertex_count();
        for attr in &self.attributes {
            let expected = match attr.rate() {
                Rate::Point => point_count,
                Rate::Vertex => vertex_count,
            };
            if attr.len() != expected {
                return Err(CoreError::AttributeSizeMismatch {
                    name: attr.name().to_owned(),
                    rate: attr.rate(),
                    expected,
                    got: attr.len(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> SurfaceMesh {
        let mut mesh = SurfaceMesh::from_points(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]);
        mesh.add_polygon(&[0, 1, 2, 3]);
        mesh
    }

    #[test]
    fn vertex_attribute_shadows_point_attribute() {
        let mut mesh = quad();
        mesh.set_attribute(AttributeChannel::constant(NORMAL, Rate::Point, 4, &[0.0, 0.0, 1.0]).unwrap());
        mesh.set_attribute(AttributeChannel::constant(NORMAL, Rate::Vertex, 4, &[0.0, 0.0, -1.0]).unwrap());

        let found = mesh.find_attribute(NORMAL, None).unwrap();
        assert_eq!(found.rate(), Rate::Vertex);
        let pinned = mesh.find_attribute(NORMAL, Some(Rate::Point)).unwrap();
        assert_eq!(pinned.tuple(0), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn validate_catches_bad_point_reference() {
        let mut mesh = quad();
        mesh.add_polygon(&[0, 1, 7]);
        assert!(matches!(
            mesh.validate(),
            Err(CoreError::InvalidPointReference { primitive: 1, point: 7, .. })
        ));
    }

    #[test]
    fn validate_catches_attribute_count_mismatch() {
        let mut mesh = quad();
        mesh.set_attribute(AttributeChannel::constant(UV, Rate::Vertex, 3, &[0.0, 0.0]).unwrap());
        assert!(matches!(
            mesh.validate(),
            Err(CoreError::AttributeSizeMismatch { expected: 4, got: 3, .. })
        ));
    }

    #[test]
    fn set_attribute_replaces_same_rate() {
        let mut mesh = quad();
        mesh.set_attribute(AttributeChannel::constant(UV, Rate::Point, 4, &[0.0, 0.0]).unwrap());
        mesh.set_attribute(AttributeChannel::constant(UV, Rate::Point, 4, &[1.0, 1.0]).unwrap());
        assert_eq!(mesh.attributes().len(), 2);
        assert_eq!(mesh.find_attribute(UV, None).unwrap().tuple(0), &[1.0, 1.0]);
    }
}
