use anyhow::{Context, Result, bail};
use bmesh_codec::MATERIAL_PATH;
use bmesh_core::{AttributeChannel, NORMAL, Rate, StringAttribute, SurfaceMesh, UV};
use log::{debug, warn};
use std::path::Path;

/// Keeps polygons and per-corner normal/texcoord indices as authored.
fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: false,
        triangulate: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

pub fn load_obj(path: &Path) -> Result<SurfaceMesh> {
    let (models, materials) = tobj::load_obj(path, &load_options())
        .with_context(|| format!("Failed to load OBJ file: {}", path.display()))?;

    let material_names: Vec<String> = match materials {
        Ok(materials) => materials.into_iter().map(|m| m.name).collect(),
        Err(e) => {
            warn!("{}: materials unavailable ({}), faces use the default slot", path.display(), e);
            Vec::new()
        }
    };

    let mesh = merge_models(&models, &material_names)?;
    debug!(
        "Loaded {}: {} models, {} points, {} faces",
        path.display(),
        models.len(),
        mesh.point_count(),
        mesh.primitives().len()
    );
    Ok(mesh)
}

/// Per-corner values gathered through an OBJ index list, or `None` once any
/// model lacks them.
struct CornerValues {
    width: usize,
    values: Option<Vec<f64>>,
}

impl CornerValues {
    fn new(width: usize) -> Self {
        Self {
            width,
            values: Some(Vec::new()),
        }
    }

    fn extend(&mut self, source: &[f32], indices: &[u32], corners: usize) {
        let Some(values) = self.values.as_mut() else {
            return;
        };
        let tuples = source.len() / self.width;
        if indices.len() != corners || indices.iter().any(|&i| i as usize >= tuples) {
            self.values = None;
            return;
        }
        for &i in indices {
            let start = i as usize * self.width;
            values.extend(source[start..start + self.width].iter().map(|&v| f64::from(v)));
        }
    }

    fn into_channel(self, name: &str) -> Result<Option<AttributeChannel>> {
        match self.values {
            Some(values) if !values.is_empty() => {
                Ok(Some(AttributeChannel::new(name, Rate::Vertex, self.width, values)?))
            }
            _ => Ok(None),
        }
    }
}

/// Merges every model into one mesh, offsetting point references by the
/// points that came before.
pub fn merge_models(models: &[tobj::Model], material_names: &[String]) -> Result<SurfaceMesh> {
    let mut points: Vec<[f64; 3]> = Vec::new();
    let mut faces: Vec<Vec<u32>> = Vec::new();
    let mut face_materials: Vec<Option<&str>> = Vec::new();
    let mut normals = CornerValues::new(3);
    let mut uvs = CornerValues::new(2);

    for model in models {
        let mesh = &model.mesh;
        let offset = u32::try_from(points.len()).context("Too many points in OBJ")?;
        points.extend(
            mesh.positions
                .chunks_exact(3)
                .map(|p| [f64::from(p[0]), f64::from(p[1]), f64::from(p[2])]),
        );

        let arities: Vec<usize> = if mesh.face_arities.is_empty() {
            vec![3; mesh.indices.len() / 3]
        } else {
            mesh.face_arities.iter().map(|&a| a as usize).collect()
        };
        if arities.iter().sum::<usize>() != mesh.indices.len() {
            bail!("Model '{}' has face arities that do not cover its indices", model.name);
        }

        let material = mesh
            .material_id
            .and_then(|id| material_names.get(id))
            .map(String::as_str);

        let mut start = 0;
        for arity in arities {
            let face = &mesh.indices[start..start + arity];
            faces.push(face.iter().map(|&i| i + offset).collect());
            face_materials.push(material);
            start += arity;
        }

        let corners = mesh.indices.len();
        normals.extend(&mesh.normals, &mesh.normal_indices, corners);
        uvs.extend(&mesh.texcoords, &mesh.texcoord_indices, corners);
    }

    if points.is_empty() {
        bail!("OBJ has no vertex positions");
    }
    let mut surface = SurfaceMesh::from_points(&points);
    for face in &faces {
        surface.add_polygon(face);
    }
    if let Some(channel) = normals.into_channel(NORMAL)? {
        surface.set_attribute(channel);
    }
    if let Some(channel) = uvs.into_channel(UV)? {
        surface.set_attribute(channel);
    }
    if face_materials.iter().any(Option::is_some) {
        surface.set_primitive_strings(StringAttribute::from_values(MATERIAL_PATH, &face_materials));
    }
    Ok(surface)
}
