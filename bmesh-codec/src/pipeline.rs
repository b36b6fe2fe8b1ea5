use bmesh_core::{AttributeChannel, SurfaceMesh};
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::encoder::{PayloadWriter, write_envelope, write_header};
use crate::error::{CodecError, CodecResult};
use crate::format::ExportConfig;
use crate::processor::{MaterialTable, Reconciled, TessellatedMesh, Tessellator, accessor, reconcile};

/// What one export produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub points: usize,
    pub faces: usize,
    pub corners: usize,
    pub material_slots: usize,
    pub normal_on_vertex: bool,
    pub uv_on_vertex: bool,
    /// Uncompressed payload size, header excluded.
    pub payload_bytes: usize,
    /// Everything written to the sink, header included.
    pub written_bytes: usize,
}

/// A tessellated mesh with its attribute blocks, corner indices and
/// material slots resolved, ready to be encoded any number of times.
#[derive(Clone, Debug)]
pub struct PreparedMesh {
    mesh: TessellatedMesh,
    positions: AttributeChannel,
    normals: AttributeChannel,
    uvs: AttributeChannel,
    reconciled: Reconciled,
    materials: MaterialTable,
}

impl PreparedMesh {
    /// Runs every step that can reject the geometry. Nothing is written.
    pub fn prepare(mesh: &SurfaceMesh, tessellator: &dyn Tessellator) -> CodecResult<Self> {
        let tessellated = tessellator.tessellate(mesh, true)?;
        Self::from_tessellated(tessellated)
    }

    pub fn from_tessellated(mesh: TessellatedMesh) -> CodecResult<Self> {
        mesh.validate()?;
        let positions = accessor::position_channel(&mesh)?;
        let normals = accessor::normal_channel(&mesh)?;
        let uvs = accessor::uv_channel(&mesh)?;
        let reconciled = reconcile(&mesh, &positions, &normals, &uvs);
        let materials = MaterialTable::build(&mesh)?;
        check_field_widths(&mesh, [&positions, &normals, &uvs])?;

        debug!(
            "Prepared {} faces, normals on {}, uvs on {}",
            mesh.face_count(),
            if reconciled.normal_on_vertex { "vertices" } else { "points" },
            if reconciled.uv_on_vertex { "vertices" } else { "points" },
        );

        Ok(Self {
            mesh,
            positions,
            normals,
            uvs,
            reconciled,
            materials,
        })
    }

    pub fn mesh(&self) -> &TessellatedMesh {
        &self.mesh
    }

    pub fn reconciled(&self) -> &Reconciled {
        &self.reconciled
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    pub fn uvs(&self) -> &AttributeChannel {
        &self.uvs
    }

    fn write_payload<W: Write>(&self, sink: W, config: &ExportConfig) -> CodecResult<(W, usize)> {
        let mut writer = PayloadWriter::new(sink, config.float_width);
        writer.write_part_name(&config.part_name)?;
        writer.write_channel(&self.positions)?;
        writer.write_channel(&self.normals)?;
        writer.write_channel(&self.uvs)?;
        writer.write_material_slots(self.materials.slots())?;
        writer.write_faces(&self.mesh, &self.reconciled, &self.materials)?;

        debug!("Scratch buffer peaked at {} bytes", writer.scratch_capacity());
        let written = writer.bytes_written();
        Ok((writer.into_inner(), written))
    }

    /// Writes the header and payload; compressed configs stage the payload in
    /// memory and write it as one envelope.
    pub fn encode<W: Write>(&self, sink: &mut W, config: &ExportConfig) -> CodecResult<ExportSummary> {
        config.validate()?;

        let mut written = write_header(sink, config.format_version)?;
        let payload_bytes = if config.compression {
            let (staging, payload_bytes) = self.write_payload(Vec::new(), config)?;
            written += write_envelope(sink, &staging)?;
            payload_bytes
        } else {
            let (_, payload_bytes) = self.write_payload(&mut *sink, config)?;
            written += payload_bytes;
            payload_bytes
        };

        Ok(ExportSummary {
            points: self.mesh.point_count(),
            faces: self.mesh.face_count(),
            corners: self.mesh.corner_count(),
            material_slots: self.materials.slots().len(),
            normal_on_vertex: self.reconciled.normal_on_vertex,
            uv_on_vertex: self.reconciled.uv_on_vertex,
            payload_bytes,
            written_bytes: written,
        })
    }
}

/// Fails on any count the payload could not hold, so that encoding never
/// stops halfway through a document.
fn check_field_widths(mesh: &TessellatedMesh, channels: [&AttributeChannel; 3]) -> CodecResult<()> {
    let too_wide = |what: &'static str, count: usize, limit: usize| {
        if count > limit {
            Err(CodecError::CountOverflow { what, count })
        } else {
            Ok(())
        }
    };
    let u32_limit = u32::MAX as usize;
    too_wide("faces", mesh.face_count(), u32_limit)?;
    for channel in channels {
        too_wide("attribute entries", channel.len(), u32_limit)?;
    }
    // Corner indices are u32 as well.
    too_wide("corners", mesh.corner_count(), u32_limit)?;
    if let Some(widest) = (0..mesh.face_count()).map(|f| mesh.vertex_count_of(f)).max() {
        too_wide("face vertices", widest, usize::from(u16::MAX))?;
    }
    Ok(())
}

/// Tessellates `mesh` and streams a binarymesh document into `sink`.
pub fn export_binarymesh<W: Write>(
    sink: &mut W,
    mesh: &SurfaceMesh,
    tessellator: &dyn Tessellator,
    config: &ExportConfig,
) -> CodecResult<ExportSummary> {
    config.validate()?;
    let prepared = PreparedMesh::prepare(mesh, tessellator)?;
    prepared.encode(sink, config)
}

/// Like [`export_binarymesh`], writing to a file. The file is only created
/// once the geometry has been accepted.
pub fn save_binarymesh<P: AsRef<Path>>(
    path: P,
    mesh: &SurfaceMesh,
    tessellator: &dyn Tessellator,
    config: &ExportConfig,
) -> CodecResult<ExportSummary> {
    config.validate()?;
    let prepared = PreparedMesh::prepare(mesh, tessellator)?;

    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::with_capacity(1024 * 1024, file);
    let summary = prepared.encode(&mut writer, config)?;
    writer.flush()?;

    info!(
        "Saved {:?}: {} faces, {} material slots, {} bytes (version {})",
        path.as_ref(),
        summary.faces,
        summary.material_slots,
        summary.written_bytes,
        config.format_version.as_u16()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{MATERIAL_PATH, PolygonTessellator};
    use bmesh_core::{POSITION, Rate, StringAttribute};

    fn triangle() -> SurfaceMesh {
        let mut mesh = SurfaceMesh::from_points(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        mesh.add_polygon(&[0, 1, 2]);
        mesh
    }

    #[test]
    fn oversized_material_name_fails_before_writing() {
        let mut mesh = triangle();
        let name = "/shop/".to_string() + &"x".repeat(70_000);
        mesh.set_primitive_strings(StringAttribute::from_values(MATERIAL_PATH, &[Some(name.as_str())]));

        let mut out = Vec::new();
        let config = ExportConfig::for_version(crate::format::FormatVersion::V1);
        let err = export_binarymesh(&mut out, &mesh, &PolygonTessellator, &config).unwrap_err();
        assert!(matches!(err, CodecError::NameTooLong { .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn oversized_face_fails_in_prepare() {
        let n = usize::from(u16::MAX) + 1;
        let face: Vec<u32> = (0..n as u32).collect();
        let mut mesh = TessellatedMesh::from_faces(n, &[face]);
        mesh.set_attribute(AttributeChannel::constant(POSITION, Rate::Point, n, &[0.0, 0.0, 0.0]).unwrap());

        assert!(matches!(
            PreparedMesh::from_tessellated(mesh),
            Err(CodecError::CountOverflow { what: "face vertices", count }) if count == n
        ));
    }

    #[test]
    fn oversized_part_name_fails_before_writing() {
        let mut config = ExportConfig::for_version(crate::format::FormatVersion::V1);
        config.part_name = "p".repeat(70_000);
        let mut out = Vec::new();
        let err = export_binarymesh(&mut out, &triangle(), &PolygonTessellator, &config).unwrap_err();
        assert!(matches!(err, CodecError::NameTooLong { len: 70_000, .. }));
        assert!(out.is_empty());
    }
}
