use bmesh_core::AttributeChannel;
use std::io::Write;

use crate::error::{CodecError, CodecResult};
use crate::format::{FloatWidth, FormatVersion, HEADER_LEN, MAGIC};
use crate::processor::{MaterialTable, Reconciled, TessellatedMesh};

/// Size of the `rawLength | compressedLength` prefix of a compressed envelope.
pub const ENVELOPE_PREFIX_LEN: usize = 16;

pub fn write_header<W: Write>(sink: &mut W, version: FormatVersion) -> CodecResult<usize> {
    sink.write_all(&MAGIC)?;
    sink.write_all(&version.as_u16().to_le_bytes())?;
    Ok(HEADER_LEN)
}

/// Compresses `raw` as a single LZ4 block and writes it with its length prefix.
pub fn write_envelope<W: Write>(sink: &mut W, raw: &[u8]) -> CodecResult<usize> {
    let mut compressed = vec![0u8; lz4_flex::block::get_maximum_output_size(raw.len())];
    let len = lz4_flex::block::compress_into(raw, &mut compressed)
        .map_err(|e| CodecError::CompressionFailure(e.to_string()))?;

    sink.write_all(&(raw.len() as u64).to_le_bytes())?;
    sink.write_all(&(len as u64).to_le_bytes())?;
    sink.write_all(&compressed[..len])?;
    Ok(ENVELOPE_PREFIX_LEN + len)
}

/// Staging area for float blocks. Keeps its largest allocation for the rest
/// of the export.
#[derive(Debug, Default)]
pub struct ScratchBuffer {
    bytes: Vec<u8>,
}

impl ScratchBuffer {
    /// Encodes `values` little-endian at `width` and returns the bytes.
    pub fn fill(&mut self, values: &[f64], width: FloatWidth) -> &[u8] {
        self.bytes.clear();
        self.bytes.reserve(values.len() * width.byte_len());
        match width {
            FloatWidth::F64 => {
                #[cfg(target_endian = "little")]
                self.bytes.extend_from_slice(bytemuck::cast_slice(values));
                #[cfg(target_endian = "big")]
                for v in values {
                    self.bytes.extend_from_slice(&v.to_le_bytes());
                }
            }
            FloatWidth::F32 => {
                for &v in values {
                    self.bytes.extend_from_slice(&(v as f32).to_le_bytes());
                }
            }
        }
        &self.bytes
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }
}

fn count_u32(what: &'static str, count: usize) -> CodecResult<u32> {
    u32::try_from(count).map_err(|_| CodecError::CountOverflow { what, count })
}

fn count_u16(what: &'static str, count: usize) -> CodecResult<u16> {
    u16::try_from(count).map_err(|_| CodecError::CountOverflow { what, count })
}

fn name_len(name: &str) -> CodecResult<u16> {
    u16::try_from(name.len()).map_err(|_| CodecError::NameTooLong {
        name: name.to_owned(),
        len: name.len(),
    })
}

/// Writes the payload sections of a document in order.
pub struct PayloadWriter<W: Write> {
    sink: W,
    width: FloatWidth,
    scratch: ScratchBuffer,
    written: usize,
}

impl<W: Write> PayloadWriter<W> {
    pub fn new(sink: W, width: FloatWidth) -> Self {
        Self {
            sink,
            width,
            scratch: ScratchBuffer::default(),
            written: 0,
        }
    }

    fn put(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.sink.write_all(bytes)?;
        self.written += bytes.len();
        Ok(())
    }

    fn write_name(&mut self, name: &str) -> CodecResult<()> {
        let len = name_len(name)?;
        self.put(&len.to_le_bytes())?;
        self.put(name.as_bytes())
    }

    pub fn write_part_name(&mut self, name: &str) -> CodecResult<()> {
        self.write_name(name)
    }

    /// Entry count followed by every tuple at the writer's float width.
    pub fn write_channel(&mut self, channel: &AttributeChannel) -> CodecResult<()> {
        let entries = count_u32("attribute entries", channel.len())?;
        self.put(&entries.to_le_bytes())?;

        let bytes = self.scratch.fill(channel.values(), self.width);
        self.sink.write_all(bytes)?;
        self.written += bytes.len();
        Ok(())
    }

    pub fn write_material_slots(&mut self, slots: &[String]) -> CodecResult<()> {
        let count = u16::try_from(slots.len()).map_err(|_| CodecError::SlotOverflow { count: slots.len() })?;
        self.put(&count.to_le_bytes())?;
        for slot in slots {
            self.write_name(slot)?;
        }
        Ok(())
    }

    /// Face count, then per face its vertex count, corner index triples and
    /// material slot.
    pub fn write_faces(
        &mut self,
        mesh: &TessellatedMesh,
        reconciled: &Reconciled,
        materials: &MaterialTable,
    ) -> CodecResult<()> {
        let faces = count_u32("faces", mesh.face_count())?;
        self.put(&faces.to_le_bytes())?;

        for face in 0..mesh.face_count() {
            let first = mesh.first_corner_of(face);
            let vertices = mesh.vertex_count_of(face);
            self.put(&count_u16("face vertices", vertices)?.to_le_bytes())?;

            let corners = &reconciled.corners[first..first + vertices];
            #[cfg(target_endian = "little")]
            self.put(bytemuck::cast_slice(corners))?;
            #[cfg(target_endian = "big")]
            for c in corners {
                for index in [c.point, c.normal, c.uv] {
                    self.put(&index.to_le_bytes())?;
                }
            }

            self.put(&materials.slot_of(face).to_le_bytes())?;
        }
        Ok(())
    }

    pub fn bytes_written(&self) -> usize {
        self.written
    }

    /// Largest float block staged so far, in bytes.
    pub fn scratch_capacity(&self) -> usize {
        self.scratch.capacity()
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
