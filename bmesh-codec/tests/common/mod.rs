//! Test-only reader for binarymesh documents and shared fixtures.

#![allow(dead_code)]

use bmesh_core::{AttributeChannel, Rate, SurfaceMesh};

pub struct Face {
    pub corners: Vec<[u32; 3]>,
    pub slot: u16,
}

pub struct Block {
    pub count: usize,
    pub values: Vec<f64>,
}

pub struct Document {
    pub version: u16,
    pub part: String,
    pub positions: Block,
    pub normals: Block,
    pub uvs: Block,
    pub materials: Vec<String>,
    pub faces: Vec<Face>,
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> &'a [u8] {
        let bytes = self.bytes;
        let out = &bytes[self.pos..self.pos + n];
        self.pos += n;
        out
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take(2).try_into().unwrap())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take(4).try_into().unwrap())
    }

    fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.take(8).try_into().unwrap())
    }

    fn name(&mut self) -> String {
        let len = self.u16() as usize;
        String::from_utf8(self.take(len).to_vec()).unwrap()
    }

    fn block(&mut self, width: usize, float_bytes: usize) -> Block {
        let count = self.u32() as usize;
        let values = (0..count * width)
            .map(|_| match float_bytes {
                8 => f64::from_le_bytes(self.take(8).try_into().unwrap()),
                _ => f64::from(f32::from_le_bytes(self.take(4).try_into().unwrap())),
            })
            .collect();
        Block { count, values }
    }
}

/// Returns the version and the raw payload, decompressing the envelope for
/// versions that carry one.
pub fn split(bytes: &[u8]) -> (u16, Vec<u8>) {
    assert_eq!(&bytes[..10], b"BINARYMESH");
    let mut cursor = Cursor { bytes, pos: 10 };
    let version = cursor.u16();
    if version == 1 {
        return (version, bytes[12..].to_vec());
    }
    let raw_len = cursor.u64() as usize;
    let packed_len = cursor.u64() as usize;
    let packed = cursor.take(packed_len);
    assert_eq!(cursor.pos, bytes.len(), "trailing bytes after envelope");
    let raw = lz4_flex::block::decompress(packed, raw_len).unwrap();
    assert_eq!(raw.len(), raw_len);
    (version, raw)
}

pub fn decode(bytes: &[u8]) -> Document {
    let (version, payload) = split(bytes);
    let float_bytes = if version == 4 { 4 } else { 8 };
    let mut cursor = Cursor {
        bytes: &payload,
        pos: 0,
    };

    let part = cursor.name();
    let positions = cursor.block(3, float_bytes);
    let normals = cursor.block(3, float_bytes);
    let uvs = cursor.block(2, float_bytes);

    let slot_count = cursor.u16() as usize;
    let materials = (0..slot_count).map(|_| cursor.name()).collect();

    let face_count = cursor.u32() as usize;
    let mut faces = Vec::with_capacity(face_count);
    for _ in 0..face_count {
        let vertices = cursor.u16() as usize;
        let corners = (0..vertices)
            .map(|_| [cursor.u32(), cursor.u32(), cursor.u32()])
            .collect();
        let slot = cursor.u16();
        faces.push(Face { corners, slot });
    }
    assert_eq!(cursor.pos, payload.len(), "trailing bytes after faces");

    Document {
        version,
        part,
        positions,
        normals,
        uvs,
        materials,
        faces,
    }
}

/// Unit cube, six outward-facing quads.
pub fn cube() -> SurfaceMesh {
    let mut mesh = SurfaceMesh::from_points(&[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ]);
    for quad in [
        [0, 3, 2, 1],
        [4, 5, 6, 7],
        [0, 1, 5, 4],
        [2, 3, 7, 6],
        [1, 2, 6, 5],
        [0, 4, 7, 3],
    ] {
        mesh.add_polygon(&quad);
    }
    mesh
}

/// The cube with flat normals authored on every quad corner.
pub fn cube_with_vertex_normals() -> SurfaceMesh {
    let mut mesh = cube();
    let face_normals = [
        [0.0, 0.0, -1.0],
        [0.0, 0.0, 1.0],
        [0.0, -1.0, 0.0],
        [0.0, 1.0, 0.0],
        [1.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0],
    ];
    let normals: Vec<[f64; 3]> = face_normals.iter().flat_map(|&n| [n; 4]).collect();
    mesh.set_attribute(AttributeChannel::from_tuples("N", Rate::Vertex, &normals).unwrap());
    mesh
}
