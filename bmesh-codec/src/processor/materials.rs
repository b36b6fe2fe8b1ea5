use log::debug;
use std::collections::HashMap;

use crate::error::{CodecError, CodecResult};
use crate::format::FALLBACK_MATERIAL;
use crate::processor::tessellate::TessellatedMesh;

/// Per-primitive string attribute holding material paths.
pub const MATERIAL_PATH: &str = "shop_materialpath";

/// Ordered material slots plus a slot id for every face.
///
/// The last slot is always the fallback, even if a face already names a
/// material called `"default"`; readers address the fallback by position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialTable {
    slots: Vec<String>,
    face_slots: Vec<u16>,
}

impl MaterialTable {
    /// Collects the materials faces use, in the order faces first use them,
    /// then appends the fallback slot.
    pub fn build(mesh: &TessellatedMesh) -> CodecResult<Self> {
        let strings = mesh.primitive_strings(MATERIAL_PATH);
        let mut slots: Vec<String> = Vec::new();
        let mut lookup: HashMap<&str, usize> = HashMap::new();
        let mut face_slots: Vec<Option<usize>> = Vec::with_capacity(mesh.face_count());

        for face in 0..mesh.face_count() {
            let slot = strings.and_then(|m| m.string_of(face)).map(|name| {
                *lookup.entry(name).or_insert_with(|| {
                    slots.push(name.to_owned());
                    slots.len() - 1
                })
            });
            face_slots.push(slot);
        }
        slots.push(FALLBACK_MATERIAL.to_owned());

        if slots.len() > usize::from(u16::MAX) {
            return Err(CodecError::SlotOverflow { count: slots.len() });
        }
        if let Some(name) = slots.iter().find(|s| s.len() > usize::from(u16::MAX)) {
            return Err(CodecError::NameTooLong {
                name: name.clone(),
                len: name.len(),
            });
        }
        let fallback = (slots.len() - 1) as u16;
        let face_slots = face_slots
            .into_iter()
            .map(|slot| slot.map_or(fallback, |s| s as u16))
            .collect();

        debug!("Material table has {} slots", slots.len());
        Ok(Self { slots, face_slots })
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    pub fn slot_of(&self, face: usize) -> u16 {
        self.face_slots[face]
    }

    pub fn fallback_slot(&self) -> u16 {
        (self.slots.len() - 1) as u16
    }
}
