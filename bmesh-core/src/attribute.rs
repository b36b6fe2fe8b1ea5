use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};

/// How many entries an attribute carries: one per point, or one per face corner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Rate {
    Point,
    Vertex,
}

/// A named float attribute stored as flat, row-major tuples.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeChannel {
    name: String,
    rate: Rate,
    tuple_width: usize,
    values: Vec<f64>,
}

impl AttributeChannel {
    pub fn new(name: impl Into<String>, rate: Rate, tuple_width: usize, values: Vec<f64>) -> CoreResult<Self> {
        let name = name.into();
        if tuple_width == 0 || tuple_width > 4 {
            return Err(CoreError::InvalidTupleWidth { name, width: tuple_width });
        }
        if values.len() % tuple_width != 0 {
            return Err(CoreError::RaggedAttribute {
                name,
                len: values.len(),
                width: tuple_width,
            });
        }
        Ok(Self { name, rate, tuple_width, values })
    }

    /// Builds a channel from fixed-size tuples.
    pub fn from_tuples<const N: usize>(name: impl Into<String>, rate: Rate, tuples: &[[f64; N]]) -> CoreResult<Self> {
        Self::new(name, rate, N, tuples.iter().flatten().copied().collect())
    }

    /// A channel whose `count` tuples all equal `value`.
    pub fn constant(name: impl Into<String>, rate: Rate, count: usize, value: &[f64]) -> CoreResult<Self> {
        let mut values = Vec::with_capacity(count * value.len());
        for _ in 0..count {
            values.extend_from_slice(value);
        }
        Self::new(name, rate, value.len(), values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    pub fn tuple_width(&self) -> usize {
        self.tuple_width
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of tuples.
    pub fn len(&self) -> usize {
        self.values.len() / self.tuple_width
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn tuple(&self, index: usize) -> &[f64] {
        let start = index * self.tuple_width;
        &self.values[start..start + self.tuple_width]
    }

    /// Copies the channel to a new tuple width, keeping the leading components
    /// and padding missing ones with zero.
    pub fn repack(&self, width: usize) -> CoreResult<Self> {
        if width == self.tuple_width {
            return Ok(self.clone());
        }
        let mut values = Vec::with_capacity(self.len() * width);
        for i in 0..self.len() {
            let tuple = self.tuple(i);
            for c in 0..width {
                values.push(tuple.get(c).copied().unwrap_or(0.0));
            }
        }
        Self::new(self.name.clone(), self.rate, width, values)
    }

    /// Gathers tuples by index into a new channel at the given rate.
    pub fn gather(&self, rate: Rate, indices: &[usize]) -> Self {
        let mut values = Vec::with_capacity(indices.len() * self.tuple_width);
        for &i in indices {
            values.extend_from_slice(self.tuple(i));
        }
        Self {
            name: self.name.clone(),
            rate,
            tuple_width: self.tuple_width,
            values,
        }
    }
}

/// Per-primitive string handle, e.g. a material path.
///
/// Distinct strings live in `table` in first-occurrence order; each
/// primitive stores an index into it, `-1` meaning unassigned.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringAttribute {
    name: String,
    table: Vec<String>,
    indices: Vec<i32>,
}

impl StringAttribute {
    pub fn from_values<S: AsRef<str>>(name: impl Into<String>, values: &[Option<S>]) -> Self {
        let mut table: Vec<String> = Vec::new();
        let mut lookup: HashMap<String, i32> = HashMap::new();
        let mut indices = Vec::with_capacity(values.len());

        for value in values {
            let index = match value {
                Some(s) => {
                    let s = s.as_ref();
                    match lookup.get(s) {
                        Some(&i) => i,
                        None => {
                            let i = table.len() as i32;
                            table.push(s.to_owned());
                            lookup.insert(s.to_owned(), i);
                            i
                        }
                    }
                }
                None => -1,
            };
            indices.push(index);
        }

        Self {
            name: name.into(),
            table,
            indices,
        }
    }

    pub fn from_parts(name: impl Into<String>, table: Vec<String>, indices: Vec<i32>) -> CoreResult<Self> {
        let name = name.into();
        if let Some(&bad) = indices.iter().find(|&&i| i >= table.len() as i32) {
            return Err(CoreError::InvalidStringIndex {
                name,
                index: bad,
                table_len: table.len(),
            });
        }
        Ok(Self { name, table, indices })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strings(&self) -> &[String] {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Table index for a primitive; negative when unassigned or out of range.
    pub fn string_index(&self, primitive: usize) -> i32 {
        self.indices.get(primitive).copied().unwrap_or(-1)
    }

    pub fn string_of(&self, primitive: usize) -> Option<&str> {
        usize::try_from(self.string_index(primitive))
            .ok()
            .map(|i| self.table[i].as_str())
    }

    /// Per-primitive indices following `source`, which maps each new primitive
    /// to the primitive it was derived from. The table is kept as is.
    pub fn remapped(&self, source: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            table: self.table.clone(),
            indices: source.iter().map(|&p| self.string_index(p)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_dedup_in_first_seen_order() {
        let attr = StringAttribute::from_values("shop_materialpath", &[Some("/b"), None, Some("/a"), Some("/b")]);
        assert_eq!(attr.strings(), &["/b".to_string(), "/a".to_string()]);
        assert_eq!(attr.string_index(0), 0);
        assert_eq!(attr.string_index(1), -1);
        assert_eq!(attr.string_index(2), 1);
        assert_eq!(attr.string_index(3), 0);
        assert_eq!(attr.string_index(99), -1);
        assert_eq!(attr.string_of(2), Some("/a"));
    }

    #[test]
    fn from_parts_rejects_out_of_table_index() {
        let err = StringAttribute::from_parts("m", vec!["x".into()], vec![0, 1]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidStringIndex { index: 1, .. }));
    }

    #[test]
    fn repack_drops_trailing_components() {
        let uv = AttributeChannel::from_tuples("uv", Rate::Point, &[[0.25, 0.5, 9.0], [1.0, 0.0, 9.0]]).unwrap();
        let packed = uv.repack(2).unwrap();
        assert_eq!(packed.tuple_width(), 2);
        assert_eq!(packed.values(), &[0.25, 0.5, 1.0, 0.0]);
    }

    #[test]
    fn constant_channel_repeats_value() {
        let n = AttributeChannel::constant("N", Rate::Point, 3, &[0.0, 1.0, 0.0]).unwrap();
        assert_eq!(n.len(), 3);
        assert_eq!(n.tuple(2), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn ragged_values_are_rejected() {
        assert!(AttributeChannel::new("P", Rate::Point, 3, vec![0.0; 4]).is_err());
        assert!(AttributeChannel::new("P", Rate::Point, 0, vec![]).is_err());
    }
}
