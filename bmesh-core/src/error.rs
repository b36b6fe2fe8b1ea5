use thiserror::Error;

use crate::attribute::Rate;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid point reference: primitive {primitive} uses point {point}, mesh has {point_count} points")]
    InvalidPointReference {
        primitive: usize,
        point: u32,
        point_count: usize,
    },
    #[error("Attribute size mismatch: '{name}' at {rate:?} rate expects {expected} tuples, got {got}")]
    AttributeSizeMismatch {
        name: String,
        rate: Rate,
        expected: usize,
        got: usize,
    },
    #[error("Attribute '{name}' has {len} values, not a multiple of tuple width {width}")]
    RaggedAttribute { name: String, len: usize, width: usize },
    #[error("Invalid tuple width {width} for attribute '{name}'")]
    InvalidTupleWidth { name: String, width: usize },
    #[error("String attribute '{name}' references entry {index} of a {table_len}-entry table")]
    InvalidStringIndex {
        name: String,
        index: i32,
        table_len: usize,
    },
}

pub type CoreResult<T> = Result<T, CoreError>;
