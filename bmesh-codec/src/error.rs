use bmesh_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Empty input: the mesh has no primitives")]
    EmptyInput,
    #[error("Unsupported geometry: no polygonal primitive survived filtering")]
    UnsupportedGeometry,
    #[error("Missing position channel 'P'")]
    MissingPositionChannel,
    #[error("Slot overflow: {count} material slots do not fit in a 16-bit slot id")]
    SlotOverflow { count: usize },
    #[error("Count overflow: {count} {what} exceeds the field width")]
    CountOverflow { what: &'static str, count: usize },
    #[error("Name too long: '{name}' is {len} bytes, at most 65535 are allowed")]
    NameTooLong { name: String, len: usize },
    #[error("Invalid export config: {0}")]
    InvalidConfig(String),
    #[error("Compression failed: {0}")]
    CompressionFailure(String),
    #[error("Sink write failed: {0}")]
    SinkWriteFailure(#[from] std::io::Error),
    #[error("Invalid mesh: {0}")]
    InvalidMesh(#[from] CoreError),
}

pub type CodecResult<T> = Result<T, CodecError>;
