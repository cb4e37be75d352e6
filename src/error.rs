use thiserror::Error;

/// Errors surfaced by the core: bit-array bounds, palette/region
/// invariants, discriminating-map rejections, and NBT decode failures.
#[derive(Error, Debug)]
pub enum SchematicError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NBT error: {0}")]
    Nbt(#[from] quartz_nbt::io::NbtIoError),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("required key missing: {0}")]
    RequiredKeyMissing(String),

    #[error("index {index} out of range [0, {len})")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("value {value} out of range [0, {bound})")]
    ValueOutOfRange { value: i64, bound: u64 },

    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Unsupported Litematica version: {0}")]
    UnsupportedVersion(i32),

    #[error("corrupted schematic: {0}")]
    CorruptedSchematic(String),

    #[error("discrimination rejected: {0}")]
    DiscriminationError(String),
}

pub type Result<T> = std::result::Result<T, SchematicError>;
