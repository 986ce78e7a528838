use crate::tag::TagKind;

#[derive(Debug, thiserror::Error)]
pub enum NbtError {
    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("invalid tag id: {0}")]
    InvalidTagId(u8),

    #[error("negative length {len} for {what}")]
    NegativeLength { what: &'static str, len: i32 },

    #[error("list element kind mismatch: list holds {expected:?}, got {actual:?}")]
    ListKindMismatch { expected: TagKind, actual: TagKind },

    #[error("string too long: {len} bytes (max {max})")]
    StringTooLong { len: usize, max: usize },

    #[error("{what} too long to encode: {len} elements")]
    LengthOverflow { what: &'static str, len: usize },

    #[error("nesting deeper than {max} levels")]
    TooDeep { max: usize },
}

impl NbtError {
    /// Truncation is expected at the tail of partially written records
    pub fn is_truncation(&self) -> bool {
        matches!(self, NbtError::UnexpectedEof)
    }
}

pub type Result<T> = std::result::Result<T, NbtError>;
