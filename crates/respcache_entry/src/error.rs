use thiserror::Error;

/// Failure to read a persisted cache entry.
///
/// A record that fails to decode is reported as-is; it is never patched
/// into a default entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("not a cache entry record (bad magic)")]
    BadMagic,

    #[error("record truncated while reading {field}")]
    Truncated { field: &'static str },

    #[error("invalid presence flag {value} for {field}")]
    InvalidFlag { field: &'static str, value: u8 },

    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    #[error("invalid status code {0}")]
    InvalidStatus(u16),

    #[error("{0} unexpected bytes after the body")]
    TrailingBytes(usize),
}

/// Failure to write an entry as a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{field} is {len} bytes; records hold at most u32::MAX per field")]
    TooLarge { field: &'static str, len: usize },
}
