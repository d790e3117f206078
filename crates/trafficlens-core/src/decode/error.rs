use thiserror::Error;

/// Reasons a frame could not be sliced into layers.
///
/// These never escape `decode`; they only explain why a record came out
/// empty.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("packet slice error: {0}")]
    Slice(String),
    #[error("unsupported link type {0}")]
    UnsupportedLinktype(i32),
}
