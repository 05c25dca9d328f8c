//! Error types for ptsdump
//!
//! Only `Open` and `StreamInfo` abort a run. Every other variant is
//! reported with stream context and the run carries on.

use thiserror::Error;

/// Main error type for ptsdump
#[derive(Error, Debug)]
pub enum Error {
    /// The input could not be opened or its header could not be read
    #[error("Unable to open stream {url}: {reason}")]
    Open { url: String, reason: String },

    /// Stream metadata could not be retrieved from the container
    #[error("Couldn't find stream information: {0}")]
    StreamInfo(String),

    /// A unit referenced a stream index the container never announced
    #[error("Unknown stream index {0}")]
    UnknownStream(usize),

    /// No decoder implementation is registered for the codec
    #[error("Stream {index}: unsupported codec {codec}")]
    UnsupportedCodec { index: usize, codec: String },

    /// A decoder implementation exists but could not be opened
    #[error("Stream {index}: can not open codec: {reason}")]
    DecoderOpen { index: usize, reason: String },

    /// The source failed while pulling the next encoded unit
    #[error("Read error: {0}")]
    Read(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    /// True for the error classes that abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Open { .. } | Error::StreamInfo(_))
    }
}

/// Convenience Result type using the ptsdump Error
pub type Result<T> = std::result::Result<T, Error>;
