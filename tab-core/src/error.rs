//! Typed errors for file ingestion and persistence.
//!
//! Device-capture failures stay on the `anyhow` path of the operation that
//! attempted to start capture; the errors here are the ones a caller is
//! expected to match on.

use thiserror::Error;

/// Rejections raised by the file-based sample source before any sample is
/// read, leaving the recording untouched.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Only mono input is accepted.
    #[error("expected a mono file, got {0} channels")]
    UnsupportedChannels(u16),

    /// Only 16-bit integer PCM is accepted.
    #[error("expected 16-bit PCM samples, got {0} bits")]
    UnsupportedBitDepth(u16),

    /// Float-encoded WAV data is not 16-bit PCM either.
    #[error("expected integer PCM samples, got float samples")]
    UnsupportedSampleFormat,

    /// The container itself could not be opened or parsed.
    #[error("wav: {0}")]
    Wav(#[from] hound::Error),
}

/// Failures while framing or unframing a persisted recording.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The one-byte compression flag named a scheme this reader lacks.
    #[error("unsupported compression flag {0:#04x}")]
    UnsupportedCompression(u8),

    /// The stream ended before the flag byte.
    #[error("missing compression flag")]
    MissingFlag,

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("payload: {0}")]
    Payload(#[from] serde_json::Error),
}
