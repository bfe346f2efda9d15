use thiserror::Error;

/// Murmur's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Murmur's crate-wide error type.
///
/// Each variant maps to one stage of the transcription pipeline, so a failure
/// always identifies the stage that produced it. The type is `Clone` because a
/// single in-flight model load is shared between concurrent callers, and all
/// of them must receive the same failure.
///
/// `Cancelled` is an internal signal: it is the sole mechanism for cleanly
/// unwinding a job from a pending suspension and must never reach the
/// user-visible notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Retrieving the raw audio bytes failed (network error, HTTP error, not found).
    #[error("audio fetch failed: {0}")]
    Fetch(String),

    /// Decoding the raw bytes into mono 16 kHz PCM failed.
    #[error("audio decode failed: {0}")]
    Decode(String),

    /// Loading the recognition model failed, including "no source configured".
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// The recognition engine reported an error mid-stream.
    #[error("recognition failed: {0}")]
    Recognition(String),

    /// The job was cancelled cooperatively. Swallowed before it reaches users.
    #[error("transcription cancelled")]
    Cancelled,
}

impl Error {
    /// Whether this error is the internal cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
