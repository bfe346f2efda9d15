//! External collaborator interfaces.
//!
//! The core depends only on these contracts. Audio retrieval, codec work,
//! the acoustic model, and user-facing status display all live behind these
//! traits; the crate ships default implementations for fetch
//! ([`crate::fetch::HttpAudioFetcher`]), decode
//! ([`crate::decode::SymphoniaDecoder`]), and notification
//! ([`TracingNotifier`]). The model loader is always supplied by the host,
//! since it is bound to whichever recognition engine is in use.

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info};

use crate::Result;

/// Retrieves raw audio bytes for a locator (typically a URL).
///
/// Implementations must report "not found / HTTP error" distinguishably via
/// [`crate::Error::Fetch`]. On restricted front-ends this may proxy through a
/// privileged process; the core does not care how the bytes arrive.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>>;
}

/// Decodes raw container bytes into mono PCM at the recognizer sample rate.
///
/// The output is mono `f32` at [`crate::decode::TARGET_SAMPLE_RATE`].
#[async_trait]
pub trait AudioDecoder: Send + Sync {
    async fn decode(&self, bytes: Vec<u8>) -> Result<Vec<f32>>;
}

/// Loads a recognition model from a source identifier (typically a URL).
///
/// Loading may take substantial wall-clock time. Implementations do not need
/// to deduplicate concurrent loads of the same source — that is
/// [`crate::model::ModelProvider`]'s job.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, source: &str) -> Result<Box<dyn RecognitionModel>>;
}

/// A loaded recognition engine, shared by every job until the configured
/// source changes.
pub trait RecognitionModel: Send + Sync {
    /// Create a fresh recognizer session bound to `sample_rate`.
    ///
    /// Events for this session arrive on the returned channel; the session
    /// handle accepts audio and must be released when the job is done with it.
    fn create_recognizer(
        &self,
        sample_rate: u32,
    ) -> Result<(Box<dyn Recognizer>, UnboundedReceiver<RecognizerEvent>)>;
}

/// A stateful streaming recognition session bound to one audio stream.
///
/// The session is exclusively owned by its job. Every `accept_chunk` and the
/// one `finalize` call each count as a submitted unit of work; the engine
/// answers each unit with exactly one event on the session's channel.
pub trait Recognizer: Send {
    /// Submit one chunk of mono PCM samples.
    fn accept_chunk(&mut self, samples: &[f32]) -> Result<()>;

    /// Request the final segment. No further chunks may be submitted after this.
    fn finalize(&mut self) -> Result<()>;

    /// Release the engine-side resource. After release the session stops
    /// emitting events. Must be safe to call exactly once.
    fn release(&mut self);
}

/// Event emitted by a recognizer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    /// A permanently recognized text chunk; never revised.
    FinalSegment(String),
    /// Provisional in-progress text, superseded by the next event.
    Partial(String),
    /// Engine-reported failure. Terminates the job.
    Error(String),
}

/// Severity of a user-facing status notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Progress,
    Success,
    Failure,
}

/// User-visible notification channel (the host UI's toasts, typically).
///
/// Stage failures are reported here exactly once per failed job.
/// Cancellation is never reported.
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NoticeKind, message: &str);
}

/// Default [`Notifier`] that routes notices into the `tracing` stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Progress | NoticeKind::Success => info!(kind = ?kind, "{message}"),
            NoticeKind::Failure => error!("{message}"),
        }
    }
}
