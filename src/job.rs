//! The per-key transcription job: fetch → decode → load model → recognize →
//! publish.
//!
//! One job runs as one spawned task. Cancellation is cooperative: the job
//! checks its token immediately before and after every suspension point and
//! races every in-flight await against it, so a cancelled job unwinds without
//! publishing anything further for its key. The recognizer resource is held
//! in a release-on-drop guard, which makes release run exactly once on every
//! exit path — success, failure, or cancel.

use std::future::Future;
use std::sync::{Arc, RwLock};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::decode::TARGET_SAMPLE_RATE;
use crate::engine::{
    AudioDecoder, AudioFetcher, NoticeKind, Notifier, RecognitionModel, Recognizer,
    RecognizerEvent,
};
use crate::error::{Error, Result};
use crate::key::MessageId;
use crate::listeners::ListenerRegistry;
use crate::model::ModelProvider;
use crate::opts::Opts;
use crate::registry::JobRegistry;
use crate::transcript::Transcript;

/// Samples submitted to the recognizer per accept operation (≈ 0.5 s at 16 kHz).
pub(crate) const CHUNK_SAMPLES: usize = 8_000;

/// Pipeline stage, used for tracing and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobStage {
    Fetching,
    Decoding,
    ModelLoading,
}

/// One in-flight transcription, exclusively owning the right to publish
/// updates for its key until it removes its registry handle.
pub(crate) struct TranscriptionJob {
    key: MessageId,
    locator: String,
    token: CancellationToken,
    listeners: ListenerRegistry,
    jobs: JobRegistry,
    provider: Arc<ModelProvider>,
    fetcher: Arc<dyn AudioFetcher>,
    decoder: Arc<dyn AudioDecoder>,
    notifier: Arc<dyn Notifier>,
    opts: Arc<RwLock<Opts>>,
    last_published: Option<String>,
}

impl TranscriptionJob {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        key: MessageId,
        locator: String,
        token: CancellationToken,
        listeners: ListenerRegistry,
        jobs: JobRegistry,
        provider: Arc<ModelProvider>,
        fetcher: Arc<dyn AudioFetcher>,
        decoder: Arc<dyn AudioDecoder>,
        notifier: Arc<dyn Notifier>,
        opts: Arc<RwLock<Opts>>,
    ) -> Self {
        Self {
            key,
            locator,
            token,
            listeners,
            jobs,
            provider,
            fetcher,
            decoder,
            notifier,
            opts,
            last_published: None,
        }
    }

    /// Drive the job to completion, cancellation, or failure.
    ///
    /// Failures abort only this key's job and are reported once via the
    /// notifier; cancellation is swallowed. The registry handle is removed on
    /// every exit path (the cancel path may have beaten us to it).
    pub(crate) async fn run(mut self) {
        let key = self.key.clone();
        debug!(key = %key, locator = %self.locator, "transcription job started");

        let mut result = self.pipeline().await;
        if self.token.is_cancelled() {
            result = Err(Error::Cancelled);
        }

        match result {
            Ok(Some(text)) => {
                self.publish_update(&text);
                debug!(key = %key, "transcription complete");
                self.notifier
                    .notify(NoticeKind::Success, "Transcription complete");
            }
            Ok(None) => {
                self.notifier
                    .notify(NoticeKind::Failure, "Could not transcribe audio");
            }
            Err(Error::Cancelled) => {
                debug!(key = %key, "transcription cancelled");
            }
            Err(err) => {
                error!(key = %key, error = %err, "transcription failed");
                self.notifier
                    .notify(NoticeKind::Failure, &format!("Transcription failed: {err}"));
            }
        }

        self.jobs.remove(&key);
    }

    async fn pipeline(&mut self) -> Result<Option<String>> {
        let locator = self.locator.clone();
        let bytes = self
            .stage(JobStage::Fetching, self.fetcher.fetch(&locator))
            .await?;

        let pcm = self
            .stage(JobStage::Decoding, self.decoder.decode(bytes))
            .await?;

        let opts = self.opts.read().unwrap().clone();
        let model = self
            .stage(JobStage::ModelLoading, self.provider.get(&opts))
            .await?;

        self.recognize(model.as_ref(), &pcm).await
    }

    /// Run one pipeline stage, honoring cancellation before, during, and
    /// after the suspension.
    async fn stage<T>(&self, stage: JobStage, fut: impl Future<Output = Result<T>>) -> Result<T> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let out = tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Error::Cancelled),
            out = fut => out,
        }?;

        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        debug!(key = %self.key, stage = ?stage, "stage complete");
        Ok(out)
    }

    /// The `Recognizing` stage: feed PCM in fixed-size chunks, then consume
    /// the event stream until every submitted unit (including the finalize
    /// request) has been answered.
    async fn recognize(
        &mut self,
        model: &dyn RecognitionModel,
        pcm: &[f32],
    ) -> Result<Option<String>> {
        let (recognizer, mut events) = model.create_recognizer(TARGET_SAMPLE_RATE)?;
        let mut recognizer = RecognizerGuard::new(recognizer);

        let mut submitted = 0usize;
        for chunk in pcm.chunks(CHUNK_SAMPLES) {
            if self.token.is_cancelled() {
                return Err(Error::Cancelled);
            }
            recognizer.accept_chunk(chunk)?;
            submitted += 1;
        }

        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        recognizer.finalize()?;
        submitted += 1;

        // Completion is tracked as responses received vs. units submitted.
        // `>=` (rather than an exact match) plus dropping the event channel
        // at resolution means a duplicate engine event can never wedge the
        // job; at worst it resolves one event early.
        let mut transcript = Transcript::new();
        let mut responses = 0usize;
        while responses < submitted {
            let event = tokio::select! {
                biased;
                _ = self.token.cancelled() => return Err(Error::Cancelled),
                event = events.recv() => event,
            };

            match event {
                Some(RecognizerEvent::FinalSegment(text)) => {
                    responses += 1;
                    if !text.is_empty() {
                        transcript.push_final(text);
                        transcript.clear_partial();
                        let rendered = transcript.rendered_text();
                        self.publish_update(&rendered);
                    }
                }
                Some(RecognizerEvent::Partial(text)) => {
                    responses += 1;
                    if !text.is_empty() {
                        transcript.set_partial(text);
                        let rendered = transcript.rendered_text();
                        self.publish_update(&rendered);
                    }
                }
                Some(RecognizerEvent::Error(message)) => {
                    return Err(Error::Recognition(message));
                }
                None => {
                    return Err(Error::Recognition(
                        "recognizer event stream ended early".to_owned(),
                    ));
                }
            }
        }

        recognizer.release();

        let text = transcript.finalized_text();
        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    /// Publish the running text for this key.
    ///
    /// Empty text is never published, nothing is published after
    /// cancellation, and a byte-identical repeat of the previous publish is
    /// suppressed (the authoritative final text usually matches the last
    /// preview exactly).
    fn publish_update(&mut self, text: &str) {
        if text.is_empty() || self.token.is_cancelled() {
            return;
        }
        if self.last_published.as_deref() == Some(text) {
            return;
        }
        self.listeners.publish(&self.key, Some(text));
        self.last_published = Some(text.to_owned());
    }
}

/// Release-on-drop wrapper for the engine-side recognizer resource.
///
/// The recognizer must be released on every exit path, and released exactly
/// once. Backing the handle with an `Option` makes explicit release and the
/// drop fallback share one take-and-release.
struct RecognizerGuard {
    inner: Option<Box<dyn Recognizer>>,
}

impl RecognizerGuard {
    fn new(recognizer: Box<dyn Recognizer>) -> Self {
        Self {
            inner: Some(recognizer),
        }
    }

    fn accept_chunk(&mut self, samples: &[f32]) -> Result<()> {
        match self.inner.as_mut() {
            Some(recognizer) => recognizer.accept_chunk(samples),
            None => Err(Error::Recognition(
                "recognizer used after release".to_owned(),
            )),
        }
    }

    fn finalize(&mut self) -> Result<()> {
        match self.inner.as_mut() {
            Some(recognizer) => recognizer.finalize(),
            None => Err(Error::Recognition(
                "recognizer used after release".to_owned(),
            )),
        }
    }

    fn release(&mut self) {
        if let Some(mut recognizer) = self.inner.take() {
            recognizer.release();
        }
    }
}

impl Drop for RecognizerGuard {
    fn drop(&mut self) {
        self.release();
    }
}
