//! High-level API for managing transcription jobs.
//!
//! `Transcriber` is the single entry point consumers interact with. It owns
//! the shared registries (result cache, listener set, job registry, model
//! provider) and the collaborator implementations, and enforces the two
//! entry-point rules:
//!
//! - a cache hit republishes the cached text instead of starting a job, so
//!   `start` is idempotent for completed transcriptions
//! - a key with a job already in flight is a defined no-op (single-flight)
//!
//! All state is explicit and session-scoped: construct a `Transcriber` at
//! startup with empty registries, drop it at session end. Handles are cheap
//! to clone and share one underlying engine.

use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::cache::ResultCache;
use crate::decode::SymphoniaDecoder;
use crate::engine::{
    AudioDecoder, AudioFetcher, ModelLoader, NoticeKind, Notifier, TracingNotifier,
};
use crate::fetch::HttpAudioFetcher;
use crate::job::TranscriptionJob;
use crate::key::MessageId;
use crate::listeners::{ListenerRegistry, Subscription};
use crate::model::ModelProvider;
use crate::opts::Opts;
use crate::registry::JobRegistry;

struct Inner {
    cache: ResultCache,
    listeners: ListenerRegistry,
    jobs: JobRegistry,
    provider: Arc<ModelProvider>,
    fetcher: Arc<dyn AudioFetcher>,
    decoder: Arc<dyn AudioDecoder>,
    notifier: Arc<dyn Notifier>,
    opts: Arc<RwLock<Opts>>,
}

/// The transcription engine's public handle.
#[derive(Clone)]
pub struct Transcriber {
    inner: Arc<Inner>,
}

impl Transcriber {
    /// Start building a `Transcriber` around the given model loader.
    ///
    /// The loader is the one collaborator without a default implementation —
    /// it is bound to whichever recognition engine the host embeds.
    pub fn builder(loader: impl ModelLoader + 'static) -> TranscriberBuilder {
        TranscriberBuilder::new(Arc::new(loader))
    }

    /// Begin or reuse a transcription for `key`.
    ///
    /// Cached result → republished immediately, no job. Job already in
    /// flight → no-op. Otherwise a job is registered and spawned onto the
    /// current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime context.
    pub fn start(&self, key: &MessageId, locator: impl Into<String>) {
        if let Some(text) = self.inner.cache.get(key) {
            debug!(key = %key, "cache hit, republishing");
            self.inner.listeners.publish(key, Some(&text));
            return;
        }

        let Some(token) = self.inner.jobs.register(key) else {
            debug!(key = %key, "transcription already in flight, ignoring start");
            return;
        };

        self.inner
            .notifier
            .notify(NoticeKind::Progress, "Starting transcription...");

        let job = TranscriptionJob::new(
            key.clone(),
            locator.into(),
            token,
            self.inner.listeners.clone(),
            self.inner.jobs.clone(),
            Arc::clone(&self.inner.provider),
            Arc::clone(&self.inner.fetcher),
            Arc::clone(&self.inner.decoder),
            Arc::clone(&self.inner.notifier),
            Arc::clone(&self.inner.opts),
        );
        tokio::spawn(job.run());
    }

    /// Cancel the active job for `key`, if any, and dismiss its result.
    ///
    /// The clear event is published unconditionally — cache entry removed,
    /// one `(key, absent)` event to every listener — which makes dismissal
    /// and cancellation the same operation from the caller's perspective,
    /// and makes repeated calls emit a clear each time.
    pub fn cancel(&self, key: &MessageId) {
        if let Some(token) = self.inner.jobs.remove(key) {
            debug!(key = %key, "cancelling in-flight transcription");
            token.cancel();
        }
        self.inner.listeners.publish(key, None);
    }

    /// Observe transcription events for every key. The guard unsubscribes on
    /// drop.
    pub fn subscribe(
        &self,
        listener: impl Fn(&MessageId, Option<&str>) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.listeners.subscribe(listener)
    }

    /// Synchronous cache probe, for initial render.
    pub fn get_cached(&self, key: &MessageId) -> Option<String> {
        self.inner.cache.get(key)
    }

    /// Whether a job is currently in flight for `key`.
    pub fn is_active(&self, key: &MessageId) -> bool {
        self.inner.jobs.is_active(key)
    }

    /// Current options snapshot.
    pub fn opts(&self) -> Opts {
        self.inner.opts.read().unwrap().clone()
    }

    /// Replace the options. Model selection changes take effect on the next
    /// model acquisition; a load already in flight for the old source keeps
    /// running for the jobs that captured it.
    pub fn set_opts(&self, opts: Opts) {
        *self.inner.opts.write().unwrap() = opts;
    }
}

/// Builder for [`Transcriber`], choosing collaborators and initial options.
pub struct TranscriberBuilder {
    loader: Arc<dyn ModelLoader>,
    fetcher: Option<Arc<dyn AudioFetcher>>,
    decoder: Option<Arc<dyn AudioDecoder>>,
    notifier: Option<Arc<dyn Notifier>>,
    opts: Opts,
}

impl TranscriberBuilder {
    fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            fetcher: None,
            decoder: None,
            notifier: None,
            opts: Opts::default(),
        }
    }

    /// Replace the default HTTP fetcher (e.g. with a sandbox-proxied one).
    pub fn fetcher(mut self, fetcher: impl AudioFetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Replace the default Symphonia decoder.
    pub fn decoder(mut self, decoder: impl AudioDecoder + 'static) -> Self {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    /// Replace the default tracing-backed notifier with the host UI's.
    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Initial options (defaults to the small model).
    pub fn opts(mut self, opts: Opts) -> Self {
        self.opts = opts;
        self
    }

    pub fn build(self) -> Transcriber {
        let cache = ResultCache::new();
        let listeners = ListenerRegistry::new(cache.clone());

        Transcriber {
            inner: Arc::new(Inner {
                cache,
                listeners,
                jobs: JobRegistry::new(),
                provider: Arc::new(ModelProvider::new(self.loader)),
                fetcher: self
                    .fetcher
                    .unwrap_or_else(|| Arc::new(HttpAudioFetcher::new())),
                decoder: self
                    .decoder
                    .unwrap_or_else(|| Arc::new(SymphoniaDecoder::new())),
                notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
                opts: Arc::new(RwLock::new(self.opts)),
            }),
        }
    }
}
