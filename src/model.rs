//! Lazy, deduplicated model loading.
//!
//! Loading a recognition model is the most expensive operation in the system
//! (it may download and unpack an archive). The provider memoizes a single
//! in-flight-or-completed load keyed by its source URL:
//!
//! - concurrent callers for the same source all await the same shared future
//!   and receive the same model instance,
//! - when the configured source changes, new callers start a fresh load and
//!   the stale one is abandoned silently — callers that already captured it
//!   still receive the old model,
//! - a failed load is forgotten so the next caller can retry.

use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::debug;

use crate::Result;
use crate::engine::{ModelLoader, RecognitionModel};
use crate::opts::Opts;

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<dyn RecognitionModel>>>>;

struct CurrentLoad {
    source: String,
    load: SharedLoad,
}

/// Memoizes one model load at a time, keyed by source URL.
pub struct ModelProvider {
    loader: Arc<dyn ModelLoader>,
    current: Mutex<Option<CurrentLoad>>,
}

impl ModelProvider {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            current: Mutex::new(None),
        }
    }

    /// Obtain the model for the currently-configured source, loading it if
    /// necessary.
    ///
    /// Fails with [`crate::Error::ModelLoad`] when no source is configured or
    /// the load itself fails; the failure reaches only callers awaiting this
    /// source, never unrelated callers of a different source.
    pub async fn get(&self, opts: &Opts) -> Result<Arc<dyn RecognitionModel>> {
        let source = opts.resolve_model_url()?.to_owned();

        let load = {
            let mut current = self.current.lock().unwrap();
            match current.as_ref() {
                Some(cur) if cur.source == source => cur.load.clone(),
                _ => {
                    debug!(source = %source, "starting model load");
                    let loader = Arc::clone(&self.loader);
                    let url = source.clone();
                    let load: SharedLoad = async move {
                        loader.load(&url).await.map(Arc::from)
                    }
                    .boxed()
                    .shared();
                    *current = Some(CurrentLoad {
                        source: source.clone(),
                        load: load.clone(),
                    });
                    load
                }
            }
        };

        let result = load.await;

        if result.is_err() {
            // Forget the failed load so a later call can retry, but only if
            // it is still the remembered load for this source (a newer load
            // for a different source must not be discarded).
            let mut current = self.current.lock().unwrap();
            if current.as_ref().is_some_and(|cur| cur.source == source) {
                *current = None;
            }
        }

        result
    }
}
