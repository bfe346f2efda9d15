//! Default HTTP audio fetcher.
//!
//! Voice attachments are addressed by URL, so the default fetcher is a thin
//! `reqwest` wrapper. Hosts running in a sandboxed front-end can substitute
//! their own [`AudioFetcher`] that proxies through a privileged process; the
//! job pipeline only sees the trait.

use async_trait::async_trait;

use crate::engine::AudioFetcher;
use crate::error::{Error, Result};

/// Fetches audio bytes over HTTP(S).
#[derive(Debug, Clone, Default)]
pub struct HttpAudioFetcher {
    client: reqwest::Client,
}

impl HttpAudioFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fetcher on top of an existing client (connection pools,
    /// proxies, and timeouts come along with it).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AudioFetcher for HttpAudioFetcher {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|err| Error::Fetch(format!("request to '{locator}' failed: {err}")))?;

        // Non-2xx responses must stay distinguishable as HTTP failures.
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("HTTP error: {status} for '{locator}'")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| Error::Fetch(format!("failed reading response body: {err}")))?;

        Ok(bytes.to_vec())
    }
}
