//! Cover Art Archive front-image probes.

use anyhow::Context;
use std::time::Duration;
use tracing::debug;

/// Front cover availability checks, one release at a time.
#[allow(async_fn_in_trait)]
pub trait CoverArtSource {
    /// Canonical URL of the 500px front image for a release.
    fn front_url(&self, release_id: &str) -> String;

    /// Whether the archive actually has a front image for the release.
    async fn probe_front(&self, release_id: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct CoverArtClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl CoverArtClient {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .context("build coverart http client")?,
            base_url: base_url.into(),
            timeout,
        })
    }
}

impl CoverArtSource for CoverArtClient {
    fn front_url(&self, release_id: &str) -> String {
        format!("{}/release/{}/front-500.jpg", self.base_url, release_id)
    }

    async fn probe_front(&self, release_id: &str) -> bool {
        let url = self.front_url(release_id);
        match self
            .client
            .head(&url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!("cover art probe failed for {release_id}: {err}");
                false
            }
        }
    }
}
