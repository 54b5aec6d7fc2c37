//! MusicBrainz recording search.
//!
//! Web service documentation: https://musicbrainz.org/doc/MusicBrainz_API

use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Recording {
    pub id: String,
    pub title: String,
    /// Recording length in milliseconds.
    pub length: Option<u64>,
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<ArtistCredit>,
    #[serde(default)]
    pub releases: Vec<Release>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArtistCredit {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Release {
    pub id: String,
    pub title: String,
    pub date: Option<String>,
}

/// Recording lookup capability, split out so the resolution chain can be
/// exercised without the network.
#[allow(async_fn_in_trait)]
pub trait RecordingSearch {
    async fn search(&self, title: &str, artist: &str) -> anyhow::Result<Vec<Recording>>;
}

#[derive(Debug, Clone)]
pub struct MbClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl MbClient {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .context("build musicbrainz http client")?,
            base_url: base_url.into(),
            timeout,
        })
    }
}

impl RecordingSearch for MbClient {
    async fn search(&self, title: &str, artist: &str) -> anyhow::Result<Vec<Recording>> {
        let query = format!("recording:\"{title}\" AND artist:\"{artist}\"");
        let url = format!(
            "{}/recording/?query={}&fmt=json&inc=releases+artist-credits",
            self.base_url,
            urlencoding::encode(&query)
        );

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .context("musicbrainz search")?
            .error_for_status()
            .context("musicbrainz search status")?;

        let body: SearchResponse = response
            .json()
            .await
            .context("parse musicbrainz search json")?;
        Ok(body.recordings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_tolerates_sparse_recordings() {
        let json = r#"{
            "recordings": [
                {"id": "rec-1", "title": "Song"},
                {
                    "id": "rec-2",
                    "title": "Song",
                    "length": 215000,
                    "artist-credit": [{"name": "Artist"}],
                    "releases": [{"id": "rel-1", "title": "Album", "date": "2001-05-01"}]
                }
            ]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.recordings.len(), 2);
        assert!(parsed.recordings[0].releases.is_empty());
        assert_eq!(parsed.recordings[1].releases[0].id, "rel-1");
        assert_eq!(parsed.recordings[1].length, Some(215_000));
    }

    #[test]
    fn empty_body_yields_no_recordings() {
        let parsed: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.recordings.is_empty());
    }
}
