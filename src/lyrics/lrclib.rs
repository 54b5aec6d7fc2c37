//! LRCLIB API client.
//!
//! LRCLIB is a free lyrics API serving both synced (LRC format) and plain
//! lyrics. API documentation: https://lrclib.net/docs

use crate::lyrics::{LyricsProvider, RawLine, RawLyrics};
use crate::track::TrackSeed;
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

/// LRCLIB record for one track.
#[derive(Debug, Deserialize, Clone)]
pub struct LrclibResponse {
    #[serde(default)]
    instrumental: bool,
    #[serde(rename = "plainLyrics")]
    pub plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    pub synced_lyrics: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LrclibClient {
    client: reqwest::Client,
    base_url: String,
}

impl LrclibClient {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .timeout(timeout)
                .build()
                .context("build lrclib http client")?,
            base_url: base_url.into(),
        })
    }

    /// Look a track up by seed: exact match first, then search.
    async fn fetch(&self, seed: &TrackSeed) -> anyhow::Result<Option<LrclibResponse>> {
        if let Some(lyrics) = self.get_exact(seed).await? {
            return Ok(Some(lyrics));
        }
        self.search(seed).await
    }

    async fn get_exact(&self, seed: &TrackSeed) -> anyhow::Result<Option<LrclibResponse>> {
        let mut url = format!(
            "{}/get?track_name={}&artist_name={}",
            self.base_url,
            urlencoding::encode(&seed.title),
            urlencoding::encode(&seed.artist)
        );

        if let Some(album) = &seed.album {
            url.push_str(&format!("&album_name={}", urlencoding::encode(album)));
        }

        if let Some(duration) = seed.duration_secs {
            url.push_str(&format!("&duration={}", duration.round() as u64));
        }

        let response = self.client.get(&url).send().await.context("lrclib get")?;

        if response.status().is_success() {
            let lyrics: LrclibResponse =
                response.json().await.context("parse lrclib get json")?;
            Ok(Some(lyrics))
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            anyhow::bail!("lrclib api error: {}", response.status());
        }
    }

    async fn search(&self, seed: &TrackSeed) -> anyhow::Result<Option<LrclibResponse>> {
        let query = format!("{} {}", seed.title, seed.artist);
        let url = format!("{}/search?q={}", self.base_url, urlencoding::encode(&query));

        let response = self.client.get(&url).send().await.context("lrclib search")?;

        if response.status().is_success() {
            let results: Vec<LrclibResponse> =
                response.json().await.context("parse lrclib search json")?;

            // Prefer the first result with synced lyrics, else any result.
            let best = results
                .iter()
                .find(|r| r.synced_lyrics.is_some())
                .or_else(|| results.first());

            Ok(best.cloned())
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            anyhow::bail!("lrclib search error: {}", response.status());
        }
    }
}

impl LyricsProvider for LrclibClient {
    async fn synced(&self, seed: &TrackSeed) -> anyhow::Result<Option<RawLyrics>> {
        let Some(response) = self.fetch(seed).await? else {
            return Ok(None);
        };
        if response.instrumental {
            return Ok(None);
        }
        let Some(raw) = response.synced_lyrics.filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };
        Ok(Some(quick_parse(&raw)))
    }

    async fn plain(&self, seed: &TrackSeed) -> anyhow::Result<Option<String>> {
        let Some(response) = self.fetch(seed).await? else {
            return Ok(None);
        };
        Ok(response.plain_lyrics.filter(|s| !s.trim().is_empty()))
    }
}

/// The provider-level line parse: a single leading [mm:ss.fff] tag per line,
/// 1-3 digit fractions, unparseable tags as time zero. Kept deliberately
/// shallow; the chain re-derives timing from `raw` whenever this comes back
/// degenerate.
fn quick_parse(raw: &str) -> RawLyrics {
    let mut lines = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (time_ms, text) = match split_leading_tag(line) {
            Some((ms, rest)) => (ms, rest),
            None => (0, line),
        };
        lines.push(RawLine {
            time_ms,
            text: text.trim().to_string(),
        });
    }
    RawLyrics {
        lines,
        raw: raw.to_string(),
    }
}

fn split_leading_tag(line: &str) -> Option<(u64, &str)> {
    let rest = line.strip_prefix('[')?;
    let close = rest.find(']')?;
    let (tag, text) = (&rest[..close], &rest[close + 1..]);

    let (mins, secs) = tag.split_once(':')?;
    let (secs, frac) = match secs.split_once('.') {
        Some((s, f)) => (s, f),
        None => (secs, ""),
    };

    let mins: u64 = mins.parse().ok()?;
    let secs: u64 = secs.parse().ok()?;
    // Fractions are right-padded to milliseconds, so ".5" is 500 ms.
    let millis: u64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<u64>().ok()? * 100,
        2 => frac.parse::<u64>().ok()? * 10,
        3 => frac.parse().ok()?,
        _ => return None,
    };

    let time_ms = mins
        .checked_mul(60_000)?
        .checked_add(secs.checked_mul(1000)?)?
        .checked_add(millis)?;
    Some((time_ms, text))
}
