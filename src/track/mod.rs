//! Track models: the caller-supplied seed and the enriched metadata.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::path::Path;

/// What the caller knows about a track before enrichment. Created once per
/// file and never mutated; both resolution chains query by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSeed {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    /// Duration in seconds, if the host's player already knows it.
    pub duration_secs: Option<f64>,
}

impl TrackSeed {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration_secs: None,
        }
    }

    /// Derive a seed from a local file path.
    ///
    /// Filenames like "Artist - Title.mp3" split on the first " - "; the
    /// remainder (rejoined, so titles may themselves contain " - ") becomes
    /// the title. Anything else is treated as a bare title.
    pub fn from_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some((artist, title)) = stem.split_once(" - ") {
            let title = title.trim();
            let artist = artist.trim();
            if !title.is_empty() && !artist.is_empty() {
                return Self::new(title, artist);
            }
        }

        Self::new(stem.trim(), "Unknown Artist")
    }

    /// Deduplication key for metadata fetches: exact, case-sensitive
    /// title+artist concatenation.
    pub fn fetch_key(&self) -> String {
        format!("{}{}", self.title, self.artist)
    }
}

/// Enriched metadata. Fields fall back to the seed's values, so resolution
/// never removes information the caller already had.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    #[serde(rename = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(rename = "releaseDate", skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(rename = "coverArtUrl", skip_serializing_if = "Option::is_none")]
    pub cover_art_url: Option<String>,
    #[serde(rename = "musicbrainzId", skip_serializing_if = "Option::is_none")]
    pub musicbrainz_id: Option<String>,
}

impl TrackMetadata {
    /// Baseline metadata derived purely from the seed.
    pub fn from_seed(seed: &TrackSeed) -> Self {
        Self {
            title: seed.title.clone(),
            artist: seed.artist.clone(),
            album: seed
                .album
                .clone()
                .unwrap_or_else(|| "Unknown Album".to_string()),
            duration_secs: seed.duration_secs,
            release_date: None,
            cover_art_url: None,
            musicbrainz_id: None,
        }
    }
}

/// Stable identifier for a local file, used to key the external enrichment
/// cache. Hashes name + size + mtime so re-uploads of the same file agree.
pub fn track_id(path: &Path) -> anyhow::Result<String> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?;
    let mtime_secs = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut hasher = Sha1::new();
    hasher.update(format!("{name}{}{mtime_secs}", meta.len()).as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
