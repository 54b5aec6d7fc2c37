//! Metadata resolution: MusicBrainz recording search plus Cover Art Archive
//! probes, degrading to seed-derived metadata when either is unavailable.

pub mod coverart;
pub mod musicbrainz;

pub use coverart::{CoverArtClient, CoverArtSource};
pub use musicbrainz::{MbClient, Recording, RecordingSearch};

use crate::track::{TrackMetadata, TrackSeed};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Where the metadata came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataSource {
    #[serde(rename = "musicbrainz")]
    MusicBrainz,
    #[serde(rename = "fallback")]
    Fallback,
    /// Request-processing failure. Upstream outages degrade to `Fallback`
    /// with a diagnostic instead.
    #[serde(rename = "error")]
    Error,
}

impl MetadataSource {
    pub fn as_str(self) -> &'static str {
        match self {
            MetadataSource::MusicBrainz => "musicbrainz",
            MetadataSource::Fallback => "fallback",
            MetadataSource::Error => "error",
        }
    }
}

/// The outcome of one metadata resolution. Always carries usable metadata;
/// the source and diagnostic say how much of it is real.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataOutcome {
    pub metadata: TrackMetadata,
    pub source: MetadataSource,
    /// Release whose cover art probe succeeded, if any.
    pub release_id: Option<String>,
    /// Human-readable note for the no-match case.
    pub message: Option<String>,
    /// Captured error text when the search itself failed.
    pub diagnostic: Option<String>,
}

impl MetadataOutcome {
    fn fallback(seed: &TrackSeed, message: Option<String>, diagnostic: Option<String>) -> Self {
        Self {
            metadata: TrackMetadata::from_seed(seed),
            source: MetadataSource::Fallback,
            release_id: None,
            message,
            diagnostic,
        }
    }
}

/// Resolve metadata for a seed. Searches MusicBrainz, adopts the first
/// recording's fields over the seed baseline, then probes its releases in
/// order until one has front cover art. Total: search failure or an empty
/// result degrades to seed-derived metadata.
pub async fn resolve<S, C>(search: &S, art: &C, seed: &TrackSeed) -> MetadataOutcome
where
    S: RecordingSearch,
    C: CoverArtSource,
{
    let recordings = match search.search(&seed.title, &seed.artist).await {
        Ok(recordings) => recordings,
        Err(e) => {
            warn!("musicbrainz search failed: {e:#}");
            return MetadataOutcome::fallback(
                seed,
                None,
                Some(format!("musicbrainz unavailable: {e:#}")),
            );
        }
    };

    let Some(recording) = recordings.first() else {
        debug!("no musicbrainz match for {} / {}", seed.title, seed.artist);
        return MetadataOutcome::fallback(
            seed,
            Some("no matching recording found".to_string()),
            None,
        );
    };

    let mut metadata = baseline(seed, recording);
    let mut release_id = None;

    for release in &recording.releases {
        if art.probe_front(&release.id).await {
            metadata.album = release.title.clone();
            metadata.cover_art_url = Some(art.front_url(&release.id));
            if let Some(date) = &release.date {
                metadata.release_date = Some(date.clone());
            }
            release_id = Some(release.id.clone());
            break;
        }
    }

    MetadataOutcome {
        metadata,
        source: MetadataSource::MusicBrainz,
        release_id,
        message: None,
        diagnostic: None,
    }
}

/// Merge the first recording over the seed baseline. Seed fields are only
/// replaced when the recording actually has a value, never cleared.
fn baseline(seed: &TrackSeed, recording: &Recording) -> TrackMetadata {
    let mut metadata = TrackMetadata::from_seed(seed);

    if !recording.title.trim().is_empty() {
        metadata.title = recording.title.clone();
    }
    if let Some(credit) = recording.artist_credit.first()
        && !credit.name.trim().is_empty()
    {
        metadata.artist = credit.name.clone();
    }
    if let Some(length_ms) = recording.length {
        metadata.duration_secs = Some(length_ms as f64 / 1000.0);
    }
    if let Some(release) = recording.releases.first() {
        metadata.album = release.title.clone();
        if let Some(date) = &release.date {
            metadata.release_date = Some(date.clone());
        }
    }
    metadata.musicbrainz_id = Some(recording.id.clone());

    metadata
}
