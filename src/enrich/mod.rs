//! Enrichment orchestration.
//!
//! Owns the per-session state around the two resolution chains: the
//! metadata deduplication cache, in-flight counters for the host's loading
//! indicators, and a ticket scheme that keeps a late slow response from
//! overwriting a newer one.

use crate::config::Config;
use crate::lyrics::{self, LrclibClient, LyricsProvider, LyricsSource, TimedLine};
use crate::metadata::{self, CoverArtClient, CoverArtSource, MbClient, MetadataSource, RecordingSearch};
use crate::track::{TrackMetadata, TrackSeed};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Wire shape of a lyrics resolution, as hosts consume it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LyricsResponse {
    pub lyrics: Vec<TimedLine>,
    pub source: LyricsSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LyricsResponse {
    fn from_result(result: lyrics::LyricsResult) -> Self {
        let message = if result.source == LyricsSource::Generated && result.diagnostic.is_none() {
            Some("No lyrics available for this track".to_string())
        } else {
            None
        };
        Self {
            lyrics: result.lines,
            source: result.source,
            message,
            error: result.diagnostic,
        }
    }
}

/// Wire shape of a metadata resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataResponse {
    pub metadata: TrackMetadata,
    pub source: MetadataSource,
    #[serde(rename = "releaseId", skip_serializing_if = "Option::is_none")]
    pub release_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MetadataResponse {
    fn from_outcome(outcome: metadata::MetadataOutcome) -> Self {
        Self {
            metadata: outcome.metadata,
            source: outcome.source,
            release_id: outcome.release_id,
            message: outcome.message,
            error: outcome.diagnostic,
        }
    }
}

/// Decrements an in-flight counter when dropped, so every exit path out of a
/// resolution clears the loading state.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn begin(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mutable session state, separate from the clients so the orchestrator can
/// stay generic over them.
struct Session {
    metadata_cache: Mutex<HashMap<String, MetadataResponse>>,
    lyrics_in_flight: Arc<AtomicUsize>,
    metadata_in_flight: Arc<AtomicUsize>,
    lyrics_ticket: AtomicU64,
    metadata_ticket: AtomicU64,
    latest_lyrics: Mutex<Option<(u64, LyricsResponse)>>,
    latest_metadata: Mutex<Option<(u64, MetadataResponse)>>,
}

impl Session {
    fn new() -> Self {
        Self {
            metadata_cache: Mutex::new(HashMap::new()),
            lyrics_in_flight: Arc::new(AtomicUsize::new(0)),
            metadata_in_flight: Arc::new(AtomicUsize::new(0)),
            lyrics_ticket: AtomicU64::new(0),
            metadata_ticket: AtomicU64::new(0),
            latest_lyrics: Mutex::new(None),
            latest_metadata: Mutex::new(None),
        }
    }
}

pub struct Enricher<P, S, C> {
    lyrics_primary: P,
    lyrics_secondary: Option<P>,
    search: S,
    art: C,
    default_duration_secs: f64,
    session: Session,
}

impl Enricher<LrclibClient, MbClient, CoverArtClient> {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let user_agent = &config.providers.user_agent;
        let lyrics_primary = LrclibClient::new(
            &config.providers.lrclib_url,
            user_agent,
            Duration::from_secs(config.enrich.lyrics_timeout_secs),
        )?;
        let lyrics_secondary = config
            .providers
            .lrclib_fallback_url
            .as_ref()
            .map(|url| {
                LrclibClient::new(
                    url,
                    user_agent,
                    Duration::from_secs(config.enrich.lyrics_timeout_secs),
                )
            })
            .transpose()?;
        let search = MbClient::new(
            &config.providers.musicbrainz_url,
            user_agent,
            Duration::from_secs(config.enrich.search_timeout_secs),
        )?;
        let art = CoverArtClient::new(
            &config.providers.coverart_url,
            user_agent,
            Duration::from_secs(config.enrich.art_probe_timeout_secs),
        )?;

        Ok(Self::with_components(
            lyrics_primary,
            lyrics_secondary,
            search,
            art,
            config.enrich.default_duration_secs,
        ))
    }
}

impl<P, S, C> Enricher<P, S, C>
where
    P: LyricsProvider,
    S: RecordingSearch,
    C: CoverArtSource,
{
    pub fn with_components(
        lyrics_primary: P,
        lyrics_secondary: Option<P>,
        search: S,
        art: C,
        default_duration_secs: f64,
    ) -> Self {
        Self {
            lyrics_primary,
            lyrics_secondary,
            search,
            art,
            default_duration_secs,
            session: Session::new(),
        }
    }

    /// Resolve metadata for a seed. Identical title+artist pairs hit the
    /// session cache and never re-query the network until invalidated.
    pub async fn resolve_metadata(&self, seed: &TrackSeed) -> anyhow::Result<MetadataResponse> {
        validate_seed(seed)?;

        let key = seed.fetch_key();
        if let Some(cached) = self.session.metadata_cache.lock().await.get(&key) {
            debug!("metadata cache hit for {key}");
            return Ok(cached.clone());
        }

        let ticket = self.session.metadata_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight::begin(&self.session.metadata_in_flight);

        let outcome = metadata::resolve(&self.search, &self.art, seed).await;
        let response = MetadataResponse::from_outcome(outcome);

        self.session
            .metadata_cache
            .lock()
            .await
            .insert(key, response.clone());
        commit_latest(&self.session.latest_metadata, ticket, &response).await;

        Ok(response)
    }

    /// Resolve lyrics for a seed. Lyrics are never cached; each call runs
    /// the full fallback chain.
    pub async fn resolve_lyrics(&self, seed: &TrackSeed) -> anyhow::Result<LyricsResponse> {
        validate_seed(seed)?;

        let ticket = self.session.lyrics_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight::begin(&self.session.lyrics_in_flight);

        let result = lyrics::resolve(
            &self.lyrics_primary,
            self.lyrics_secondary.as_ref(),
            seed,
            self.default_duration_secs,
        )
        .await;
        let response = LyricsResponse::from_result(result);

        commit_latest(&self.session.latest_lyrics, ticket, &response).await;

        Ok(response)
    }

    /// Whether metadata for this seed is already cached.
    pub async fn has_metadata(&self, seed: &TrackSeed) -> bool {
        self.session
            .metadata_cache
            .lock()
            .await
            .contains_key(&seed.fetch_key())
    }

    /// Drop the cached metadata for this seed so the next resolve re-queries.
    pub async fn invalidate_metadata(&self, seed: &TrackSeed) {
        self.session
            .metadata_cache
            .lock()
            .await
            .remove(&seed.fetch_key());
    }

    pub fn lyrics_loading(&self) -> bool {
        self.session.lyrics_in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn metadata_loading(&self) -> bool {
        self.session.metadata_in_flight.load(Ordering::SeqCst) > 0
    }

    /// The most recently issued lyrics response, by request order rather
    /// than completion order.
    pub async fn latest_lyrics(&self) -> Option<LyricsResponse> {
        self.session
            .latest_lyrics
            .lock()
            .await
            .as_ref()
            .map(|(_, r)| r.clone())
    }

    pub async fn latest_metadata(&self) -> Option<MetadataResponse> {
        self.session
            .latest_metadata
            .lock()
            .await
            .as_ref()
            .map(|(_, r)| r.clone())
    }
}

/// Store the response only if no later request has already committed.
async fn commit_latest<T: Clone>(
    slot: &Mutex<Option<(u64, T)>>,
    ticket: u64,
    response: &T,
) {
    let mut slot = slot.lock().await;
    let is_newer = slot.as_ref().is_none_or(|(committed, _)| ticket > *committed);
    if is_newer {
        *slot = Some((ticket, response.clone()));
    } else {
        debug!("dropping stale response for ticket {ticket}");
    }
}

fn validate_seed(seed: &TrackSeed) -> anyhow::Result<()> {
    if seed.title.trim().is_empty() || seed.artist.trim().is_empty() {
        anyhow::bail!("title and artist are required");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::{RawLine, RawLyrics};
    use crate::metadata::musicbrainz::Recording;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::{mpsc, oneshot};

    struct FakeLyrics {
        synced: Option<RawLyrics>,
        calls: AtomicUsize,
    }

    impl FakeLyrics {
        fn new(synced: Option<RawLyrics>) -> Self {
            Self {
                synced,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl LyricsProvider for FakeLyrics {
        async fn synced(&self, _seed: &TrackSeed) -> anyhow::Result<Option<RawLyrics>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.synced.clone())
        }

        async fn plain(&self, _seed: &TrackSeed) -> anyhow::Result<Option<String>> {
            Ok(None)
        }
    }

    struct FakeSearch {
        recordings: Vec<Recording>,
        calls: AtomicUsize,
    }

    impl FakeSearch {
        fn empty() -> Self {
            Self {
                recordings: Vec::new(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl RecordingSearch for FakeSearch {
        async fn search(&self, _title: &str, _artist: &str) -> anyhow::Result<Vec<Recording>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.recordings.clone())
        }
    }

    struct NoArt;

    impl CoverArtSource for NoArt {
        fn front_url(&self, release_id: &str) -> String {
            format!("https://art.test/{release_id}")
        }

        async fn probe_front(&self, _release_id: &str) -> bool {
            false
        }
    }

    fn synced_lines(text: &str) -> RawLyrics {
        RawLyrics {
            lines: vec![RawLine {
                time_ms: 1000,
                text: text.to_string(),
            }],
            raw: String::new(),
        }
    }

    fn enricher(
        lyrics: FakeLyrics,
        search: FakeSearch,
    ) -> Enricher<FakeLyrics, FakeSearch, NoArt> {
        Enricher::with_components(lyrics, None, search, NoArt, 180.0)
    }

    #[tokio::test]
    async fn blank_seed_fields_are_rejected() {
        let e = enricher(FakeLyrics::new(None), FakeSearch::empty());

        let seed = TrackSeed::new("  ", "Artist");
        assert!(e.resolve_metadata(&seed).await.is_err());
        assert!(e.resolve_lyrics(&seed).await.is_err());
        assert!(!e.metadata_loading());
        assert!(!e.lyrics_loading());
    }

    #[tokio::test]
    async fn metadata_is_deduplicated_until_invalidated() {
        let e = enricher(FakeLyrics::new(None), FakeSearch::empty());
        let seed = TrackSeed::new("Song", "Artist");

        let first = e.resolve_metadata(&seed).await.unwrap();
        let second = e.resolve_metadata(&seed).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(e.search.calls.load(Ordering::SeqCst), 1);
        assert!(e.has_metadata(&seed).await);

        e.invalidate_metadata(&seed).await;
        assert!(!e.has_metadata(&seed).await);
        e.resolve_metadata(&seed).await.unwrap();
        assert_eq!(e.search.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn distinct_seeds_do_not_share_cache_entries() {
        let e = enricher(FakeLyrics::new(None), FakeSearch::empty());

        e.resolve_metadata(&TrackSeed::new("Song", "Artist"))
            .await
            .unwrap();
        e.resolve_metadata(&TrackSeed::new("Song", "Other Artist"))
            .await
            .unwrap();
        assert_eq!(e.search.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn lyrics_are_reissued_every_time() {
        let e = enricher(
            FakeLyrics::new(Some(synced_lines("hello"))),
            FakeSearch::empty(),
        );
        let seed = TrackSeed::new("Song", "Artist");

        e.resolve_lyrics(&seed).await.unwrap();
        e.resolve_lyrics(&seed).await.unwrap();
        assert_eq!(e.lyrics_primary.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn generated_fallback_carries_the_no_lyrics_message() {
        let e = enricher(FakeLyrics::new(None), FakeSearch::empty());

        let response = e
            .resolve_lyrics(&TrackSeed::new("Song", "Artist"))
            .await
            .unwrap();
        assert_eq!(response.source, LyricsSource::Generated);
        assert_eq!(
            response.message.as_deref(),
            Some("No lyrics available for this track")
        );
        assert!(response.error.is_none());
    }

    /// Provider whose calls block on externally controlled gates, so tests
    /// can finish requests out of order.
    struct GatedLyrics {
        gates: StdMutex<VecDeque<Option<oneshot::Receiver<()>>>>,
        results: StdMutex<VecDeque<RawLyrics>>,
        started: mpsc::UnboundedSender<()>,
    }

    impl LyricsProvider for GatedLyrics {
        async fn synced(&self, _seed: &TrackSeed) -> anyhow::Result<Option<RawLyrics>> {
            let gate = self.gates.lock().unwrap().pop_front().flatten();
            let result = self.results.lock().unwrap().pop_front();
            let _ = self.started.send(());
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(result)
        }

        async fn plain(&self, _seed: &TrackSeed) -> anyhow::Result<Option<String>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn slow_older_lyrics_response_never_overwrites_newer_one() {
        let (gate_tx, gate_rx) = oneshot::channel();
        let (started_tx, mut started_rx) = mpsc::unbounded_channel();
        let provider = GatedLyrics {
            gates: StdMutex::new(VecDeque::from([Some(gate_rx), None])),
            results: StdMutex::new(VecDeque::from([
                synced_lines("old"),
                synced_lines("new"),
            ])),
            started: started_tx,
        };
        let e = Arc::new(Enricher::with_components(
            provider,
            None,
            FakeSearch::empty(),
            NoArt,
            180.0,
        ));
        let seed = TrackSeed::new("Song", "Artist");

        let first = tokio::spawn({
            let e = Arc::clone(&e);
            let seed = seed.clone();
            async move { e.resolve_lyrics(&seed).await.unwrap() }
        });
        started_rx.recv().await.unwrap();
        assert!(e.lyrics_loading());

        // Second request starts after the first and completes immediately.
        let second = e.resolve_lyrics(&seed).await.unwrap();
        assert_eq!(second.lyrics[0].text, "new");

        // Release the first request only now.
        gate_tx.send(()).unwrap();
        let stale = first.await.unwrap();
        assert_eq!(stale.lyrics[0].text, "old");

        // The session keeps the newer request's answer.
        let latest = e.latest_lyrics().await.unwrap();
        assert_eq!(latest.lyrics[0].text, "new");
        assert!(!e.lyrics_loading());
    }
}
