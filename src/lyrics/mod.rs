//! Lyrics resolution: provider fallback chain, LRC parsing, timing
//! synthesis, and the playback sync cursor.
//!
//! Providers are unreliable third-party services with inconsistent schemas
//! (milliseconds vs seconds, synced/plain variants, parsers that emit
//! all-zero timestamps). The chain here degrades step by step and always
//! produces a usable result; failures ride along in the diagnostic field.

pub mod lrc;
pub mod lrclib;
pub mod sync;
pub mod synth;

pub use lrclib::LrclibClient;

use crate::track::TrackSeed;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A lyric fragment paired with the playback second at which it becomes
/// current. Empty text is a musical pause and must be kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedLine {
    pub time: f64,
    pub text: String,
}

/// Which step of the fallback chain produced the lines. Serialized labels
/// are the wire vocabulary hosts already know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LyricsSource {
    #[serde(rename = "lrclib")]
    PrimarySynced,
    #[serde(rename = "lrclib_plain")]
    PrimaryPlain,
    #[serde(rename = "lrclib_alt")]
    SecondarySynced,
    #[serde(rename = "lrclib_alt_plain")]
    SecondaryPlain,
    #[serde(rename = "fallback")]
    Generated,
    #[serde(rename = "not_found")]
    NotFound,
    #[serde(rename = "error")]
    Error,
}

impl LyricsSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LyricsSource::PrimarySynced => "lrclib",
            LyricsSource::PrimaryPlain => "lrclib_plain",
            LyricsSource::SecondarySynced => "lrclib_alt",
            LyricsSource::SecondaryPlain => "lrclib_alt_plain",
            LyricsSource::Generated => "fallback",
            LyricsSource::NotFound => "not_found",
            LyricsSource::Error => "error",
        }
    }

    pub fn is_synced(self) -> bool {
        matches!(
            self,
            LyricsSource::PrimarySynced | LyricsSource::SecondarySynced
        )
    }
}

/// The outcome of one run of the chain. Immutable; a new fetch replaces it
/// wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LyricsResult {
    pub lines: Vec<TimedLine>,
    pub source: LyricsSource,
    /// Captured error text from failed steps, for observability.
    pub diagnostic: Option<String>,
}

/// A provider's native answer: its own structured parse (millisecond times)
/// plus the raw text behind it, so timing can be re-derived when the
/// structured parse is degenerate.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLyrics {
    pub lines: Vec<RawLine>,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawLine {
    pub time_ms: u64,
    pub text: String,
}

/// Capability interface over an external lyrics service. Implementations
/// must never be trusted to parse correctly; the chain validates.
#[allow(async_fn_in_trait)]
pub trait LyricsProvider {
    async fn synced(&self, seed: &TrackSeed) -> anyhow::Result<Option<RawLyrics>>;
    async fn plain(&self, seed: &TrackSeed) -> anyhow::Result<Option<String>>;
}

/// Run the fallback chain for a seed: each provider's synced query, then its
/// plain query, then the deterministic generated placeholder. Steps run
/// strictly in order and every failure is caught at its own boundary; this
/// function is total.
pub async fn resolve<P: LyricsProvider>(
    primary: &P,
    secondary: Option<&P>,
    seed: &TrackSeed,
    default_duration_secs: f64,
) -> LyricsResult {
    let mut diagnostics: Vec<String> = Vec::new();

    let mut ranks = vec![(primary, LyricsSource::PrimarySynced, LyricsSource::PrimaryPlain)];
    if let Some(p) = secondary {
        ranks.push((p, LyricsSource::SecondarySynced, LyricsSource::SecondaryPlain));
    }

    for (provider, synced_source, plain_source) in ranks {
        match provider.synced(seed).await {
            Ok(Some(raw)) if !raw.lines.is_empty() => {
                return LyricsResult {
                    lines: normalize_synced(&raw),
                    source: synced_source,
                    diagnostic: join_diagnostics(diagnostics),
                };
            }
            Ok(_) => {}
            Err(e) => {
                warn!("{} failed: {e:#}", synced_source.as_str());
                diagnostics.push(format!("{} unavailable: {e:#}", synced_source.as_str()));
            }
        }

        match provider.plain(seed).await {
            Ok(Some(text)) => {
                let duration = seed.duration_secs.unwrap_or(default_duration_secs);
                let lines = synth::synthesize(&text, duration);
                if !lines.is_empty() {
                    return LyricsResult {
                        lines,
                        source: plain_source,
                        diagnostic: join_diagnostics(diagnostics),
                    };
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("{} failed: {e:#}", plain_source.as_str());
                diagnostics.push(format!("{} unavailable: {e:#}", plain_source.as_str()));
            }
        }
    }

    LyricsResult {
        lines: generated_fallback(&seed.title, &seed.artist),
        source: LyricsSource::Generated,
        diagnostic: join_diagnostics(diagnostics),
    }
}

/// Map provider milliseconds onto seconds. If every structured time is zero
/// (a known upstream parser defect) the raw LRC text is re-parsed instead of
/// accepting the degenerate result as synced.
fn normalize_synced(raw: &RawLyrics) -> Vec<TimedLine> {
    if raw.lines.iter().all(|l| l.time_ms == 0) {
        let reparsed = lrc::parse(&raw.raw);
        if !reparsed.is_empty() {
            return reparsed;
        }
    }

    raw.lines
        .iter()
        .map(|l| TimedLine {
            time: l.time_ms as f64 / 1000.0,
            text: l.text.clone(),
        })
        .collect()
}

fn join_diagnostics(diagnostics: Vec<String>) -> Option<String> {
    if diagnostics.is_empty() {
        None
    } else {
        Some(diagnostics.join("; "))
    }
}

/// Fixed placeholder shown when no real lyrics are obtainable. Deterministic
/// so repeated fetches agree byte for byte.
fn generated_fallback(title: &str, artist: &str) -> Vec<TimedLine> {
    let line = |time: f64, text: String| TimedLine { time, text };
    vec![
        line(0.0, format!("\u{266a} {title} \u{266a}")),
        line(2.0, format!("by {artist}")),
        line(5.0, String::new()),
        line(8.0, "Music fills the silence".into()),
        line(12.0, "When words are not enough".into()),
        line(16.0, "Let the rhythm guide you".into()),
        line(20.0, "Through the highs and lows".into()),
        line(24.0, String::new()),
        line(26.0, "Every note tells a story".into()),
        line(30.0, "Every beat has meaning".into()),
        line(34.0, "Listen with your heart".into()),
        line(38.0, "And feel the emotion".into()),
        line(42.0, String::new()),
        line(45.0, "\u{1f3b5} Enjoy the music \u{1f3b5}".into()),
    ]
}
