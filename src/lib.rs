//! Track enrichment for audio players: metadata from MusicBrainz and the
//! Cover Art Archive, synced lyrics from LRCLIB, and the pure helpers a host
//! needs to drive a lyrics display (LRC parsing, timing synthesis, and the
//! playback sync cursor).
//!
//! The entry point is [`enrich::Enricher`]: build one per session from a
//! [`config::Config`], then call [`enrich::Enricher::resolve_metadata`] and
//! [`enrich::Enricher::resolve_lyrics`] per track. Both are total once their
//! input validates; provider failures degrade to seed-derived metadata or
//! placeholder lyrics instead of surfacing as errors.

pub mod config;
pub mod enrich;
pub mod lyrics;
pub mod metadata;
pub mod track;
