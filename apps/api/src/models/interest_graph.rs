//! Interest graph document
//!
//! Compact per-user bias document derived from recent interactions: top and
//! avoid maps over artists and genres, scores normalized so the maximum is
//! 1 (or all zero when the input had no positive mass). Stored as JSONB and
//! versioned by the store on every upsert.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version of the document format
pub const GRAPH_SCHEMA_VERSION: u32 = 1;

/// Tag identifying the generator that produced a document
pub const GRAPH_GENERATOR_HEURISTIC: &str = "heuristic";

/// Per-user interest graph document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestGraph {
    /// Document schema version
    pub version: u32,

    /// Generator tag ("heuristic" today)
    pub generated_by: String,

    /// Interaction window the document was derived from
    pub window_days: u32,

    /// Artists the user gravitates toward, score in [0, 1]
    pub top_artists: BTreeMap<String, f64>,

    /// Genres the user gravitates toward, score in [0, 1]
    pub top_genres: BTreeMap<String, f64>,

    /// Artists with net-negative signal, score in [0, 1]
    pub avoid_artists: BTreeMap<String, f64>,

    /// Genres with net-negative signal, score in [0, 1]
    pub avoid_genres: BTreeMap<String, f64>,

    /// When the document was generated
    pub updated_at: DateTime<Utc>,
}

impl InterestGraph {
    /// Whether a track by `artist` in `genre` crosses the avoid threshold
    /// on either axis.
    pub fn is_avoided(&self, artist: &str, genre: &str, threshold: f64) -> bool {
        self.avoid_artists
            .get(artist)
            .is_some_and(|score| *score >= threshold)
            || self
                .avoid_genres
                .get(genre)
                .is_some_and(|score| *score >= threshold)
    }
}
