//! Track model for Cadence
//!
//! This module contains the database model for tracks with their audio
//! feature bag. Tracks are created by ingestion and immutable to the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Audio features attached to a track
///
/// All fields are optional; ingestion populates what it can. Continuous
/// features live in [0, 1] except tempo (BPM) and loudness (dB).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFeatures {
    /// Energy level (0.0 - 1.0)
    pub energy: Option<f64>,
    /// Valence/happiness (0.0 - 1.0)
    pub valence: Option<f64>,
    /// Danceability (0.0 - 1.0)
    pub danceability: Option<f64>,
    /// Tempo in beats per minute
    pub tempo: Option<f64>,
    /// Loudness in dB
    pub loudness: Option<f64>,
    /// Speechiness (0.0 - 1.0)
    pub speechiness: Option<f64>,
    /// Acousticness (0.0 - 1.0)
    pub acousticness: Option<f64>,
    /// Instrumentalness (0.0 - 1.0)
    pub instrumentalness: Option<f64>,
    /// Liveness (0.0 - 1.0)
    pub liveness: Option<f64>,
    /// Pitch class (0-11)
    pub key: Option<i32>,
    /// Modality (0 = minor, 1 = major)
    pub mode: Option<i32>,
    /// Time signature (beats per bar)
    pub time_signature: Option<i32>,
}

/// Track record from the tracks table
///
/// The 256-d embedding column is deliberately not part of this struct;
/// candidate queries order by it server-side and never ship it back.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Unique track identifier
    pub id: Uuid,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Genre tag
    pub genre: String,

    /// Duration in seconds
    pub duration_seconds: i32,

    /// Canonical URL on the host platform
    pub external_url: String,

    /// Short preview clip URL
    pub preview_url: Option<String>,

    /// Extracted audio features (energy, valence, etc.)
    #[sqlx(json(nullable))]
    pub audio_features: Option<AudioFeatures>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Track {
    /// Returns a formatted duration string (e.g., "3:45")
    pub fn formatted_duration(&self) -> String {
        let minutes = self.duration_seconds / 60;
        let seconds = self.duration_seconds % 60;
        format!("{}:{:02}", minutes, seconds)
    }
}
