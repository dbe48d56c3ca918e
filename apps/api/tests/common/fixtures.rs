//! Test fixtures for API integration tests
//!
//! Provides reusable track and context builders.

#![allow(dead_code)]

use chrono::Utc;
use uuid::Uuid;

use cadence_api::models::{Activity, AudioFeatures, ListeningContext, Mood, Track};

/// Build a track with the given title, artist and genre
pub fn track(title: &str, artist: &str, genre: &str) -> Track {
    Track {
        id: Uuid::new_v4(),
        title: title.to_string(),
        artist: artist.to_string(),
        genre: genre.to_string(),
        duration_seconds: 210,
        external_url: format!("https://music.example.com/tracks/{}", title),
        preview_url: None,
        audio_features: None,
        created_at: Utc::now(),
    }
}

/// Build a track with an audio feature bag
pub fn track_with_features(title: &str, artist: &str, features: AudioFeatures) -> Track {
    let mut t = track(title, artist, "Pop");
    t.audio_features = Some(features);
    t
}

/// Feature bag with only energy set
pub fn energy(value: f64) -> AudioFeatures {
    AudioFeatures {
        energy: Some(value),
        ..Default::default()
    }
}

/// Feature bag with only valence set
pub fn valence(value: f64) -> AudioFeatures {
    AudioFeatures {
        valence: Some(value),
        ..Default::default()
    }
}

/// Context with only an activity
pub fn activity_context(activity: Activity) -> ListeningContext {
    ListeningContext {
        activity: Some(activity),
        ..Default::default()
    }
}

/// Context with only a mood
pub fn mood_context(mood: Mood) -> ListeningContext {
    ListeningContext {
        mood: Some(mood),
        ..Default::default()
    }
}
