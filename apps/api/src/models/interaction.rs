//! Interaction model and listening context
//!
//! Interactions are the append-only event log driving taste state. The
//! listening context rides along both on events and on recommendation
//! requests; its canonical form doubles as the cache key fragment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;

/// Interaction event kind matching the PostgreSQL event_type enum
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "event_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Play,
    Skip,
    Like,
    Dislike,
    AddToPlaylist,
}

/// Mood reported with a request or interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mood {
    Calm,
    Happy,
    Sad,
    Energetic,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calm => "CALM",
            Self::Happy => "HAPPY",
            Self::Sad => "SAD",
            Self::Energetic => "ENERGETIC",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s.to_ascii_uppercase().as_str() {
            "CALM" => Ok(Self::Calm),
            "HAPPY" => Ok(Self::Happy),
            "SAD" => Ok(Self::Sad),
            "ENERGETIC" => Ok(Self::Energetic),
            other => Err(ApiError::validation(format!("unknown mood: {}", other))),
        }
    }
}

/// Activity reported with a request or interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Activity {
    Work,
    Exercise,
    Relax,
    Party,
}

impl Activity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "WORK",
            Self::Exercise => "EXERCISE",
            Self::Relax => "RELAX",
            Self::Party => "PARTY",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s.to_ascii_uppercase().as_str() {
            "WORK" => Ok(Self::Work),
            "EXERCISE" => Ok(Self::Exercise),
            "RELAX" => Ok(Self::Relax),
            "PARTY" => Ok(Self::Party),
            other => Err(ApiError::validation(format!("unknown activity: {}", other))),
        }
    }
}

/// Coarse time-of-day bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeBucket {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "MORNING",
            Self::Afternoon => "AFTERNOON",
            Self::Evening => "EVENING",
            Self::Night => "NIGHT",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s.to_ascii_uppercase().as_str() {
            "MORNING" => Ok(Self::Morning),
            "AFTERNOON" => Ok(Self::Afternoon),
            "EVENING" => Ok(Self::Evening),
            "NIGHT" => Ok(Self::Night),
            other => Err(ApiError::validation(format!(
                "unknown time bucket: {}",
                other
            ))),
        }
    }
}

/// Listening context attached to interactions and recommendation requests
///
/// Unknown fields are dropped at the serde boundary; a missing context and
/// an empty one are equivalent everywhere, including in the cache key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListeningContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<Activity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_bucket: Option<TimeBucket>,
}

impl ListeningContext {
    pub fn is_empty(&self) -> bool {
        self.mood.is_none() && self.activity.is_none() && self.time_bucket.is_none()
    }

    /// Canonical context fragment for cache keys.
    ///
    /// Fields appear in a fixed order so that equal contexts always produce
    /// equal keys. An empty context maps to "any".
    pub fn cache_fragment(&self) -> String {
        if self.is_empty() {
            return "any".to_string();
        }
        let mut parts = Vec::with_capacity(3);
        if let Some(mood) = self.mood {
            parts.push(format!("mood={}", mood.as_str()));
        }
        if let Some(activity) = self.activity {
            parts.push(format!("activity={}", activity.as_str()));
        }
        if let Some(bucket) = self.time_bucket {
            parts.push(format!("time={}", bucket.as_str()));
        }
        parts.join("|")
    }
}

/// Interaction record from the interactions table
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    /// Server-assigned identifier
    pub id: Uuid,

    /// Owning external user ID
    pub external_user_id: String,

    /// Track the event refers to
    pub track_id: Uuid,

    /// Event kind
    pub event_type: EventType,

    /// Reserved event payload (e.g. listened seconds)
    pub event_value: Option<i32>,

    /// Listening context captured with the event
    #[sqlx(json(nullable))]
    pub context: Option<ListeningContext>,

    /// Server-clock creation timestamp; authoritative event order
    pub created_at: DateTime<Utc>,
}

/// Client payload for POST /interactions
///
/// `client_ts` is carried through the API but no decision is made on it;
/// the server clock orders events.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    pub track_id: Uuid,
    pub event_type: EventType,
    pub event_value: Option<i32>,
    pub context: Option<ListeningContext>,
    pub client_ts: Option<DateTime<Utc>>,
}

/// All-time interaction counts for a user, used for cold-start detection
#[derive(Debug, Clone, Copy, FromRow)]
pub struct InteractionStats {
    pub total: i64,
    pub like_count: i64,
    pub skip_count: i64,
    pub play_count: i64,
}

/// Interaction row joined to track metadata, as consumed by the interest
/// graph engine
#[derive(Debug, Clone, FromRow)]
pub struct InteractionWithTrackMeta {
    pub event_type: EventType,
    pub created_at: DateTime<Utc>,
    pub artist: String,
    pub genre: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_wire_format() {
        assert_eq!(
            serde_json::to_string(&EventType::AddToPlaylist).unwrap(),
            r#""ADD_TO_PLAYLIST""#
        );
        let parsed: EventType = serde_json::from_str(r#""SKIP""#).unwrap();
        assert_eq!(parsed, EventType::Skip);
    }

    #[test]
    fn test_context_empty_equals_missing() {
        let empty = ListeningContext::default();
        assert!(empty.is_empty());
        assert_eq!(empty.cache_fragment(), "any");
    }

    #[test]
    fn test_context_fragment_fixed_order() {
        let ctx = ListeningContext {
            time_bucket: Some(TimeBucket::Night),
            mood: Some(Mood::Happy),
            activity: None,
        };
        assert_eq!(ctx.cache_fragment(), "mood=HAPPY|time=NIGHT");
    }

    #[test]
    fn test_context_drops_unknown_fields() {
        let json = r#"{"mood":"CALM","weather":"rainy"}"#;
        let ctx: ListeningContext = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.mood, Some(Mood::Calm));
        assert!(ctx.activity.is_none());
    }

    #[test]
    fn test_enum_parse_rejects_unknown() {
        assert!(Mood::parse("GRUMPY").is_err());
        assert!(Activity::parse("SLEEP").is_err());
        assert!(TimeBucket::parse("NOON").is_err());
        assert_eq!(Mood::parse("calm").unwrap(), Mood::Calm);
    }
}
