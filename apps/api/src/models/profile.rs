//! User profile model
//!
//! One profile per external user ID, created lazily on first observation.
//! The profile embedding is derived by the store and only ever read back
//! here in pgvector text form.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::embedding::parse_pgvector;

/// Upper bound the host platform guarantees for external user IDs
pub const MAX_EXTERNAL_USER_ID_LEN: usize = 255;

/// User profile record from the user_profiles table
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Opaque user identity supplied by the host platform
    pub external_user_id: String,

    /// Genres the user opted into
    pub preferred_genres: Vec<String>,

    /// Genres the user opted out of
    pub disliked_genres: Vec<String>,

    /// Taste embedding in pgvector text form, when one has been derived
    #[serde(skip_serializing)]
    pub profile_embedding: Option<String>,

    /// Last time the user touched the system
    pub last_active_at: DateTime<Utc>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// The profile embedding as a vector, when present and well-formed.
    pub fn embedding(&self) -> Option<Vec<f32>> {
        self.profile_embedding
            .as_deref()
            .and_then(parse_pgvector)
    }

    pub fn has_embedding(&self) -> bool {
        self.profile_embedding.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::embedding::{format_pgvector, EMBEDDING_DIM};

    fn create_test_profile() -> UserProfile {
        UserProfile {
            external_user_id: "user-1".to_string(),
            preferred_genres: vec!["Pop".to_string()],
            disliked_genres: vec![],
            profile_embedding: None,
            last_active_at: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_embedding_absent() {
        let profile = create_test_profile();
        assert!(!profile.has_embedding());
        assert!(profile.embedding().is_none());
    }

    #[test]
    fn test_embedding_parses() {
        let mut profile = create_test_profile();
        let raw: Vec<f32> = (0..EMBEDDING_DIM).map(|i| i as f32).collect();
        profile.profile_embedding = Some(format_pgvector(&raw));
        assert_eq!(profile.embedding().unwrap(), raw);
    }

    #[test]
    fn test_embedding_not_serialized() {
        let mut profile = create_test_profile();
        profile.profile_embedding = Some("[1,2]".to_string());
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("profileEmbedding").is_none());
        assert_eq!(json["externalUserId"], "user-1");
        assert_eq!(json["preferredGenres"][0], "Pop");
    }
}
