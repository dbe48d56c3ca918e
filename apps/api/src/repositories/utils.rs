//! Shared repository utilities

/// Columns selected for every Track query, kept in one place so the
/// FromRow mapping cannot drift between queries.
pub const TRACK_COLUMNS: &str =
    "id, title, artist, genre, duration_seconds, external_url, preview_url, audio_features, created_at";

/// TRACK_COLUMNS with a table alias prefix, for joined queries.
pub fn prefixed_track_columns(alias: &str) -> String {
    TRACK_COLUMNS
        .split(", ")
        .map(|col| format!("{}.{}", alias, col))
        .collect::<Vec<_>>()
        .join(", ")
}
