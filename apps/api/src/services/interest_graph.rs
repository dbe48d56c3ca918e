//! Interest graph engine
//!
//! Turns raw interaction history into the compact per-user bias document
//! consumed by the recommendation pipeline: top and avoid maps over artists
//! and genres, weighted by event kind and normalized so the maximum score
//! is 1.

use std::collections::BTreeMap;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::deadline::Deadline;
use crate::error::ApiResult;
use crate::models::interest_graph::{GRAPH_GENERATOR_HEURISTIC, GRAPH_SCHEMA_VERSION};
use crate::models::{EventType, InteractionWithTrackMeta, InterestGraph};
use crate::repositories::{InteractionRepository, InterestGraphRepository};

/// Interaction window the graph is derived from
pub const GRAPH_WINDOW_DAYS: i32 = 90;

/// At most this many interactions feed one document
const GRAPH_MAX_INTERACTIONS: i64 = 500;

/// Cap on entries per emitted map
const GRAPH_MAX_ENTRIES: usize = 20;

/// Event kinds that carry taste signal
const GRAPH_EVENT_KINDS: [EventType; 4] = [
    EventType::Play,
    EventType::Like,
    EventType::Skip,
    EventType::Dislike,
];

fn event_weight(kind: EventType) -> f64 {
    match kind {
        EventType::Like => 2.0,
        EventType::Play => 1.0,
        EventType::Skip => -1.0,
        EventType::Dislike => -2.0,
        EventType::AddToPlaylist => 0.0,
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Sort descending, keep the top entries, normalize by the maximum.
///
/// When the maximum is not positive every emitted value is 0; otherwise
/// each value is `round(score/max, 4)`, floored at 0 so net-negative
/// entries surviving the truncation cannot push a score below the [0, 1]
/// range. Negative signal only ever scores in the avoid maps.
fn normalized_top(scores: HashMap<String, f64>) -> BTreeMap<String, f64> {
    let mut entries: Vec<(String, f64)> = scores.into_iter().collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    entries.truncate(GRAPH_MAX_ENTRIES);

    let max = entries.first().map(|(_, score)| *score).unwrap_or(0.0);
    entries
        .into_iter()
        .map(|(name, score)| {
            let normalized = if max > 0.0 {
                round4((score / max).max(0.0))
            } else {
                0.0
            };
            (name, normalized)
        })
        .collect()
}

/// Derive a document from interaction rows; `None` when there are none.
pub fn build_graph(
    rows: &[InteractionWithTrackMeta],
    now: DateTime<Utc>,
) -> Option<InterestGraph> {
    if rows.is_empty() {
        return None;
    }

    let mut artist_scores: HashMap<String, f64> = HashMap::new();
    let mut genre_scores: HashMap<String, f64> = HashMap::new();

    for row in rows {
        let weight = event_weight(row.event_type);
        if !row.artist.is_empty() {
            *artist_scores.entry(row.artist.clone()).or_default() += weight;
        }
        if !row.genre.is_empty() {
            *genre_scores.entry(row.genre.clone()).or_default() += weight;
        }
    }

    let negatives = |scores: &HashMap<String, f64>| -> HashMap<String, f64> {
        scores
            .iter()
            .filter(|(_, score)| **score < 0.0)
            .map(|(name, score)| (name.clone(), score.abs()))
            .collect()
    };

    let avoid_artists = normalized_top(negatives(&artist_scores));
    let avoid_genres = normalized_top(negatives(&genre_scores));

    Some(InterestGraph {
        version: GRAPH_SCHEMA_VERSION,
        generated_by: GRAPH_GENERATOR_HEURISTIC.to_string(),
        window_days: GRAPH_WINDOW_DAYS as u32,
        top_artists: normalized_top(artist_scores),
        top_genres: normalized_top(genre_scores),
        avoid_artists,
        avoid_genres,
        updated_at: now,
    })
}

/// Interest graph engine over the interaction log and graph store
#[derive(Clone)]
pub struct InterestGraphService {
    interactions: InteractionRepository,
    graphs: InterestGraphRepository,
}

impl InterestGraphService {
    pub fn new(interactions: InteractionRepository, graphs: InterestGraphRepository) -> Self {
        Self {
            interactions,
            graphs,
        }
    }

    /// Return the stored document unchanged, computing and persisting one
    /// only when none exists yet.
    pub async fn get_or_compute(
        &self,
        user_id: &str,
        deadline: Deadline,
    ) -> ApiResult<Option<InterestGraph>> {
        if let Some(graph) = self.graphs.find(user_id, deadline).await? {
            return Ok(Some(graph));
        }
        self.compute_and_store(user_id, deadline).await
    }

    /// Recompute unconditionally, persisting the result when there is one.
    pub async fn refresh(
        &self,
        user_id: &str,
        deadline: Deadline,
    ) -> ApiResult<Option<InterestGraph>> {
        self.compute_and_store(user_id, deadline).await
    }

    async fn compute_and_store(
        &self,
        user_id: &str,
        deadline: Deadline,
    ) -> ApiResult<Option<InterestGraph>> {
        let rows = self
            .interactions
            .recent_with_track_meta(
                user_id,
                GRAPH_MAX_INTERACTIONS,
                GRAPH_WINDOW_DAYS,
                &GRAPH_EVENT_KINDS,
                deadline,
            )
            .await?;

        let Some(graph) = build_graph(&rows, Utc::now()) else {
            return Ok(None);
        };

        self.graphs.upsert(user_id, &graph, deadline).await?;
        Ok(Some(graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(event_type: EventType, artist: &str, genre: &str) -> InteractionWithTrackMeta {
        InteractionWithTrackMeta {
            event_type,
            created_at: Utc::now(),
            artist: artist.to_string(),
            genre: genre.to_string(),
        }
    }

    #[test]
    fn test_empty_history_yields_no_graph() {
        assert!(build_graph(&[], Utc::now()).is_none());
    }

    #[test]
    fn test_top_scores_normalized_to_max_one() {
        let rows = vec![
            row(EventType::Like, "A", "Pop"),
            row(EventType::Like, "A", "Pop"),
            row(EventType::Play, "B", "Rock"),
        ];
        let graph = build_graph(&rows, Utc::now()).unwrap();
        assert_eq!(graph.top_artists["A"], 1.0);
        assert_eq!(graph.top_artists["B"], 0.25);
        assert_eq!(graph.top_genres["Pop"], 1.0);
        assert_eq!(graph.top_genres["Rock"], 0.25);
    }

    #[test]
    fn test_all_zero_when_no_positive_mass() {
        let rows = vec![
            row(EventType::Skip, "A", "Pop"),
            row(EventType::Dislike, "B", "Rock"),
        ];
        let graph = build_graph(&rows, Utc::now()).unwrap();
        assert_eq!(graph.top_artists["A"], 0.0);
        assert_eq!(graph.top_artists["B"], 0.0);
    }

    #[test]
    fn test_avoid_maps_only_from_negative_scores() {
        let rows = vec![
            row(EventType::Like, "Good", "Pop"),
            row(EventType::Dislike, "Bad", "Metal"),
            row(EventType::Skip, "Meh", "Jazz"),
        ];
        let graph = build_graph(&rows, Utc::now()).unwrap();
        assert!(!graph.avoid_artists.contains_key("Good"));
        assert_eq!(graph.avoid_artists["Bad"], 1.0);
        assert_eq!(graph.avoid_artists["Meh"], 0.5);
        assert!(!graph.avoid_genres.contains_key("Pop"));
        assert_eq!(graph.avoid_genres["Metal"], 1.0);
    }

    #[test]
    fn test_blank_axis_values_do_not_contribute() {
        let rows = vec![row(EventType::Like, "", "Pop"), row(EventType::Like, "A", "")];
        let graph = build_graph(&rows, Utc::now()).unwrap();
        assert!(!graph.top_artists.contains_key(""));
        assert!(!graph.top_genres.contains_key(""));
        assert_eq!(graph.top_artists["A"], 1.0);
        assert_eq!(graph.top_genres["Pop"], 1.0);
    }

    #[test]
    fn test_maps_capped_at_twenty_entries() {
        let rows: Vec<_> = (0..30)
            .map(|i| row(EventType::Play, &format!("artist-{:02}", i), "Pop"))
            .collect();
        let graph = build_graph(&rows, Utc::now()).unwrap();
        assert_eq!(graph.top_artists.len(), 20);
    }

    #[test]
    fn test_scores_rounded_to_four_decimals() {
        let rows = vec![
            row(EventType::Like, "A", "Pop"),
            row(EventType::Like, "A", "Pop"),
            row(EventType::Like, "A", "Pop"),
            row(EventType::Play, "B", "Rock"),
            row(EventType::Play, "B", "Rock"),
        ];
        let graph = build_graph(&rows, Utc::now()).unwrap();
        // 2/6 rounds to 0.3333
        assert_eq!(graph.top_artists["B"], 0.3333);
    }

    #[test]
    fn test_mixed_history_floors_negative_top_scores_at_zero() {
        // Few enough distinct entries that the top-20 truncation keeps the
        // net-negative ones; they must emit 0, not a negative score.
        let rows = vec![
            row(EventType::Like, "A", "Pop"),
            row(EventType::Play, "B", "Rock"),
            row(EventType::Dislike, "C", "Metal"),
            row(EventType::Skip, "D", "Jazz"),
        ];
        let graph = build_graph(&rows, Utc::now()).unwrap();
        assert_eq!(graph.top_artists["A"], 1.0);
        assert_eq!(graph.top_artists["B"], 0.5);
        assert_eq!(graph.top_artists["C"], 0.0);
        assert_eq!(graph.top_artists["D"], 0.0);
        // The negative signal still lands in the avoid maps.
        assert_eq!(graph.avoid_artists["C"], 1.0);
        assert_eq!(graph.avoid_artists["D"], 0.5);
    }

    #[test]
    fn test_normalization_law_holds() {
        let rows = vec![
            row(EventType::Like, "A", "Pop"),
            row(EventType::Play, "B", "Rock"),
            row(EventType::Dislike, "C", "Metal"),
            row(EventType::Skip, "D", "Jazz"),
        ];
        let graph = build_graph(&rows, Utc::now()).unwrap();
        for map in [
            &graph.top_artists,
            &graph.top_genres,
            &graph.avoid_artists,
            &graph.avoid_genres,
        ] {
            let max = map.values().cloned().fold(0.0_f64, f64::max);
            assert!(max == 0.0 || max == 1.0, "max must be 0 or 1, got {}", max);
            assert!(map.values().all(|v| (0.0..=1.0).contains(v)));
        }
    }
}
