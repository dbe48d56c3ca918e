//! Tests for the recommendation pipeline's ranking stages
//!
//! Covers the context reranker, the artist diversity pass and the cache key
//! scheme. These stages are pure functions over candidate lists, so the
//! tests exercise them directly without a database.

mod common;

use rstest::rstest;

use cadence_api::models::{Activity, ListeningContext, Mood};
use cadence_api::services::cache::{cache_key, user_key_prefix};
use cadence_api::services::pipeline::{
    context_score, enforce_artist_diversity, rerank_by_context,
};

use common::{activity_context, energy, mood_context, track, track_with_features, valence};

// ========== Context rerank ==========

#[test]
fn exercise_context_reranks_by_energy() {
    // Candidates in ANN order T1{0.9}, T2{0.2}, T3{0.5}; EXERCISE must
    // produce T1, T3, T2.
    let candidates = vec![
        track_with_features("T1", "a", energy(0.9)),
        track_with_features("T2", "b", energy(0.2)),
        track_with_features("T3", "c", energy(0.5)),
    ];
    let ranked = rerank_by_context(candidates, &activity_context(Activity::Exercise));
    let titles: Vec<&str> = ranked.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["T1", "T3", "T2"]);
}

#[rstest]
#[case::calm_prefers_low_energy(mood_context(Mood::Calm), 0.1, 0.9, true)]
#[case::energetic_prefers_high_energy(mood_context(Mood::Energetic), 0.1, 0.9, false)]
fn mood_energy_preferences(
    #[case] context: ListeningContext,
    #[case] low: f64,
    #[case] high: f64,
    #[case] low_wins: bool,
) {
    let low_track = track_with_features("low", "a", energy(low));
    let high_track = track_with_features("high", "b", energy(high));
    let low_score = context_score(&low_track, &context);
    let high_score = context_score(&high_track, &context);
    if low_wins {
        assert!(low_score > high_score);
    } else {
        assert!(high_score > low_score);
    }
}

#[test]
fn happy_and_sad_split_on_valence() {
    let gloomy = track_with_features("gloomy", "a", valence(0.1));
    let sunny = track_with_features("sunny", "b", valence(0.9));

    let happy = mood_context(Mood::Happy);
    assert!(context_score(&sunny, &happy) > context_score(&gloomy, &happy));

    let sad = mood_context(Mood::Sad);
    assert!(context_score(&gloomy, &sad) > context_score(&sunny, &sad));
}

#[test]
fn rerank_is_stable_for_tied_scores() {
    // Tracks without features all score 0; the reranker must keep ANN
    // order for them.
    let candidates = vec![
        track("first", "a", "Pop"),
        track("second", "b", "Rock"),
        track("third", "c", "Jazz"),
    ];
    let ranked = rerank_by_context(candidates, &activity_context(Activity::Party));
    let titles: Vec<&str> = ranked.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "second", "third"]);
}

#[test]
fn featureless_tracks_rank_below_scored_ones() {
    let candidates = vec![
        track("plain", "a", "Pop"),
        track_with_features("pumped", "b", energy(0.8)),
    ];
    let ranked = rerank_by_context(candidates, &activity_context(Activity::Exercise));
    assert_eq!(ranked[0].title, "pumped");
    assert_eq!(ranked[1].title, "plain");
}

// ========== Artist diversity ==========

#[test]
fn diversity_caps_same_artist_runs() {
    // A,A,A,A,B with a cap of 3 becomes A,A,A,B.
    let candidates = vec![
        track("a1", "A", "Pop"),
        track("a2", "A", "Pop"),
        track("a3", "A", "Pop"),
        track("a4", "A", "Pop"),
        track("b1", "B", "Pop"),
    ];
    let result = enforce_artist_diversity(candidates, 3);
    let titles: Vec<&str> = result.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["a1", "a2", "a3", "b1"]);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
fn diversity_invariant_holds_for_any_cap(#[case] max_run: usize) {
    // A worst-case input: long blocks of one artist with rare breaks.
    let candidates: Vec<_> = (0..40)
        .map(|i| {
            let artist = if i % 9 == 8 { "B" } else { "A" };
            track(&format!("t{}", i), artist, "Pop")
        })
        .collect();

    let result = enforce_artist_diversity(candidates, max_run);

    for window in result.windows(max_run + 1) {
        assert!(
            !window.iter().all(|t| t.artist == window[0].artist),
            "run longer than {} by artist {}",
            max_run,
            window[0].artist
        );
    }
}

#[test]
fn diversity_discards_rather_than_reorders() {
    let candidates = vec![
        track("a1", "A", "Pop"),
        track("a2", "A", "Pop"),
        track("a3", "A", "Pop"),
        track("a4", "A", "Pop"),
        track("a5", "A", "Pop"),
        track("b1", "B", "Pop"),
    ];
    let result = enforce_artist_diversity(candidates, 3);
    let titles: Vec<&str> = result.iter().map(|t| t.title.as_str()).collect();
    // a4 and a5 are gone, not moved behind b1.
    assert_eq!(titles, vec!["a1", "a2", "a3", "b1"]);
}

// ========== Cache keys ==========

#[test]
fn missing_and_empty_context_share_a_key() {
    let missing: ListeningContext = Default::default();
    let empty = ListeningContext {
        mood: None,
        activity: None,
        time_bucket: None,
    };
    assert_eq!(cache_key("u1", &missing), cache_key("u1", &empty));
}

#[test]
fn distinct_contexts_get_distinct_keys() {
    let calm = mood_context(Mood::Calm);
    let happy = mood_context(Mood::Happy);
    assert_ne!(cache_key("u1", &calm), cache_key("u1", &happy));
}

#[test]
fn keys_are_scoped_by_user_prefix() {
    let context = mood_context(Mood::Calm);
    assert!(cache_key("u1", &context).starts_with(&user_key_prefix("u1")));
    assert!(!cache_key("u2", &context).starts_with(&user_key_prefix("u1")));
}
