/// Property-based tests using proptest
/// Bucketing must be total (every scalar lands in exactly one label) and
/// sort-order parsing must never fail.
use proptest::prelude::*;
use smartconvert_api::analytics::{age_bucket, econ_bucket, score_bucket};
use smartconvert_api::models::SortOrder;

const AGE_LABELS: [&str; 6] = ["18-25", "26-35", "36-45", "46-55", "56-65", "65+"];
const SCORE_LABELS: [&str; 5] = ["0-20", "21-40", "41-60", "61-80", "81-100"];
const ECON_LABELS: [&str; 3] = ["Low Interest", "Medium Interest", "High Interest"];

proptest! {
    #[test]
    fn every_age_maps_to_one_known_label(age in -10i32..150) {
        let label = age_bucket(age);
        prop_assert!(AGE_LABELS.contains(&label));
    }

    #[test]
    fn age_buckets_are_ordered(a in 0i32..120, b in 0i32..120) {
        // A younger lead can never land in a later bucket than an older one.
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let idx = |label: &str| AGE_LABELS.iter().position(|l| *l == label).unwrap();
        prop_assert!(idx(age_bucket(lo)) <= idx(age_bucket(hi)));
    }

    #[test]
    fn every_score_maps_to_one_known_label(score in 0.0f64..=1.0) {
        let label = score_bucket(score);
        prop_assert!(SCORE_LABELS.contains(&label));
    }

    #[test]
    fn score_buckets_never_panic_outside_unit_range(score in -100.0f64..100.0) {
        let _ = score_bucket(score);
    }

    #[test]
    fn every_rate_maps_to_one_known_label(rate in -5.0f64..20.0) {
        let label = econ_bucket(rate);
        prop_assert!(ECON_LABELS.contains(&label));
    }

    #[test]
    fn unknown_sort_values_fall_back_to_newest(raw in "\\PC*") {
        let parsed = SortOrder::parse(&raw);
        let known = matches!(raw.as_str(), "score_high" | "score_low" | "oldest");
        if !known {
            prop_assert_eq!(parsed, SortOrder::Newest);
        }
    }
}

#[test]
fn recognized_sort_values_parse() {
    assert_eq!(SortOrder::parse("score_high"), SortOrder::ScoreHigh);
    assert_eq!(SortOrder::parse("score_low"), SortOrder::ScoreLow);
    assert_eq!(SortOrder::parse("oldest"), SortOrder::Oldest);
    assert_eq!(SortOrder::parse("newest"), SortOrder::Newest);
    assert_eq!(SortOrder::parse("banana"), SortOrder::Newest);
}
