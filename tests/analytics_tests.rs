/// Unit tests for the dashboard aggregation rules: bucket boundaries,
/// empty-collection short-circuit, conversion rate, idempotence.
use smartconvert_api::analytics::{
    age_bucket, econ_bucket, score_bucket, DashboardStats, DistEntry, StatsRow, HIGH_POTENTIAL,
    LOW_POTENTIAL, MEDIUM_POTENTIAL,
};
use std::collections::HashSet;

fn row(
    age: Option<i32>,
    score: Option<f64>,
    label: Option<&str>,
    job: Option<&str>,
    euribor3m: Option<f64>,
) -> StatsRow {
    StatsRow {
        age,
        prediction_score: score,
        prediction_label: label.map(String::from),
        marital: None,
        education: None,
        job: job.map(String::from),
        euribor3m,
    }
}

fn as_set(entries: &[DistEntry]) -> HashSet<(String, i64)> {
    entries
        .iter()
        .map(|e| (e.name.clone(), e.value))
        .collect()
}

#[cfg(test)]
mod bucket_boundaries {
    use super::*;

    #[test]
    fn age_upper_bounds_are_inclusive() {
        assert_eq!(age_bucket(25), "18-25");
        assert_eq!(age_bucket(26), "26-35");
        assert_eq!(age_bucket(35), "26-35");
        assert_eq!(age_bucket(36), "36-45");
        assert_eq!(age_bucket(55), "46-55");
        assert_eq!(age_bucket(65), "56-65");
        assert_eq!(age_bucket(66), "65+");
        assert_eq!(age_bucket(18), "18-25");
    }

    #[test]
    fn score_upper_bounds_are_inclusive() {
        assert_eq!(score_bucket(0.0), "0-20");
        assert_eq!(score_bucket(0.2), "0-20");
        assert_eq!(score_bucket(0.4), "21-40");
        assert_eq!(score_bucket(0.41), "41-60");
        assert_eq!(score_bucket(0.6), "41-60");
        assert_eq!(score_bucket(0.8), "61-80");
        assert_eq!(score_bucket(0.81), "81-100");
        assert_eq!(score_bucket(1.0), "81-100");
    }

    #[test]
    fn econ_rate_thresholds() {
        assert_eq!(econ_bucket(0.6), "Low Interest");
        assert_eq!(econ_bucket(1.5), "Low Interest");
        assert_eq!(econ_bucket(1.51), "Medium Interest");
        assert_eq!(econ_bucket(4.0), "Medium Interest");
        assert_eq!(econ_bucket(4.857), "High Interest");
    }
}

#[cfg(test)]
mod empty_collection {
    use super::*;

    #[test]
    fn stats_on_zero_leads_short_circuit() {
        let stats = DashboardStats::from_rows(&[]);

        assert_eq!(stats.total_leads, 0);
        assert_eq!(stats.high_potential, 0);
        assert_eq!(stats.medium_potential, 0);
        assert_eq!(stats.low_potential, 0);
        assert_eq!(stats.conversion_rate_estimate, 0.0);
        assert!(stats.age_dist.is_empty());
        assert!(stats.score_dist.is_empty());
        assert!(stats.marital_dist.is_empty());
        assert!(stats.edu_dist.is_empty());
        assert!(stats.job_dist.is_empty());
        assert!(stats.econ_dist.is_empty());
    }
}

#[cfg(test)]
mod conversion_rate {
    use super::*;

    #[test]
    fn three_high_of_ten_is_thirty_percent() {
        let mut rows = Vec::new();
        for _ in 0..3 {
            rows.push(row(None, None, Some(HIGH_POTENTIAL), None, None));
        }
        for _ in 0..4 {
            rows.push(row(None, None, Some(MEDIUM_POTENTIAL), None, None));
        }
        for _ in 0..3 {
            rows.push(row(None, None, Some(LOW_POTENTIAL), None, None));
        }

        let stats = DashboardStats::from_rows(&rows);
        assert_eq!(stats.total_leads, 10);
        assert_eq!(stats.high_potential, 3);
        assert_eq!(stats.medium_potential, 4);
        assert_eq!(stats.low_potential, 3);
        assert_eq!(stats.conversion_rate_estimate, 30.0);
    }

    #[test]
    fn rate_is_rounded_to_two_decimals() {
        let mut rows = vec![row(None, None, Some(HIGH_POTENTIAL), None, None)];
        rows.push(row(None, None, None, None, None));
        rows.push(row(None, None, None, None, None));

        // 1/3 * 100 = 33.333... -> 33.33
        let stats = DashboardStats::from_rows(&rows);
        assert_eq!(stats.conversion_rate_estimate, 33.33);
    }

    #[test]
    fn unlabeled_leads_count_toward_total_only() {
        let rows = vec![
            row(None, None, Some(HIGH_POTENTIAL), None, None),
            row(None, None, None, None, None),
        ];
        let stats = DashboardStats::from_rows(&rows);
        assert_eq!(stats.total_leads, 2);
        assert_eq!(stats.high_potential, 1);
        assert_eq!(stats.conversion_rate_estimate, 50.0);
    }
}

#[cfg(test)]
mod distributions {
    use super::*;

    #[test]
    fn groups_reflect_only_nonempty_buckets() {
        let rows = vec![
            row(Some(23), None, None, None, None),
            row(Some(25), None, None, None, None),
            row(Some(70), None, None, None, None),
        ];
        let stats = DashboardStats::from_rows(&rows);

        let expected: HashSet<(String, i64)> =
            [("18-25".to_string(), 2), ("65+".to_string(), 1)]
                .into_iter()
                .collect();
        assert_eq!(as_set(&stats.age_dist), expected);
    }

    #[test]
    fn categorical_groups_use_raw_values() {
        let rows = vec![
            row(None, None, None, Some("admin."), None),
            row(None, None, None, Some("admin."), None),
            row(None, None, None, Some("technician"), None),
        ];
        let stats = DashboardStats::from_rows(&rows);

        let expected: HashSet<(String, i64)> =
            [("admin.".to_string(), 2), ("technician".to_string(), 1)]
                .into_iter()
                .collect();
        assert_eq!(as_set(&stats.job_dist), expected);
    }

    #[test]
    fn unscored_leads_do_not_enter_score_dist() {
        let rows = vec![
            row(None, Some(0.9), None, None, None),
            row(None, None, None, None, None),
        ];
        let stats = DashboardStats::from_rows(&rows);

        assert_eq!(stats.total_leads, 2);
        let expected: HashSet<(String, i64)> =
            [("81-100".to_string(), 1)].into_iter().collect();
        assert_eq!(as_set(&stats.score_dist), expected);
    }

    #[test]
    fn econ_distribution_buckets_rates() {
        let rows = vec![
            row(None, None, None, None, Some(0.7)),
            row(None, None, None, None, Some(1.5)),
            row(None, None, None, None, Some(2.5)),
            row(None, None, None, None, Some(4.9)),
        ];
        let stats = DashboardStats::from_rows(&rows);

        let expected: HashSet<(String, i64)> = [
            ("Low Interest".to_string(), 2),
            ("Medium Interest".to_string(), 1),
            ("High Interest".to_string(), 1),
        ]
        .into_iter()
        .collect();
        assert_eq!(as_set(&stats.econ_dist), expected);
    }
}

#[cfg(test)]
mod idempotence {
    use super::*;

    #[test]
    fn same_rows_yield_identical_stats() {
        let rows = vec![
            row(Some(30), Some(0.85), Some(HIGH_POTENTIAL), Some("admin."), Some(4.8)),
            row(Some(52), Some(0.15), Some(LOW_POTENTIAL), Some("retired"), Some(1.2)),
            row(Some(41), None, None, Some("services"), Some(2.0)),
        ];

        let first = serde_json::to_value(DashboardStats::from_rows(&rows)).unwrap();
        let second = serde_json::to_value(DashboardStats::from_rows(&rows)).unwrap();
        assert_eq!(first, second);
    }
}
