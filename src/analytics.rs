use crate::errors::AppError;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;

pub const HIGH_POTENTIAL: &str = "High Potential";
pub const MEDIUM_POTENTIAL: &str = "Medium Potential";
pub const LOW_POTENTIAL: &str = "Low Potential";

/// One `{name, value}` entry of a dashboard distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistEntry {
    pub name: String,
    pub value: i64,
}

/// Aggregate dashboard statistics over the full lead collection.
#[derive(Debug, Default, Serialize)]
pub struct DashboardStats {
    pub total_leads: i64,
    pub high_potential: i64,
    pub medium_potential: i64,
    pub low_potential: i64,
    pub conversion_rate_estimate: f64,
    pub age_dist: Vec<DistEntry>,
    pub score_dist: Vec<DistEntry>,
    pub marital_dist: Vec<DistEntry>,
    pub edu_dist: Vec<DistEntry>,
    pub job_dist: Vec<DistEntry>,
    pub econ_dist: Vec<DistEntry>,
}

/// The projection of one lead that the aggregator needs.
#[derive(Debug, Clone, Default, FromRow)]
pub struct StatsRow {
    pub age: Option<i32>,
    pub prediction_score: Option<f64>,
    pub prediction_label: Option<String>,
    pub marital: Option<String>,
    pub education: Option<String>,
    pub job: Option<String>,
    pub euribor3m: Option<f64>,
}

/// Fixed age bucket label; upper bounds inclusive (25 -> "18-25",
/// 26 -> "26-35", 66 -> "65+").
pub fn age_bucket(age: i32) -> &'static str {
    if age <= 25 {
        "18-25"
    } else if age <= 35 {
        "26-35"
    } else if age <= 45 {
        "36-45"
    } else if age <= 55 {
        "46-55"
    } else if age <= 65 {
        "56-65"
    } else {
        "65+"
    }
}

/// Score bucket label over the [0, 1] prediction score, displayed as
/// percentage ranges.
pub fn score_bucket(score: f64) -> &'static str {
    if score <= 0.2 {
        "0-20"
    } else if score <= 0.4 {
        "21-40"
    } else if score <= 0.6 {
        "41-60"
    } else if score <= 0.8 {
        "61-80"
    } else {
        "81-100"
    }
}

/// Macro-economic bucket label from the euribor3m rate.
pub fn econ_bucket(euribor3m: f64) -> &'static str {
    if euribor3m <= 1.5 {
        "Low Interest"
    } else if euribor3m <= 4.0 {
        "Medium Interest"
    } else {
        "High Interest"
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn to_entries(counts: BTreeMap<String, i64>) -> Vec<DistEntry> {
    counts
        .into_iter()
        .map(|(name, value)| DistEntry { name, value })
        .collect()
}

impl DashboardStats {
    /// Folds the full-collection scan into the dashboard shape.
    ///
    /// Pure over its input: two calls on the same rows yield identical
    /// results. An empty collection short-circuits to the all-zero,
    /// all-empty shape so no consumer ever sees a division by zero or a
    /// partially-populated result. Buckets with no members are omitted,
    /// and records missing a scalar simply do not contribute to that
    /// scalar's distribution.
    pub fn from_rows(rows: &[StatsRow]) -> Self {
        let total_leads = rows.len() as i64;
        if total_leads == 0 {
            return Self::default();
        }

        let mut high_potential = 0i64;
        let mut medium_potential = 0i64;
        let mut low_potential = 0i64;
        let mut age_counts: BTreeMap<String, i64> = BTreeMap::new();
        let mut score_counts: BTreeMap<String, i64> = BTreeMap::new();
        let mut marital_counts: BTreeMap<String, i64> = BTreeMap::new();
        let mut edu_counts: BTreeMap<String, i64> = BTreeMap::new();
        let mut job_counts: BTreeMap<String, i64> = BTreeMap::new();
        let mut econ_counts: BTreeMap<String, i64> = BTreeMap::new();

        for row in rows {
            match row.prediction_label.as_deref() {
                Some(HIGH_POTENTIAL) => high_potential += 1,
                Some(MEDIUM_POTENTIAL) => medium_potential += 1,
                Some(LOW_POTENTIAL) => low_potential += 1,
                _ => {}
            }
            if let Some(age) = row.age {
                *age_counts.entry(age_bucket(age).to_string()).or_default() += 1;
            }
            if let Some(score) = row.prediction_score {
                *score_counts
                    .entry(score_bucket(score).to_string())
                    .or_default() += 1;
            }
            if let Some(marital) = &row.marital {
                *marital_counts.entry(marital.clone()).or_default() += 1;
            }
            if let Some(education) = &row.education {
                *edu_counts.entry(education.clone()).or_default() += 1;
            }
            if let Some(job) = &row.job {
                *job_counts.entry(job.clone()).or_default() += 1;
            }
            if let Some(rate) = row.euribor3m {
                *econ_counts.entry(econ_bucket(rate).to_string()).or_default() += 1;
            }
        }

        Self {
            total_leads,
            high_potential,
            medium_potential,
            low_potential,
            conversion_rate_estimate: round2(high_potential as f64 / total_leads as f64 * 100.0),
            age_dist: to_entries(age_counts),
            score_dist: to_entries(score_counts),
            marital_dist: to_entries(marital_counts),
            edu_dist: to_entries(edu_counts),
            job_dist: to_entries(job_counts),
            econ_dist: to_entries(econ_counts),
        }
    }
}

/// Scans the entire lead collection (never scoped to a listing filter) and
/// computes the dashboard statistics. Either the aggregation completes
/// fully or the store error propagates; no partial aggregate is returned.
pub async fn dashboard_stats(pool: &PgPool) -> Result<DashboardStats, AppError> {
    let rows = sqlx::query_as::<_, StatsRow>(
        "SELECT age, prediction_score, prediction_label, marital, education, job, euribor3m \
         FROM leads",
    )
    .fetch_all(pool)
    .await?;

    Ok(DashboardStats::from_rows(&rows))
}
