use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============ Database Models ============

/// One prospective customer, as stored in the `leads` table.
///
/// The demographic and macro-economic attributes come straight from the
/// ingested marketing dataset and are all optional; the prediction fields
/// stay NULL until the prediction service has scored the record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lead {
    /// Store-assigned identifier. Immutable, never reused.
    pub id: i64,
    pub age: Option<i32>,
    pub job: Option<String>,
    pub marital: Option<String>,
    pub education: Option<String>,
    /// The dataset's `default` column (has the customer defaulted on credit).
    pub credit_default: Option<String>,
    pub housing: Option<String>,
    pub loan: Option<String>,
    pub contact: Option<String>,
    pub month: Option<String>,
    pub day_of_week: Option<String>,
    pub duration: Option<i32>,
    pub campaign: Option<i32>,
    pub pdays: Option<i32>,
    pub previous: Option<i32>,
    pub poutcome: Option<String>,
    pub emp_var_rate: Option<f64>,
    pub cons_price_idx: Option<f64>,
    pub cons_conf_idx: Option<f64>,
    /// 3-month Euribor rate at contact time.
    pub euribor3m: Option<f64>,
    pub nr_employed: Option<f64>,
    /// Conversion probability in [0, 1], NULL until scored.
    pub prediction_score: Option<f64>,
    /// One of "High Potential", "Medium Potential", "Low Potential".
    pub prediction_label: Option<String>,
    /// Free-form workflow status, mutable.
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every status/notes mutation; always >= created_at.
    pub updated_at: DateTime<Utc>,
}

/// A registered account. Created once at registration, never mutated here.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Per-user sales profile, one-to-one with `User`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub role: String,
    pub email: String,
    pub id_emp: String,
    pub monthly_target: Option<f64>,
    pub joined_date: DateTime<Utc>,
}

// ============ Ingestion ============

/// Pre-shaped field values for one lead to be created.
///
/// Ingestion fills this from a CSV row via [`NewLead::set`]; unknown columns
/// are dropped there, before the repository ever sees the record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewLead {
    pub age: Option<i32>,
    pub job: Option<String>,
    pub marital: Option<String>,
    pub education: Option<String>,
    pub credit_default: Option<String>,
    pub housing: Option<String>,
    pub loan: Option<String>,
    pub contact: Option<String>,
    pub month: Option<String>,
    pub day_of_week: Option<String>,
    pub duration: Option<i32>,
    pub campaign: Option<i32>,
    pub pdays: Option<i32>,
    pub previous: Option<i32>,
    pub poutcome: Option<String>,
    pub emp_var_rate: Option<f64>,
    pub cons_price_idx: Option<f64>,
    pub cons_conf_idx: Option<f64>,
    pub euribor3m: Option<f64>,
    pub nr_employed: Option<f64>,
}

impl NewLead {
    /// Assigns one raw CSV value to the field named by `column` (already
    /// normalized). Returns false for columns this record does not know,
    /// so callers can drop them silently.
    ///
    /// Unparseable numeric values are treated the same as absent ones.
    pub fn set(&mut self, column: &str, raw: &str) -> bool {
        let value = raw.trim();
        if value.is_empty() {
            // Known column with no value is still a known column.
            return KNOWN_COLUMNS.contains(&column);
        }
        match column {
            "age" => self.age = value.parse().ok(),
            "job" => self.job = Some(value.to_string()),
            "marital" => self.marital = Some(value.to_string()),
            "education" => self.education = Some(value.to_string()),
            "credit_default" => self.credit_default = Some(value.to_string()),
            "housing" => self.housing = Some(value.to_string()),
            "loan" => self.loan = Some(value.to_string()),
            "contact" => self.contact = Some(value.to_string()),
            "month" => self.month = Some(value.to_string()),
            "day_of_week" => self.day_of_week = Some(value.to_string()),
            "duration" => self.duration = value.parse().ok(),
            "campaign" => self.campaign = value.parse().ok(),
            "pdays" => self.pdays = value.parse().ok(),
            "previous" => self.previous = value.parse().ok(),
            "poutcome" => self.poutcome = Some(value.to_string()),
            "emp_var_rate" => self.emp_var_rate = value.parse().ok(),
            "cons_price_idx" => self.cons_price_idx = value.parse().ok(),
            "cons_conf_idx" => self.cons_conf_idx = value.parse().ok(),
            "euribor3m" => self.euribor3m = value.parse().ok(),
            "nr_employed" => self.nr_employed = value.parse().ok(),
            _ => return false,
        }
        true
    }
}

/// Columns the `leads` table accepts from ingestion, post-normalization.
pub const KNOWN_COLUMNS: &[&str] = &[
    "age",
    "job",
    "marital",
    "education",
    "credit_default",
    "housing",
    "loan",
    "contact",
    "month",
    "day_of_week",
    "duration",
    "campaign",
    "pdays",
    "previous",
    "poutcome",
    "emp_var_rate",
    "cons_price_idx",
    "cons_conf_idx",
    "euribor3m",
    "nr_employed",
];

/// Score/label pair produced by the prediction service for a new lead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Prediction {
    pub score: Option<f64>,
    pub label: Option<String>,
}

// ============ Querying ============

/// Explicit filter specification for lead listing.
///
/// Each bound is independently optional; absence means no constraint,
/// presence is inclusive (`age >= min_age`, `age <= max_age`,
/// `prediction_score >= min_score`, `job` exact match). Building this value
/// has no side effects, so filter composition is testable away from the
/// store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadFilter {
    pub job: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub min_score: Option<f64>,
}

impl LeadFilter {
    pub fn is_empty(&self) -> bool {
        self.job.is_none()
            && self.min_age.is_none()
            && self.max_age.is_none()
            && self.min_score.is_none()
    }
}

/// Result ordering for lead listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    ScoreHigh,
    ScoreLow,
    Oldest,
    #[default]
    Newest,
}

impl SortOrder {
    /// Parses a `sort_by` query value. Unrecognized values fall back to
    /// `Newest`, matching the listing contract.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "score_high" => SortOrder::ScoreHigh,
            "score_low" => SortOrder::ScoreLow,
            "oldest" => SortOrder::Oldest,
            _ => SortOrder::Newest,
        }
    }

    /// The ORDER BY clause for this ordering.
    ///
    /// Score sorts carry an explicit NULL policy (NULL counts as the lowest
    /// value ascending and the highest descending, so unscored leads lead
    /// both ways) and an id tiebreak so pagination stays stable across
    /// calls.
    pub fn order_clause(self) -> &'static str {
        match self {
            SortOrder::ScoreHigh => " ORDER BY prediction_score DESC NULLS FIRST, id ASC",
            SortOrder::ScoreLow => " ORDER BY prediction_score ASC NULLS FIRST, id ASC",
            SortOrder::Oldest => " ORDER BY id ASC",
            SortOrder::Newest => " ORDER BY id DESC",
        }
    }
}

// ============ API Request/Response Shapes ============

/// Query parameters for `GET /api/v1/leads`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListLeadsParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub sort_by: Option<String>,
    pub job: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub min_score: Option<f64>,
}

fn default_limit() -> i64 {
    100
}

impl ListLeadsParams {
    pub fn filter(&self) -> LeadFilter {
        LeadFilter {
            job: self.job.clone(),
            min_age: self.min_age,
            max_age: self.max_age,
            min_score: self.min_score,
        }
    }

    pub fn sort(&self) -> SortOrder {
        self.sort_by
            .as_deref()
            .map(SortOrder::parse)
            .unwrap_or_default()
    }
}

/// One page of the filtered lead collection plus the pre-pagination count.
#[derive(Debug, Serialize)]
pub struct LeadPage {
    pub total: i64,
    pub items: Vec<Lead>,
}

/// Single-lead detail view with the prediction service's explanation
/// attached (null when the explanation call fails).
#[derive(Debug, Serialize)]
pub struct LeadDetail {
    #[serde(flatten)]
    pub lead: Lead,
    pub explanation: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct NotesUpdate {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub lead_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest {
    pub lead_ids: Vec<i64>,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Allow-listed profile fields for `PUT /api/v1/user/profile`.
///
/// Unknown body fields deserialize to nothing and are thereby ignored, not
/// rejected; absent fields leave the stored value unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub id_emp: Option<String>,
    pub monthly_target: Option<f64>,
}

/// Scalar summary metrics on the composed profile view.
#[derive(Debug, Serialize)]
pub struct ProfileStats {
    pub leads_processed: i64,
    pub conversion_rate: f64,
    pub current_progress: i64,
}

/// One entry in the "recent activity" feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub lead_id: i64,
    pub time: String,
    pub content: String,
}

/// The composed user-facing profile view.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub email: String,
    pub id_emp: String,
    pub monthly_target: Option<f64>,
    pub joined_date: String,
    pub active_days: i64,
    pub stats: ProfileStats,
    pub recent_activities: Vec<ActivityEntry>,
}
