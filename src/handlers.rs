use crate::analytics;
use crate::auth::{AuthService, CurrentUser};
use crate::config::Config;
use crate::errors::AppError;
use crate::ingest;
use crate::models::*;
use crate::profile::ProfileService;
use crate::repository::LeadRepository;
use crate::scoring::ScoringClient;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state injected into handlers.
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
    /// Client for the external prediction service.
    pub scoring: ScoringClient,
}

impl AppState {
    fn leads(&self) -> LeadRepository {
        LeadRepository::new(self.db.clone())
    }

    fn profiles(&self) -> ProfileService {
        ProfileService::new(self.db.clone())
    }

    fn auth(&self) -> AuthService {
        AuthService::new(self.db.clone(), self.config.session_ttl_secs)
    }
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "smartconvert-api",
            "version": "0.1.0"
        })),
    )
}

/// POST /api/v1/register
///
/// Creates an account and its default sales profile.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = state.auth().register(&body.username, &body.password).await?;
    Ok(Json(json!({
        "id": user.id,
        "username": user.username,
    })))
}

/// POST /api/v1/login
///
/// Verifies credentials and issues a bearer token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = state.auth().login(&body.username, &body.password).await?;
    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
    }))
}

/// POST /api/v1/upload-csv
///
/// Ingests a CSV of leads: every row is scored by the prediction service
/// and persisted. Returns the processed count plus the first five saved
/// records as a sample.
pub async fn upload_csv(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?;
            upload = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let (filename, bytes) =
        upload.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;
    if !filename.to_lowercase().ends_with(".csv") {
        return Err(AppError::Validation("File must be a CSV".to_string()));
    }

    tracing::info!("POST /upload-csv - file: {} ({} bytes)", filename, bytes.len());

    let saved = ingest::ingest_csv(&state.leads(), &state.scoring, &bytes).await?;
    let sample: Vec<&Lead> = saved.iter().take(5).collect();

    Ok(Json(json!({
        "status": "success",
        "message": format!("Successfully processed {} leads", saved.len()),
        "sample_data": sample,
    })))
}

/// GET /api/v1/leads
///
/// Filtered, sorted, paginated lead listing. The `total` in the response
/// counts the whole filtered set, independent of pagination.
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(params): Query<ListLeadsParams>,
) -> Result<Json<LeadPage>, AppError> {
    let (total, items) = state
        .leads()
        .list(&params.filter(), params.sort(), params.skip, params.limit)
        .await?;
    Ok(Json(LeadPage { total, items }))
}

/// GET /api/v1/leads/:id
///
/// Single-lead detail with the prediction service's explanation attached.
/// An explanation failure degrades to null; the lead itself still returns.
pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<LeadDetail>, AppError> {
    let lead = state.leads().get_by_id(id).await?;

    let fields = serde_json::to_value(&lead)
        .map_err(|e| AppError::Internal(format!("Failed to serialize lead: {}", e)))?;
    let explanation = match state.scoring.explain(&fields).await {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Explanation unavailable for lead {}: {}", id, e);
            None
        }
    };

    Ok(Json(LeadDetail { lead, explanation }))
}

/// PUT /api/v1/leads/:id/notes
pub async fn update_lead_notes(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<NotesUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.leads().update_notes(id, body.notes.as_deref()).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Note saved",
    })))
}

/// POST /api/v1/leads/bulk-delete
///
/// Deletes the given leads as one atomic batch; ids with no matching
/// record are ignored. A store failure rolls the whole batch back and is
/// reported as an explicit error, never an empty success.
pub async fn bulk_delete_leads(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(body): Json<BulkDeleteRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = state.leads().bulk_delete(&body.lead_ids).await?;
    Ok(Json(json!({
        "status": "success",
        "deleted": deleted,
    })))
}

/// PUT /api/v1/leads/bulk-status
pub async fn bulk_update_status(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(body): Json<BulkStatusRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let updated = state
        .leads()
        .bulk_update_status(&body.lead_ids, &body.status)
        .await?;
    Ok(Json(json!({
        "status": "success",
        "updated": updated,
    })))
}

/// DELETE /api/v1/leads/all
///
/// Empties the lead collection. Irreversible.
pub async fn delete_all_leads(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = state.leads().delete_all().await?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Deleted all {} leads", deleted),
    })))
}

/// GET /api/v1/dashboard/stats
pub async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Result<Json<analytics::DashboardStats>, AppError> {
    let stats = analytics::dashboard_stats(&state.db).await?;
    Ok(Json(stats))
}

/// GET /api/v1/user/profile
///
/// The current user's composed profile view; the profile row is created
/// lazily on first access.
pub async fn get_user_profile(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<ProfileView>, AppError> {
    let view = state.profiles().get_profile(user.0).await?;
    Ok(Json(view))
}

/// PUT /api/v1/user/profile
///
/// Updates the allow-listed profile fields of the current user. Unknown
/// body fields are ignored; returns null when no profile exists.
pub async fn update_user_profile(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<Option<UserProfile>>, AppError> {
    let profile = state.profiles().update_profile(user.0, &body).await?;
    Ok(Json(profile))
}

/// POST /api/v1/ai/simulate
///
/// Opaque pass-through to the prediction service for the what-if
/// simulator.
pub async fn simulate(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = state.scoring.simulate(&body).await?;
    Ok(Json(result))
}

/// GET /api/v1/ai/insights
pub async fn insights(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = state.scoring.insights().await?;
    Ok(Json(result))
}
