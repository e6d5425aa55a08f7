use crate::config::Config;
use crate::errors::AppError;
use crate::models::Prediction;
use failsafe::backoff::{self, Exponential};
use failsafe::failure_policy::{self, ConsecutiveFailures};
use failsafe::futures::CircuitBreaker;
use failsafe::StateMachine;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

type ScoringBreaker = StateMachine<ConsecutiveFailures<Exponential>, ()>;

/// Opens after 5 consecutive scoring failures, retrying with exponential
/// backoff between 10s and 60s. Bulk CSV ingestion calls the scorer once
/// per row; when the service is down this makes the whole upload fail fast
/// instead of timing out row by row.
fn scoring_circuit_breaker() -> ScoringBreaker {
    let backoff_strategy =
        backoff::exponential(Duration::from_secs(10), Duration::from_secs(60));
    let policy = failure_policy::consecutive_failures(5, backoff_strategy);
    failsafe::Config::new().failure_policy(policy).build()
}

/// Client for the external prediction/explanation service.
///
/// The service's payloads are opaque to this backend: a lead's field map
/// goes in, a `{score, label}` pair or an explanation structure comes out.
pub struct ScoringClient {
    client: Client,
    base_url: String,
    breaker: ScoringBreaker,
}

impl ScoringClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.scoring_base_url.clone(),
            breaker: scoring_circuit_breaker(),
        }
    }

    /// Scores one lead's field map. Used at ingestion time.
    pub async fn predict(&self, fields: &Value) -> Result<Prediction, AppError> {
        let body = self.post_json("/predict", fields).await?;
        serde_json::from_value(body).map_err(|e| {
            AppError::Scoring(format!("Failed to parse prediction response: {}", e))
        })
    }

    /// Raw prediction pass-through for the what-if simulator.
    pub async fn simulate(&self, fields: &Value) -> Result<Value, AppError> {
        self.post_json("/predict", fields).await
    }

    /// Fetches the per-lead explanation structure for the detail view.
    pub async fn explain(&self, fields: &Value) -> Result<Value, AppError> {
        self.post_json("/explain", fields).await
    }

    /// Model-insights pass-through for the AI lab page.
    pub async fn insights(&self) -> Result<Value, AppError> {
        self.get_json("/insights").await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let request = self.client.post(&url).json(body);
        self.breaker
            .call(Self::send(request, path))
            .await
            .map_err(flatten_breaker_error)
    }

    async fn get_json(&self, path: &str) -> Result<Value, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let request = self.client.get(&url);
        self.breaker
            .call(Self::send(request, path))
            .await
            .map_err(flatten_breaker_error)
    }

    async fn send(request: reqwest::RequestBuilder, path: &str) -> Result<Value, AppError> {
        let response = request.send().await.map_err(|e| {
            AppError::Scoring(format!("Prediction service request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(
                "Prediction service {} returned {}: {}",
                path,
                status,
                error_text
            );
            return Err(AppError::Scoring(format!(
                "Prediction service returned status {}",
                status
            )));
        }

        response.json().await.map_err(|e| {
            AppError::Scoring(format!("Failed to parse prediction service response: {}", e))
        })
    }
}

fn flatten_breaker_error(err: failsafe::Error<AppError>) -> AppError {
    match err {
        failsafe::Error::Inner(e) => e,
        failsafe::Error::Rejected => AppError::Scoring(
            "Prediction service unavailable (circuit open)".to_string(),
        ),
    }
}
