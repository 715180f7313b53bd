use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use finsight_core::{FinsightContext, InsightRequest};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::{error::ApiError, Result};

pub type AppState = Arc<FinsightContext>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub provider: String,
}

/// GET /health
pub async fn health_check(State(ctx): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        provider: ctx.provider_name().to_string(),
    })
}

/// POST /ai-insight
/// Monthly insight groups, or a chat answer when `query` is set
pub async fn ai_insight(
    State(ctx): State<AppState>,
    payload: std::result::Result<Json<InsightRequest>, JsonRejection>,
) -> Result<Json<JsonValue>> {
    let request_id = Uuid::new_v4();
    let span = info_span!("ai_insight", %request_id);

    async move {
        let Json(request) = payload.map_err(|rejection| {
            info!(error = %rejection.body_text(), "rejected request body");
            match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(rejection.body_text()),
                _ => ApiError::BadRequest(rejection.body_text()),
            }
        })?;

        let reply = ctx.insight_service.handle(request).await?;
        Ok(Json(reply))
    }
    .instrument(span)
    .await
}
