use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use finsight_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// API error type
///
/// Status mapping:
/// - 400 for unreadable bodies and invalid periods
/// - 413 for bodies over the router limit
/// - 502 when the LLM provider fails or its reply is not usable JSON
/// - 500 for everything else
///
/// Provider and model-output failures were previously reported as 500.
/// Clients that treated any 500 as "AI unavailable" must also handle 502;
/// the `kind` and `parse_error` fields tell the two apart.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            ApiError::PayloadTooLarge(message) => {
                (StatusCode::PAYLOAD_TOO_LARGE, json!({ "error": message }))
            }
            ApiError::Core(CoreError::Validation(message)) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::Core(CoreError::Provider(err)) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": err.to_string(), "kind": err.kind }),
            ),
            // The raw model text goes back to the caller for diagnostics
            ApiError::Core(CoreError::MalformedResponse { message, raw }) => (
                StatusCode::BAD_GATEWAY,
                json!({ "parse_error": message, "raw_response": raw }),
            ),
            ApiError::Core(other) => {
                tracing::error!(error = %other, "unhandled error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": other.to_string() }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// API result type
pub type Result<T> = std::result::Result<T, ApiError>;
