use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use leadflow_infra::EngineError;

pub fn engine_error_to_response(err: EngineError) -> axum::response::Response {
    let status = match &err {
        EngineError::Validation(_) | EngineError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::AlreadyFulfilled | EngineError::AlreadyCancelled => StatusCode::CONFLICT,
        EngineError::Storage(_) if err.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %err, "engine operation failed");
    }
    json_error(status, err.code(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
