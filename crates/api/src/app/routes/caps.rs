use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", get(get_caps).put(set_caps))
}

/// Configured caps only; regions without a row use `default_cap`.
pub async fn get_caps(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    caps_response(&services).await
}

pub async fn set_caps(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::SetCapsRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match dto::body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    if let Err(e) = services.engine.set_caps(&body.caps).await {
        return errors::engine_error_to_response(e);
    }
    caps_response(&services).await
}

async fn caps_response(services: &AppServices) -> axum::response::Response {
    match services.engine.get_caps().await {
        Ok(caps) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "caps": caps,
                "default_cap": services.engine.config().default_cap,
            })),
        )
            .into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
