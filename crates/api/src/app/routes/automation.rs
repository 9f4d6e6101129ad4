use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use leadflow_infra::AutomationRequest;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", post(run_command))
}

pub async fn run_command(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<AutomationRequest>, JsonRejection>,
) -> axum::response::Response {
    let request = match dto::body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.automation.dispatch(request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
