use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
};

use leadflow_core::LeadId;
use leadflow_leads::NewLead;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_lead).get(list_leads))
        .route("/seed", post(seed_leads))
        .route("/:id/status", patch(update_lead_status))
}

pub async fn create_lead(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<NewLead>, JsonRejection>,
) -> axum::response::Response {
    let new = match dto::body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.engine.create_lead(new).await {
        Ok(lead) => (StatusCode::CREATED, Json(lead)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn seed_leads(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::SeedLeadsRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match dto::body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.engine.seed_leads(body.leads).await {
        Ok(leads) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "count": leads.len(), "items": leads })),
        )
            .into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn list_leads(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::LeadListQuery>, QueryRejection>,
) -> axum::response::Response {
    let params = match dto::query(params) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let (filter, pagination) = match params.into_parts() {
        Ok(v) => v,
        Err(e) => return errors::engine_error_to_response(e),
    };

    match services.engine.list_leads(&filter, pagination).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

/// Manual override; may leave the lead inconsistent with its order.
pub async fn update_lead_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateLeadStatusRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: LeadId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match dto::body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.engine.update_lead_status(id, &body.status).await {
        Ok(lead) => (StatusCode::OK, Json(lead)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
