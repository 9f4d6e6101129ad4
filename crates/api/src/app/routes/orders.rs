use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use leadflow_core::OrderId;
use leadflow_infra::OrderRequest;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/export", get(export_fulfilled_orders))
        .route("/:id", get(get_order).delete(delete_order))
        .route("/:id/fulfill", post(fulfill_order))
        .route("/:id/cancel", post(cancel_order))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<OrderRequest>, JsonRejection>,
) -> axum::response::Response {
    let request = match dto::body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.engine.create_order(request).await {
        Ok(allocation) => (StatusCode::CREATED, Json(allocation)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::OrderListQuery>, QueryRejection>,
) -> axum::response::Response {
    let params = match dto::query(params) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let (filter, pagination) = match params.into_parts() {
        Ok(v) => v,
        Err(e) => return errors::engine_error_to_response(e),
    };

    match services.engine.list_orders(&filter, pagination).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.engine.get_order(id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn fulfill_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.engine.fulfill_order(id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn cancel_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.engine.cancel_order(id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.engine.delete_order(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "deleted": true, "order_id": id })),
        )
            .into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

/// One row per lead of every fulfilled order, newest fulfillment first.
pub async fn export_fulfilled_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.engine.export_fulfilled_orders().await {
        Ok(rows) => (
            StatusCode::OK,
            Json(serde_json::json!({ "count": rows.len(), "items": rows })),
        )
            .into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
