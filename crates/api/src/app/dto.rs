use std::collections::BTreeMap;
use std::str::FromStr;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use axum::http::StatusCode;
use serde::Deserialize;

use leadflow_core::{DomainError, RegionCode};
use leadflow_infra::EngineError;
use leadflow_infra::store::{LeadFilter, OrderFilter, Pagination};
use leadflow_leads::NewLead;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl OrderListQuery {
    pub fn into_parts(self) -> Result<(OrderFilter, Pagination), EngineError> {
        let filter = OrderFilter {
            status: self.status.as_deref().map(str::parse).transpose()?,
        };
        Ok((filter, Pagination::from_query(self.page, self.page_size)?))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LeadListQuery {
    pub status: Option<String>,
    pub region: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl LeadListQuery {
    pub fn into_parts(self) -> Result<(LeadFilter, Pagination), EngineError> {
        let filter = LeadFilter {
            status: self.status.as_deref().map(str::parse).transpose()?,
            region: self.region.as_deref().map(RegionCode::parse).transpose()?,
        };
        Ok((filter, Pagination::from_query(self.page, self.page_size)?))
    }
}

#[derive(Debug, Deserialize)]
pub struct SeedLeadsRequest {
    pub leads: Vec<NewLead>,
}

#[derive(Debug, Deserialize)]
pub struct SetCapsRequest {
    pub caps: BTreeMap<RegionCode, i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLeadStatusRequest {
    pub status: String,
}

// -------------------------
// Extractor helpers
// -------------------------

/// Unwrap a JSON body, turning axum's rejection into our error shape.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    payload.map(|Json(body)| body).map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.body_text())
    })
}

pub fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, axum::response::Response> {
    params.map(|Query(params)| params).map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.body_text())
    })
}

/// Parse a path identifier (`OrderId`, `LeadId`).
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse()
        .map_err(|e: DomainError| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}
