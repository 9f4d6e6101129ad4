use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use leadflow_core::{LeadId, OrderId, RegionCode};
use leadflow_leads::Lead;
use leadflow_orders::Order;

use super::query::{
    FulfilledLeadRow, LeadFilter, OrderFilter, OrderSummary, OrderWithLeads, Page, Pagination,
};

/// Storage operation error.
///
/// These are **infrastructure errors** (locking, connectivity, decoding) as
/// opposed to domain errors (validation, lifecycle rules).
///
/// ## Error Categories
///
/// - **Conflict**: the backend aborted the boundary (serialization failure,
///   deadlock victim, unique violation). Safe to retry.
/// - **Unavailable**: the backend could not be reached. Safe to retry.
/// - **Backend**: any other backend failure.
/// - **Corrupt**: a stored record could not be decoded into a domain value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("storage conflict: {0}")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether retrying the whole operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Conflict(_) | StoreError::Unavailable(_))
    }
}

/// One consistency boundary: an isolated unit of work over orders, leads and caps.
///
/// Every mutation performed through a transaction becomes visible to other
/// boundaries only on `commit`. Dropping a transaction without committing
/// rolls back everything it did.
///
/// ## Locking
///
/// - `lock_regions` serializes this boundary against every other boundary
///   that locked any of the same regions, until commit/rollback. Regions are
///   always acquired in canonical (sorted) order by the implementation.
/// - `*_for_update` reads lock the returned rows for the rest of the boundary.
/// - `oldest_unassigned` and `leads_of_order` lock the rows they return.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn lock_regions(&mut self, regions: &[RegionCode]) -> Result<(), StoreError>;

    /// The configured cap, or `None` when the region has no row yet.
    async fn get_cap(&mut self, region: RegionCode) -> Result<Option<i64>, StoreError>;

    async fn upsert_cap(
        &mut self,
        region: RegionCode,
        max_assigned: i64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Number of leads in `region` whose status is `Assigned`.
    async fn count_assigned(&mut self, region: RegionCode) -> Result<i64, StoreError>;

    /// Up to `limit` unassigned leads of `region`, oldest first (ties by id).
    async fn oldest_unassigned(
        &mut self,
        region: RegionCode,
        limit: i64,
    ) -> Result<Vec<Lead>, StoreError>;

    async fn insert_lead(&mut self, lead: &Lead) -> Result<(), StoreError>;

    /// Plain read, no row lock.
    async fn find_lead(&mut self, id: LeadId) -> Result<Option<Lead>, StoreError>;

    async fn lead_for_update(&mut self, id: LeadId) -> Result<Option<Lead>, StoreError>;

    async fn update_lead(&mut self, lead: &Lead) -> Result<(), StoreError>;

    /// Every lead whose back-reference points at `order_id`, oldest first.
    async fn leads_of_order(&mut self, order_id: OrderId) -> Result<Vec<Lead>, StoreError>;

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError>;

    async fn order_for_update(&mut self, id: OrderId) -> Result<Option<Order>, StoreError>;

    async fn update_order(&mut self, order: &Order) -> Result<(), StoreError>;

    async fn delete_order(&mut self, id: OrderId) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Lead/order/cap persistence.
///
/// Mutations go through `begin()`; the remaining methods are committed-state
/// reads that never observe a half-applied boundary.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>, StoreError>;

    async fn find_cap(&self, region: RegionCode) -> Result<Option<i64>, StoreError>;

    async fn list_caps(&self) -> Result<BTreeMap<RegionCode, i64>, StoreError>;

    async fn find_order(&self, id: OrderId) -> Result<Option<OrderWithLeads>, StoreError>;

    /// Newest first.
    async fn list_orders(
        &self,
        filter: &OrderFilter,
        pagination: Pagination,
    ) -> Result<Page<OrderSummary>, StoreError>;

    /// Oldest first (allocation order).
    async fn list_leads(
        &self,
        filter: &LeadFilter,
        pagination: Pagination,
    ) -> Result<Page<Lead>, StoreError>;

    /// Every (fulfilled order × referencing lead) pair in export order.
    async fn fulfilled_rows(&self) -> Result<Vec<FulfilledLeadRow>, StoreError>;
}

#[async_trait]
impl<S> LeadStore for Arc<S>
where
    S: LeadStore + ?Sized,
{
    async fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>, StoreError> {
        (**self).begin().await
    }

    async fn find_cap(&self, region: RegionCode) -> Result<Option<i64>, StoreError> {
        (**self).find_cap(region).await
    }

    async fn list_caps(&self) -> Result<BTreeMap<RegionCode, i64>, StoreError> {
        (**self).list_caps().await
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<OrderWithLeads>, StoreError> {
        (**self).find_order(id).await
    }

    async fn list_orders(
        &self,
        filter: &OrderFilter,
        pagination: Pagination,
    ) -> Result<Page<OrderSummary>, StoreError> {
        (**self).list_orders(filter, pagination).await
    }

    async fn list_leads(
        &self,
        filter: &LeadFilter,
        pagination: Pagination,
    ) -> Result<Page<Lead>, StoreError> {
        (**self).list_leads(filter, pagination).await
    }

    async fn fulfilled_rows(&self) -> Result<Vec<FulfilledLeadRow>, StoreError> {
        (**self).fulfilled_rows().await
    }
}
