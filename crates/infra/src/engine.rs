//! The engine facade: one handle over capacity, allocation, lifecycle,
//! intake and read queries, sharing a single store.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

use leadflow_core::{LeadId, OrderId, RegionCode};
use leadflow_leads::{Lead, NewLead};
use leadflow_orders::Order;

use crate::allocation::{Allocation, AllocationEngine, OrderRequest};
use crate::capacity::CapacityRegistry;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::intake::LeadIntake;
use crate::lifecycle::LifecycleCoordinator;
use crate::store::{
    FulfilledLeadRow, LeadFilter, LeadStore, OrderFilter, OrderSummary, OrderWithLeads, Page,
    Pagination,
};

pub struct LeadEngine<S: ?Sized> {
    store: Arc<S>,
    config: Arc<EngineConfig>,
    capacity: CapacityRegistry<S>,
    allocation: AllocationEngine<S>,
    lifecycle: LifecycleCoordinator<S>,
    intake: LeadIntake<S>,
}

impl<S> LeadEngine<S>
where
    S: LeadStore + ?Sized,
{
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        let config = Arc::new(config);
        let capacity = CapacityRegistry::new(Arc::clone(&store), config.default_cap);
        Self {
            allocation: AllocationEngine::new(
                Arc::clone(&store),
                capacity.clone(),
                Arc::clone(&config),
            ),
            lifecycle: LifecycleCoordinator::new(Arc::clone(&store)),
            intake: LeadIntake::new(Arc::clone(&store)),
            capacity,
            config,
            store,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn capacity(&self) -> &CapacityRegistry<S> {
        &self.capacity
    }

    // Mutations

    pub async fn create_order(&self, request: OrderRequest) -> Result<Allocation, EngineError> {
        self.allocation.create_order(request).await
    }

    pub async fn fulfill_order(&self, id: OrderId) -> Result<Order, EngineError> {
        self.lifecycle.fulfill_order(id).await
    }

    pub async fn cancel_order(&self, id: OrderId) -> Result<Order, EngineError> {
        self.lifecycle.cancel_order(id).await
    }

    pub async fn delete_order(&self, id: OrderId) -> Result<(), EngineError> {
        self.lifecycle.delete_order(id).await
    }

    pub async fn update_lead_status(&self, id: LeadId, status: &str) -> Result<Lead, EngineError> {
        self.lifecycle.update_lead_status(id, status).await
    }

    pub async fn create_lead(&self, new: NewLead) -> Result<Lead, EngineError> {
        self.intake.create_lead(new).await
    }

    pub async fn seed_leads(&self, batch: Vec<NewLead>) -> Result<Vec<Lead>, EngineError> {
        self.intake.seed_leads(batch).await
    }

    pub async fn set_caps(&self, caps: &BTreeMap<RegionCode, i64>) -> Result<(), EngineError> {
        self.capacity.set_caps(caps).await
    }

    // Reads

    pub async fn get_cap(&self, region: RegionCode) -> Result<i64, EngineError> {
        self.capacity.get_cap(region).await
    }

    pub async fn get_caps(&self) -> Result<BTreeMap<RegionCode, i64>, EngineError> {
        self.capacity.get_caps().await
    }

    #[instrument(skip(self), err)]
    pub async fn list_orders(
        &self,
        filter: &OrderFilter,
        pagination: Pagination,
    ) -> Result<Page<OrderSummary>, EngineError> {
        Ok(self.store.list_orders(filter, pagination).await?)
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    pub async fn get_order(&self, id: OrderId) -> Result<OrderWithLeads, EngineError> {
        self.store
            .find_order(id)
            .await?
            .ok_or_else(|| EngineError::order_not_found(id))
    }

    #[instrument(skip(self), err)]
    pub async fn list_leads(
        &self,
        filter: &LeadFilter,
        pagination: Pagination,
    ) -> Result<Page<Lead>, EngineError> {
        Ok(self.store.list_leads(filter, pagination).await?)
    }

    /// One row per lead of every fulfilled order, newest fulfillment first.
    #[instrument(skip(self), err)]
    pub async fn export_fulfilled_orders(&self) -> Result<Vec<FulfilledLeadRow>, EngineError> {
        Ok(self.store.fulfilled_rows().await?)
    }
}
