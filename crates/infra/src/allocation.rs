//! Order creation with lead allocation.
//!
//! ```text
//! create_order
//!   ↓
//! 1. Validate customer, place Pending order
//!   ↓
//! 2. begin boundary, insert order, lock every touched region (sorted)
//!   ↓
//! 3. per region, in caller order:
//!      headroom = max(0, cap - assigned); take = min(headroom, batch_limit)
//!      assign the `take` oldest unassigned leads to the order
//!   ↓
//! 4. commit
//! ```
//!
//! Because the region locks are held from before the first count until
//! commit, two orders competing for the same region never both see the same
//! headroom.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{Span, debug, info, instrument};

use leadflow_core::{OrderId, RegionCode};
use leadflow_leads::Lead;
use leadflow_orders::{CustomerInfo, Order};

use crate::capacity::CapacityRegistry;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::store::LeadStore;

/// Input for `create_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(flatten)]
    pub customer: CustomerInfo,
    /// Regions in allocation order; empty means "use the configured defaults".
    #[serde(default)]
    pub regions: Vec<RegionCode>,
    /// Per-call override of the configured batch limit.
    #[serde(default)]
    pub batch_limit: Option<i64>,
}

impl OrderRequest {
    pub fn new(customer: CustomerInfo, regions: Vec<RegionCode>) -> Self {
        Self {
            customer,
            regions,
            batch_limit: None,
        }
    }
}

/// Result of `create_order`: the order and every lead assigned to it, in
/// allocation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub order: Order,
    pub assigned_leads: Vec<Lead>,
}

/// How many leads a region may contribute to one order.
pub fn slots_to_assign(cap: i64, assigned: i64, batch_limit: i64) -> i64 {
    cap.saturating_sub(assigned).max(0).min(batch_limit.max(0))
}

pub struct AllocationEngine<S: ?Sized> {
    store: Arc<S>,
    capacity: CapacityRegistry<S>,
    config: Arc<EngineConfig>,
}

impl<S> AllocationEngine<S>
where
    S: LeadStore + ?Sized,
{
    pub fn new(store: Arc<S>, capacity: CapacityRegistry<S>, config: Arc<EngineConfig>) -> Self {
        Self {
            store,
            capacity,
            config,
        }
    }

    fn resolve_regions(&self, requested: Vec<RegionCode>) -> Vec<RegionCode> {
        if requested.is_empty() {
            self.config.default_regions.clone()
        } else {
            requested
        }
    }

    #[instrument(
        skip(self, request),
        fields(order_id = tracing::field::Empty, regions = ?request.regions, assigned = tracing::field::Empty),
        err
    )]
    pub async fn create_order(&self, request: OrderRequest) -> Result<Allocation, EngineError> {
        let now = Utc::now();
        let order = Order::place(OrderId::new(), request.customer, now)?;
        let regions = self.resolve_regions(request.regions);
        let batch_limit = request.batch_limit.unwrap_or(self.config.batch_limit);
        Span::current().record("order_id", tracing::field::display(order.id));

        let mut tx = self.store.begin().await?;
        tx.insert_order(&order).await?;
        tx.lock_regions(&regions).await?;

        let mut assigned = Vec::new();
        for region in &regions {
            let cap = self.capacity.effective(tx.get_cap(*region).await?);
            let current = tx.count_assigned(*region).await?;
            let take = slots_to_assign(cap, current, batch_limit);
            debug!(region = %region, cap, current, take, "region headroom");
            if take == 0 {
                continue;
            }
            for mut lead in tx.oldest_unassigned(*region, take).await? {
                lead.assign_to(order.id, now)?;
                tx.update_lead(&lead).await?;
                assigned.push(lead);
            }
        }

        tx.commit().await?;

        Span::current().record("assigned", assigned.len());
        info!(order_id = %order.id, assigned = assigned.len(), "order created");
        Ok(Allocation {
            order,
            assigned_leads: assigned,
        })
    }
}
