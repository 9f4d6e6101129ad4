//! Order lifecycle transitions and their lead cascades.
//!
//! Each operation locks the order row first, applies the pure order
//! transition, then cascades to every lead referencing the order, all inside
//! one boundary. A rejected transition returns before any write.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use leadflow_core::{LeadId, OrderId};
use leadflow_leads::{Lead, LeadStatus};
use leadflow_orders::Order;

use crate::error::EngineError;
use crate::store::LeadStore;

pub struct LifecycleCoordinator<S: ?Sized> {
    store: Arc<S>,
}

impl<S> LifecycleCoordinator<S>
where
    S: LeadStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Pending → Fulfilled; every lead of the order becomes Fulfilled.
    #[instrument(skip(self), fields(order_id = %id), err)]
    pub async fn fulfill_order(&self, id: OrderId) -> Result<Order, EngineError> {
        let now = Utc::now();
        let mut tx = self.store.begin().await?;
        let mut order = tx
            .order_for_update(id)
            .await?
            .ok_or_else(|| EngineError::order_not_found(id))?;

        order.fulfill(now)?;
        tx.update_order(&order).await?;

        let leads = tx.leads_of_order(id).await?;
        for mut lead in leads.iter().cloned() {
            lead.fulfill(now);
            tx.update_lead(&lead).await?;
        }
        tx.commit().await?;

        info!(order_id = %id, leads = leads.len(), "order fulfilled");
        Ok(order)
    }

    /// Pending → Cancelled; every lead of the order returns to stock.
    #[instrument(skip(self), fields(order_id = %id), err)]
    pub async fn cancel_order(&self, id: OrderId) -> Result<Order, EngineError> {
        let now = Utc::now();
        let mut tx = self.store.begin().await?;
        let mut order = tx
            .order_for_update(id)
            .await?
            .ok_or_else(|| EngineError::order_not_found(id))?;

        order.cancel(now)?;
        tx.update_order(&order).await?;
        let released = release_all(tx.as_mut(), id, now).await?;
        tx.commit().await?;

        info!(order_id = %id, released, "order cancelled");
        Ok(order)
    }

    /// Remove the order in any status; every lead of the order returns to
    /// stock first.
    #[instrument(skip(self), fields(order_id = %id), err)]
    pub async fn delete_order(&self, id: OrderId) -> Result<(), EngineError> {
        let now = Utc::now();
        let mut tx = self.store.begin().await?;
        let order = tx
            .order_for_update(id)
            .await?
            .ok_or_else(|| EngineError::order_not_found(id))?;

        let released = release_all(tx.as_mut(), id, now).await?;
        tx.delete_order(id).await?;
        tx.commit().await?;

        info!(order_id = %id, status = %order.status, released, "order deleted");
        Ok(())
    }

    /// Manual status override.
    ///
    /// The order reference is left as is and the owning order's status is not
    /// consulted, so the result may disagree with the order (e.g. an
    /// `Unassigned` lead still pointing at a fulfilled order). Such a lead is
    /// back in the pool and will be picked up by the next allocation in its
    /// region. Setting `Assigned` is not checked against the region cap.
    #[instrument(skip(self, status), fields(lead_id = %id, status = %status), err)]
    pub async fn update_lead_status(&self, id: LeadId, status: &str) -> Result<Lead, EngineError> {
        let status: LeadStatus = status.parse()?;
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let region = tx
            .find_lead(id)
            .await?
            .ok_or_else(|| EngineError::lead_not_found(id))?
            .region;
        tx.lock_regions(&[region]).await?;
        let mut lead = tx
            .lead_for_update(id)
            .await?
            .ok_or_else(|| EngineError::lead_not_found(id))?;

        let previous = lead.status;
        lead.override_status(status, now);
        tx.update_lead(&lead).await?;
        tx.commit().await?;

        warn!(
            lead_id = %id,
            from = %previous,
            to = %status,
            order_id = ?lead.order_id,
            consistent = lead.is_consistent(),
            "lead status overridden manually"
        );
        Ok(lead)
    }
}

async fn release_all(
    tx: &mut (dyn crate::store::StoreTransaction + '_),
    order_id: OrderId,
    now: chrono::DateTime<Utc>,
) -> Result<usize, EngineError> {
    let leads = tx.leads_of_order(order_id).await?;
    for mut lead in leads.iter().cloned() {
        lead.release(now);
        tx.update_lead(&lead).await?;
    }
    Ok(leads.len())
}
