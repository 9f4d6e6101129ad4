//! Lead intake: single creation and atomic bulk seeding.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use leadflow_core::LeadId;
use leadflow_leads::{Lead, NewLead};

use crate::error::EngineError;
use crate::store::LeadStore;

pub struct LeadIntake<S: ?Sized> {
    store: Arc<S>,
}

impl<S> LeadIntake<S>
where
    S: LeadStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, new), fields(region = %new.region), err)]
    pub async fn create_lead(&self, new: NewLead) -> Result<Lead, EngineError> {
        let mut created = self.seed_leads(vec![new]).await?;
        created
            .pop()
            .ok_or_else(|| EngineError::Validation("no lead created".to_string()))
    }

    /// Insert every lead or none. All input is validated before the boundary
    /// opens.
    #[instrument(skip(self, batch), fields(count = batch.len()), err)]
    pub async fn seed_leads(&self, batch: Vec<NewLead>) -> Result<Vec<Lead>, EngineError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let now = Utc::now();
        let leads = batch
            .into_iter()
            .map(|new| Lead::register(LeadId::new(), new, now))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.store.begin().await?;
        for lead in &leads {
            tx.insert_lead(lead).await?;
        }
        tx.commit().await?;

        info!(count = leads.len(), "leads registered");
        Ok(leads)
    }
}
