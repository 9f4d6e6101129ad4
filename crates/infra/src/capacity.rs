//! Per-region capacity caps.
//!
//! A cap bounds how many leads of a region may be `Assigned` at once;
//! `Fulfilled` leads do not count. Regions without a configured row use the
//! default cap. Zero and negative caps are legal and simply admit nothing.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

use leadflow_core::RegionCode;

use crate::error::EngineError;
use crate::store::LeadStore;

pub struct CapacityRegistry<S: ?Sized> {
    store: Arc<S>,
    default_cap: i64,
}

impl<S: ?Sized> Clone for CapacityRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            default_cap: self.default_cap,
        }
    }
}

impl<S> CapacityRegistry<S>
where
    S: LeadStore + ?Sized,
{
    pub fn new(store: Arc<S>, default_cap: i64) -> Self {
        Self { store, default_cap }
    }

    pub fn default_cap(&self) -> i64 {
        self.default_cap
    }

    /// Effective cap for a possibly unconfigured region.
    pub fn effective(&self, configured: Option<i64>) -> i64 {
        configured.unwrap_or(self.default_cap)
    }

    pub async fn get_cap(&self, region: RegionCode) -> Result<i64, EngineError> {
        let configured = self.store.find_cap(region).await?;
        Ok(self.effective(configured))
    }

    /// Explicitly configured caps only.
    pub async fn get_caps(&self) -> Result<BTreeMap<RegionCode, i64>, EngineError> {
        Ok(self.store.list_caps().await?)
    }

    /// Upsert every entry in one boundary.
    ///
    /// Lowering a cap below the current assigned count is allowed; existing
    /// assignments are kept and new allocations in that region get nothing.
    #[instrument(skip(self, caps), fields(entries = caps.len()), err)]
    pub async fn set_caps(&self, caps: &BTreeMap<RegionCode, i64>) -> Result<(), EngineError> {
        if caps.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let regions: Vec<RegionCode> = caps.keys().copied().collect();

        let mut tx = self.store.begin().await?;
        tx.lock_regions(&regions).await?;
        for (region, cap) in caps {
            tx.upsert_cap(*region, *cap, now).await?;
        }
        tx.commit().await?;

        info!(regions = ?regions, "capacity caps updated");
        Ok(())
    }
}
