use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, RwLock};

use leadflow_core::{LeadId, OrderId, RegionCode};
use leadflow_leads::{Lead, LeadStatus};
use leadflow_orders::{Order, OrderStatus};

use super::query::{
    FulfilledLeadRow, LeadFilter, OrderFilter, OrderSummary, OrderWithLeads, Page, Pagination,
};
use super::r#trait::{LeadStore, StoreError, StoreTransaction};

type LeadKey = (DateTime<Utc>, LeadId);

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    leads: HashMap<LeadId, Lead>,
    orders: HashMap<OrderId, Order>,
    caps: BTreeMap<RegionCode, i64>,
    /// order id -> leads referencing it, in allocation order.
    by_order: HashMap<OrderId, BTreeSet<LeadKey>>,
    /// region -> unassigned pool, in allocation order.
    unassigned: HashMap<RegionCode, BTreeSet<LeadKey>>,
    assigned: HashMap<RegionCode, i64>,
}

impl StoreState {
    fn put_lead(&mut self, lead: Lead) {
        if let Some(previous) = self.leads.remove(&lead.id) {
            self.unindex(&previous);
        }
        self.index(&lead);
        self.leads.insert(lead.id, lead);
    }

    fn index(&mut self, lead: &Lead) {
        let key = lead.allocation_key();
        if let Some(order_id) = lead.order_id {
            self.by_order.entry(order_id).or_default().insert(key);
        }
        match lead.status {
            LeadStatus::Unassigned => {
                self.unassigned.entry(lead.region).or_default().insert(key);
            }
            LeadStatus::Assigned => *self.assigned.entry(lead.region).or_default() += 1,
            LeadStatus::Fulfilled => {}
        }
    }

    fn unindex(&mut self, lead: &Lead) {
        let key = lead.allocation_key();
        if let Some(order_id) = lead.order_id {
            if let Some(set) = self.by_order.get_mut(&order_id) {
                set.remove(&key);
                if set.is_empty() {
                    self.by_order.remove(&order_id);
                }
            }
        }
        match lead.status {
            LeadStatus::Unassigned => {
                if let Some(pool) = self.unassigned.get_mut(&lead.region) {
                    pool.remove(&key);
                }
            }
            LeadStatus::Assigned => {
                if let Some(count) = self.assigned.get_mut(&lead.region) {
                    *count -= 1;
                }
            }
            LeadStatus::Fulfilled => {}
        }
    }

    fn leads_of(&self, order_id: OrderId) -> Vec<Lead> {
        self.by_order
            .get(&order_id)
            .into_iter()
            .flatten()
            .filter_map(|(_, id)| self.leads.get(id).cloned())
            .collect()
    }

    fn lead_count(&self, order_id: OrderId) -> u64 {
        self.by_order.get(&order_id).map_or(0, |set| set.len() as u64)
    }
}

/// In-memory lead store.
///
/// Intended for tests/dev. A single writer at a time: each transaction holds
/// the writer lock, mutates a private snapshot, and swaps it in on commit.
/// Readers only ever see committed snapshots.
#[derive(Debug, Default)]
pub struct InMemoryLeadStore {
    committed: RwLock<StoreState>,
    writer: tokio::sync::Mutex<()>,
    write_budget: Mutex<Option<usize>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let the next `successful` writes through, then fail the one after with
    /// `StoreError::Backend`. One-shot.
    pub fn fail_after_writes(&self, successful: usize) {
        if let Ok(mut budget) = self.write_budget.lock() {
            *budget = Some(successful);
        }
    }

    fn charge_write(&self) -> Result<(), StoreError> {
        let mut budget = self.write_budget.lock().map_err(|_| poisoned())?;
        match *budget {
            Some(0) => {
                *budget = None;
                Err(StoreError::Backend("injected write failure".to_string()))
            }
            Some(n) => {
                *budget = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> Result<T, StoreError> {
        let state = self.committed.read().map_err(|_| poisoned())?;
        Ok(f(&state))
    }
}

struct InMemoryTransaction<'a> {
    store: &'a InMemoryLeadStore,
    writer: tokio::sync::MutexGuard<'a, ()>,
    staged: StoreState,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction<'_> {
    /// No-op: the writer lock already excludes every other boundary.
    async fn lock_regions(&mut self, _regions: &[RegionCode]) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get_cap(&mut self, region: RegionCode) -> Result<Option<i64>, StoreError> {
        Ok(self.staged.caps.get(&region).copied())
    }

    async fn upsert_cap(
        &mut self,
        region: RegionCode,
        max_assigned: i64,
        _at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.store.charge_write()?;
        self.staged.caps.insert(region, max_assigned);
        Ok(())
    }

    async fn count_assigned(&mut self, region: RegionCode) -> Result<i64, StoreError> {
        Ok(self.staged.assigned.get(&region).copied().unwrap_or(0))
    }

    async fn oldest_unassigned(
        &mut self,
        region: RegionCode,
        limit: i64,
    ) -> Result<Vec<Lead>, StoreError> {
        let take = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .staged
            .unassigned
            .get(&region)
            .into_iter()
            .flatten()
            .take(take)
            .filter_map(|(_, id)| self.staged.leads.get(id).cloned())
            .collect())
    }

    async fn insert_lead(&mut self, lead: &Lead) -> Result<(), StoreError> {
        self.store.charge_write()?;
        if self.staged.leads.contains_key(&lead.id) {
            return Err(StoreError::Conflict(format!("lead {} already exists", lead.id)));
        }
        self.staged.put_lead(lead.clone());
        Ok(())
    }

    async fn find_lead(&mut self, id: LeadId) -> Result<Option<Lead>, StoreError> {
        Ok(self.staged.leads.get(&id).cloned())
    }

    async fn lead_for_update(&mut self, id: LeadId) -> Result<Option<Lead>, StoreError> {
        Ok(self.staged.leads.get(&id).cloned())
    }

    async fn update_lead(&mut self, lead: &Lead) -> Result<(), StoreError> {
        self.store.charge_write()?;
        if !self.staged.leads.contains_key(&lead.id) {
            return Err(StoreError::Backend(format!("lead {} vanished", lead.id)));
        }
        self.staged.put_lead(lead.clone());
        Ok(())
    }

    async fn leads_of_order(&mut self, order_id: OrderId) -> Result<Vec<Lead>, StoreError> {
        Ok(self.staged.leads_of(order_id))
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        self.store.charge_write()?;
        if self.staged.orders.contains_key(&order.id) {
            return Err(StoreError::Conflict(format!("order {} already exists", order.id)));
        }
        self.staged.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn order_for_update(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.staged.orders.get(&id).cloned())
    }

    async fn update_order(&mut self, order: &Order) -> Result<(), StoreError> {
        self.store.charge_write()?;
        match self.staged.orders.get_mut(&order.id) {
            Some(slot) => {
                *slot = order.clone();
                Ok(())
            }
            None => Err(StoreError::Backend(format!("order {} vanished", order.id))),
        }
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<(), StoreError> {
        self.store.charge_write()?;
        if self.staged.lead_count(id) > 0 {
            // Mirrors the foreign key on the Postgres schema.
            return Err(StoreError::Backend(format!(
                "order {id} is still referenced by leads"
            )));
        }
        self.staged.orders.remove(&id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryTransaction {
            store,
            writer,
            staged,
        } = *self;
        let mut committed = store.committed.write().map_err(|_| poisoned())?;
        *committed = staged;
        drop(committed);
        drop(writer);
        Ok(())
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>, StoreError> {
        let writer = self.writer.lock().await;
        let staged = self.read(StoreState::clone)?;
        Ok(Box::new(InMemoryTransaction {
            store: self,
            writer,
            staged,
        }))
    }

    async fn find_cap(&self, region: RegionCode) -> Result<Option<i64>, StoreError> {
        self.read(|s| s.caps.get(&region).copied())
    }

    async fn list_caps(&self) -> Result<BTreeMap<RegionCode, i64>, StoreError> {
        self.read(|s| s.caps.clone())
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<OrderWithLeads>, StoreError> {
        self.read(|s| {
            s.orders.get(&id).map(|order| OrderWithLeads {
                order: order.clone(),
                leads: s.leads_of(id),
            })
        })
    }

    async fn list_orders(
        &self,
        filter: &OrderFilter,
        pagination: Pagination,
    ) -> Result<Page<OrderSummary>, StoreError> {
        self.read(|s| {
            let mut orders: Vec<&Order> =
                s.orders.values().filter(|o| filter.matches(o)).collect();
            orders.sort_by_key(|o| (Reverse(o.created_at), Reverse(o.id)));
            let total = orders.len() as u64;
            let items = pagination
                .window(orders)
                .into_iter()
                .map(|o| OrderSummary {
                    order: o.clone(),
                    lead_count: s.lead_count(o.id),
                })
                .collect();
            Page::new(items, total, pagination)
        })
    }

    async fn list_leads(
        &self,
        filter: &LeadFilter,
        pagination: Pagination,
    ) -> Result<Page<Lead>, StoreError> {
        self.read(|s| {
            let mut leads: Vec<&Lead> = s.leads.values().filter(|l| filter.matches(l)).collect();
            leads.sort_by_key(|l| l.allocation_key());
            let total = leads.len() as u64;
            let items = pagination.window(leads).into_iter().cloned().collect();
            Page::new(items, total, pagination)
        })
    }

    async fn fulfilled_rows(&self) -> Result<Vec<FulfilledLeadRow>, StoreError> {
        self.read(|s| {
            let mut rows: Vec<FulfilledLeadRow> = s
                .orders
                .values()
                .filter(|o| o.status == OrderStatus::Fulfilled)
                .flat_map(|o| {
                    s.leads_of(o.id)
                        .into_iter()
                        .filter_map(move |l| FulfilledLeadRow::from_parts(o, &l))
                })
                .collect();
            rows.sort_by_key(FulfilledLeadRow::export_key);
            rows
        })
    }
}
