//! Read-side query types shared by every store backend.
//!
//! These are pure reads; they never open a mutating boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use leadflow_core::{DomainError, LeadId, OrderId, RegionCode};
use leadflow_leads::{Lead, LeadStatus};
use leadflow_orders::{Order, OrderStatus};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 500;

/// Pagination parameters (limit/offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of records to return.
    pub limit: u32,
    /// Offset for pagination (0-based).
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl Pagination {
    /// Build from a 1-based page number and a page size.
    ///
    /// `page_size` is clamped to `1..=MAX_PAGE_SIZE`; `page = 0` is rejected.
    pub fn page(page: u32, page_size: u32) -> Result<Self, DomainError> {
        if page == 0 {
            return Err(DomainError::validation("page numbers start at 1"));
        }
        let limit = page_size.clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1).saturating_mul(limit);
        Ok(Self { limit, offset })
    }

    /// Page from optional query parameters, falling back to the defaults.
    pub fn from_query(page: Option<u32>, page_size: Option<u32>) -> Result<Self, DomainError> {
        Self::page(page.unwrap_or(1), page_size.unwrap_or(DEFAULT_PAGE_SIZE))
    }

    pub(crate) fn window<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

/// One page of results plus the total across all pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub pagination: Pagination,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        let has_more = total > u64::from(pagination.offset) + u64::from(pagination.limit);
        Self {
            items,
            total,
            pagination,
            has_more,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|s| order.status == s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub region: Option<RegionCode>,
}

impl LeadFilter {
    pub fn matches(&self, lead: &Lead) -> bool {
        self.status.is_none_or(|s| lead.status == s) && self.region.is_none_or(|r| lead.region == r)
    }
}

/// Order listing entry; `lead_count` is derived from the lead back-references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    pub lead_count: u64,
}

/// An order with every lead currently referencing it (oldest first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithLeads {
    #[serde(flatten)]
    pub order: Order,
    pub leads: Vec<Lead>,
}

/// One (fulfilled order × lead) export row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfilledLeadRow {
    pub order_id: OrderId,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub order_created_at: DateTime<Utc>,
    pub fulfilled_at: DateTime<Utc>,
    pub lead_id: LeadId,
    pub lead_name: String,
    pub lead_email: Option<String>,
    pub lead_phone: Option<String>,
    pub region: RegionCode,
    pub lead_created_at: DateTime<Utc>,
}

impl FulfilledLeadRow {
    /// Returns `None` unless the order is fulfilled.
    pub fn from_parts(order: &Order, lead: &Lead) -> Option<Self> {
        let fulfilled_at = order.fulfilled_at.filter(|_| order.status == OrderStatus::Fulfilled)?;
        Some(Self {
            order_id: order.id,
            customer_name: order.customer.name.clone(),
            customer_email: order.customer.email.clone(),
            customer_phone: order.customer.phone.clone(),
            order_created_at: order.created_at,
            fulfilled_at,
            lead_id: lead.id,
            lead_name: lead.contact.name.clone(),
            lead_email: lead.contact.email.clone(),
            lead_phone: lead.contact.phone.clone(),
            region: lead.region,
            lead_created_at: lead.created_at,
        })
    }

    /// Export ordering: fulfillment time descending, then order id, then lead age.
    pub fn export_key(&self) -> (std::cmp::Reverse<DateTime<Utc>>, OrderId, DateTime<Utc>, LeadId) {
        (
            std::cmp::Reverse(self.fulfilled_at),
            self.order_id,
            self.lead_created_at,
            self.lead_id,
        )
    }
}
