use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use leadflow_core::{DomainError, DomainResult, LeadId, OrderId, RegionCode};

/// Lead status lifecycle.
///
/// `Unassigned --allocate--> Assigned --fulfill--> Fulfilled`, with
/// `Assigned --release--> Unassigned` when the owning order is cancelled or
/// deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    Unassigned,
    Assigned,
    Fulfilled,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 3] = [
        LeadStatus::Unassigned,
        LeadStatus::Assigned,
        LeadStatus::Fulfilled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Unassigned => "unassigned",
            LeadStatus::Assigned => "assigned",
            LeadStatus::Fulfilled => "fulfilled",
        }
    }
}

impl core::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for LeadStatus {
    type Err = DomainError;

    /// Case-insensitive; anything outside the three legal values is `InvalidStatus`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LeadStatus::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                DomainError::invalid_status(format!(
                    "{wanted:?} (expected one of: unassigned, assigned, fulfilled)"
                ))
            })
    }
}

/// Contact details of a lead. Opaque to the allocation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Input for lead intake (standalone creation or bulk seeding).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
    #[serde(flatten)]
    pub contact: ContactInfo,
    pub region: RegionCode,
    /// Explicit creation time (seeding/imports). Defaults to "now".
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A single sales lead.
///
/// `order_id` is a non-owning back-reference to the order holding the lead.
/// Coordinated transitions keep `order_id.is_some() == (status != Unassigned)`;
/// only `override_status` may break that (see its docs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    #[serde(flatten)]
    pub contact: ContactInfo,
    pub region: RegionCode,
    pub status: LeadStatus,
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Register a new, unassigned lead.
    pub fn register(id: LeadId, new: NewLead, now: DateTime<Utc>) -> DomainResult<Self> {
        if new.contact.name.trim().is_empty() {
            return Err(DomainError::validation("lead name cannot be empty"));
        }
        let created_at = new.created_at.unwrap_or(now);
        Ok(Self {
            id,
            contact: new.contact,
            region: new.region,
            status: LeadStatus::Unassigned,
            order_id: None,
            created_at,
            updated_at: created_at.max(now),
        })
    }

    /// Allocation ordering key: oldest first, ties broken by id ascending.
    pub fn allocation_key(&self) -> (DateTime<Utc>, LeadId) {
        (self.created_at, self.id)
    }

    pub fn is_unassigned(&self) -> bool {
        self.status == LeadStatus::Unassigned
    }

    /// Whether the status and the order reference agree.
    pub fn is_consistent(&self) -> bool {
        self.order_id.is_some() == (self.status != LeadStatus::Unassigned)
    }

    /// Unassigned → Assigned, attached to `order_id`.
    ///
    /// A stale reference left behind by `override_status` is overwritten.
    pub fn assign_to(&mut self, order_id: OrderId, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status != LeadStatus::Unassigned {
            return Err(DomainError::invariant(format!(
                "lead {} is {} and cannot be allocated",
                self.id, self.status
            )));
        }
        self.status = LeadStatus::Assigned;
        self.order_id = Some(order_id);
        self.updated_at = at;
        Ok(())
    }

    /// Cascade of an order fulfillment. The order reference is kept.
    pub fn fulfill(&mut self, at: DateTime<Utc>) {
        self.status = LeadStatus::Fulfilled;
        self.updated_at = at;
    }

    /// Cascade of an order cancellation/deletion: back to stock.
    pub fn release(&mut self, at: DateTime<Utc>) {
        self.status = LeadStatus::Unassigned;
        self.order_id = None;
        self.updated_at = at;
    }

    /// Manual status correction.
    ///
    /// Deliberately uncoordinated: the order reference is left untouched and
    /// the owning order's status is not consulted, so e.g. a lead of a
    /// fulfilled order can be returned to `Unassigned` while still pointing at
    /// that order. Callers use this only for out-of-band corrections.
    pub fn override_status(&mut self, status: LeadStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }
}
