use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use leadflow_core::{DomainError, DomainResult, OrderId};

/// Order status lifecycle.
///
/// `Pending --fulfill--> Fulfilled` and `Pending --cancel--> Cancelled`; both
/// targets are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "fulfilled" => Ok(OrderStatus::Fulfilled),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown order status {other:?} (expected one of: pending, fulfilled, cancelled)"
            ))),
        }
    }
}

/// Customer contact details carried by an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CustomerInfo {
    /// Name and email are required; phone is optional.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("customer name is required"));
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(DomainError::validation("customer email is required"));
        }
        if !email.contains('@') {
            return Err(DomainError::validation(format!(
                "customer email {email:?} is malformed"
            )));
        }
        Ok(())
    }
}

/// A customer order.
///
/// Orders do not own leads; leads point back at their order and follow its
/// lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(flatten)]
    pub customer: CustomerInfo,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set iff `status == Fulfilled`.
    pub fulfilled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Place a new pending order after validating the customer.
    pub fn place(id: OrderId, customer: CustomerInfo, now: DateTime<Utc>) -> DomainResult<Self> {
        customer.validate()?;
        Ok(Self {
            id,
            customer,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            fulfilled_at: None,
        })
    }

    /// Rejects any transition out of a terminal status.
    ///
    /// Repeating a transition is a rejection, not a silent success.
    pub fn ensure_pending(&self) -> DomainResult<()> {
        match self.status {
            OrderStatus::Pending => Ok(()),
            OrderStatus::Fulfilled => Err(DomainError::AlreadyFulfilled),
            OrderStatus::Cancelled => Err(DomainError::AlreadyCancelled),
        }
    }

    pub fn fulfill(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_pending()?;
        self.status = OrderStatus::Fulfilled;
        self.fulfilled_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    pub fn cancel(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_pending()?;
        self.status = OrderStatus::Cancelled;
        self.updated_at = at;
        Ok(())
    }
}
