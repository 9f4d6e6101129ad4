//! Postgres-backed lead store.
//!
//! Each `StoreTransaction` is one Postgres transaction at READ COMMITTED.
//! Capacity is protected by per-region transaction-scoped advisory locks;
//! order and lead rows are protected by `SELECT ... FOR UPDATE`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (serialization failure) | `40001` | `Conflict` | Boundary aborted by the server |
//! | Database (deadlock detected) | `40P01` | `Conflict` | Boundary chosen as deadlock victim |
//! | Database (unique violation) | `23505` | `Conflict` | Duplicate id |
//! | Database (foreign key violation) | `23503` | `Backend` | Order still referenced by leads |
//! | Database (check constraint violation) | `23514` | `Backend` | Invalid status/timestamp combination |
//! | Database (other) | Any other | `Backend` | Other database errors |
//! | PoolClosed / PoolTimedOut / Io | N/A | `Unavailable` | Backend unreachable |
//! | Other | N/A | `Backend` | Anything else |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{Span, instrument};
use uuid::Uuid;

use leadflow_core::{LeadId, OrderId, RegionCode};
use leadflow_leads::{ContactInfo, Lead, LeadStatus};
use leadflow_orders::{CustomerInfo, Order, OrderStatus};

use super::query::{
    FulfilledLeadRow, LeadFilter, OrderFilter, OrderSummary, OrderWithLeads, Page, Pagination,
};
use super::r#trait::{LeadStore, StoreError, StoreTransaction};

/// Schema applied by [`PostgresLeadStore::migrate`].
pub const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

/// First key of the two-key advisory lock; the second is `hashtext(region)`.
const REGION_LOCK_CLASS: i32 = 0x4c46; // "LF"

/// Postgres-backed lead store.
///
/// `Send + Sync`; all state lives in the connection pool.
#[derive(Debug, Clone)]
pub struct PostgresLeadStore {
    pool: Arc<PgPool>,
}

impl PostgresLeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect with a small pool sized for a single service instance.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the schema. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    /// A read-only snapshot so multi-statement reads agree with each other.
    async fn snapshot(&self, operation: &str) -> Result<Transaction<'static, Postgres>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        Ok(tx)
    }
}

/// One Postgres transaction. Dropping it without `commit` rolls back.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    #[instrument(skip(self), err)]
    async fn lock_regions(&mut self, regions: &[RegionCode]) -> Result<(), StoreError> {
        let mut ordered = regions.to_vec();
        ordered.sort();
        ordered.dedup();
        for region in ordered {
            sqlx::query("SELECT pg_advisory_xact_lock($1, hashtext($2))")
                .bind(REGION_LOCK_CLASS)
                .bind(region.as_str())
                .execute(&mut *self.tx)
                .await
                .map_err(|e| map_sqlx_error("lock_regions", e))?;
        }
        Ok(())
    }

    async fn get_cap(&mut self, region: RegionCode) -> Result<Option<i64>, StoreError> {
        let row = sqlx::query("SELECT max_assigned FROM region_caps WHERE region = $1")
            .bind(region.as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("get_cap", e))?;
        row.map(|r| r.try_get::<i64, _>("max_assigned"))
            .transpose()
            .map_err(|e| map_sqlx_error("get_cap", e))
    }

    async fn upsert_cap(
        &mut self,
        region: RegionCode,
        max_assigned: i64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO region_caps (region, max_assigned, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (region) DO UPDATE
            SET max_assigned = EXCLUDED.max_assigned, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(region.as_str())
        .bind(max_assigned)
        .bind(at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("upsert_cap", e))?;
        Ok(())
    }

    async fn count_assigned(&mut self, region: RegionCode) -> Result<i64, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS assigned FROM leads WHERE region = $1 AND status = 'assigned'",
        )
        .bind(region.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("count_assigned", e))?;
        row.try_get::<i64, _>("assigned")
            .map_err(|e| map_sqlx_error("count_assigned", e))
    }

    #[instrument(skip(self), fields(picked = tracing::field::Empty), err)]
    async fn oldest_unassigned(
        &mut self,
        region: RegionCode,
        limit: i64,
    ) -> Result<Vec<Lead>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, phone, region, status, order_id, created_at, updated_at
            FROM leads
            WHERE region = $1 AND status = 'unassigned'
            ORDER BY created_at ASC, id ASC
            LIMIT $2
            FOR UPDATE
            "#,
        )
        .bind(region.as_str())
        .bind(limit.max(0))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("oldest_unassigned", e))?;

        let leads = decode_leads(&rows)?;
        Span::current().record("picked", leads.len());
        Ok(leads)
    }

    async fn insert_lead(&mut self, lead: &Lead) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO leads (id, name, email, phone, region, status, order_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(lead.id.as_uuid())
        .bind(&lead.contact.name)
        .bind(lead.contact.email.as_deref())
        .bind(lead.contact.phone.as_deref())
        .bind(lead.region.as_str())
        .bind(lead.status.as_str())
        .bind(lead.order_id.map(Uuid::from))
        .bind(lead.created_at)
        .bind(lead.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_lead", e))?;
        Ok(())
    }

    async fn find_lead(&mut self, id: LeadId) -> Result<Option<Lead>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, phone, region, status, order_id, created_at, updated_at
            FROM leads WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_lead", e))?;
        row.as_ref().map(decode_lead).transpose()
    }

    async fn lead_for_update(&mut self, id: LeadId) -> Result<Option<Lead>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, phone, region, status, order_id, created_at, updated_at
            FROM leads WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("lead_for_update", e))?;
        row.as_ref().map(decode_lead).transpose()
    }

    async fn update_lead(&mut self, lead: &Lead) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE leads SET status = $2, order_id = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(lead.id.as_uuid())
        .bind(lead.status.as_str())
        .bind(lead.order_id.map(Uuid::from))
        .bind(lead.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_lead", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Backend(format!("lead {} vanished", lead.id)));
        }
        Ok(())
    }

    async fn leads_of_order(&mut self, order_id: OrderId) -> Result<Vec<Lead>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, phone, region, status, order_id, created_at, updated_at
            FROM leads
            WHERE order_id = $1
            ORDER BY created_at ASC, id ASC
            FOR UPDATE
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("leads_of_order", e))?;
        decode_leads(&rows)
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO orders
                (id, customer_name, customer_email, customer_phone, status, created_at, updated_at, fulfilled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.customer.name)
        .bind(&order.customer.email)
        .bind(order.customer.phone.as_deref())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.fulfilled_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;
        Ok(())
    }

    async fn order_for_update(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, customer_name, customer_email, customer_phone, status, created_at, updated_at, fulfilled_at
            FROM orders WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("order_for_update", e))?;
        row.as_ref().map(decode_order).transpose()
    }

    async fn update_order(&mut self, order: &Order) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE orders SET status = $2, updated_at = $3, fulfilled_at = $4 WHERE id = $1",
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.updated_at)
        .bind(order.fulfilled_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_order", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Backend(format!("order {} vanished", order.id)));
        }
        Ok(())
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_order", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }
}

#[async_trait]
impl LeadStore for PostgresLeadStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PostgresTransaction { tx }))
    }

    async fn find_cap(&self, region: RegionCode) -> Result<Option<i64>, StoreError> {
        let row = sqlx::query("SELECT max_assigned FROM region_caps WHERE region = $1")
            .bind(region.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_cap", e))?;
        row.map(|r| r.try_get::<i64, _>("max_assigned"))
            .transpose()
            .map_err(|e| map_sqlx_error("find_cap", e))
    }

    async fn list_caps(&self) -> Result<BTreeMap<RegionCode, i64>, StoreError> {
        let rows = sqlx::query("SELECT region, max_assigned FROM region_caps ORDER BY region")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_caps", e))?;

        let mut caps = BTreeMap::new();
        for row in rows {
            let region: String = row.try_get("region").map_err(|e| map_sqlx_error("list_caps", e))?;
            let cap: i64 = row
                .try_get("max_assigned")
                .map_err(|e| map_sqlx_error("list_caps", e))?;
            caps.insert(parse_region(&region)?, cap);
        }
        Ok(caps)
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn find_order(&self, id: OrderId) -> Result<Option<OrderWithLeads>, StoreError> {
        let mut tx = self.snapshot("find_order").await?;

        let row = sqlx::query(
            r#"
            SELECT id, customer_name, customer_email, customer_phone, status, created_at, updated_at, fulfilled_at
            FROM orders WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("find_order", e))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let order = decode_order(&row)?;

        let rows = sqlx::query(
            r#"
            SELECT id, name, email, phone, region, status, order_id, created_at, updated_at
            FROM leads
            WHERE order_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("find_order", e))?;
        let leads = decode_leads(&rows)?;

        tx.commit().await.map_err(|e| map_sqlx_error("find_order", e))?;
        Ok(Some(OrderWithLeads { order, leads }))
    }

    #[instrument(skip(self, pagination), fields(limit = pagination.limit, offset = pagination.offset), err)]
    async fn list_orders(
        &self,
        filter: &OrderFilter,
        pagination: Pagination,
    ) -> Result<Page<OrderSummary>, StoreError> {
        let status = filter.status.map(|s| s.as_str());
        let mut tx = self.snapshot("list_orders").await?;

        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM orders WHERE ($1::text IS NULL OR status = $1)")
            .bind(status)
            .fetch_one(&mut *tx)
            .await
            .and_then(|r| r.try_get("total"))
            .map_err(|e| map_sqlx_error("list_orders", e))?;

        let rows = sqlx::query(
            r#"
            SELECT o.id, o.customer_name, o.customer_email, o.customer_phone, o.status,
                   o.created_at, o.updated_at, o.fulfilled_at,
                   (SELECT COUNT(*) FROM leads l WHERE l.order_id = o.id) AS lead_count
            FROM orders o
            WHERE ($1::text IS NULL OR o.status = $1)
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(i64::from(pagination.limit))
        .bind(i64::from(pagination.offset))
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let lead_count: i64 = row
                .try_get("lead_count")
                .map_err(|e| map_sqlx_error("list_orders", e))?;
            items.push(OrderSummary {
                order: decode_order(row)?,
                lead_count: lead_count.max(0) as u64,
            });
        }

        tx.commit().await.map_err(|e| map_sqlx_error("list_orders", e))?;
        Ok(Page::new(items, total.max(0) as u64, pagination))
    }

    #[instrument(skip(self, pagination), fields(limit = pagination.limit, offset = pagination.offset), err)]
    async fn list_leads(
        &self,
        filter: &LeadFilter,
        pagination: Pagination,
    ) -> Result<Page<Lead>, StoreError> {
        let status = filter.status.map(|s| s.as_str());
        let region = filter.region.map(|r| r.as_str().to_string());
        let mut tx = self.snapshot("list_leads").await?;

        let total: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS total FROM leads
            WHERE ($1::text IS NULL OR status = $1) AND ($2::text IS NULL OR region = $2)
            "#,
        )
        .bind(status)
        .bind(region.as_deref())
        .fetch_one(&mut *tx)
        .await
        .and_then(|r| r.try_get("total"))
        .map_err(|e| map_sqlx_error("list_leads", e))?;

        let rows = sqlx::query(
            r#"
            SELECT id, name, email, phone, region, status, order_id, created_at, updated_at
            FROM leads
            WHERE ($1::text IS NULL OR status = $1) AND ($2::text IS NULL OR region = $2)
            ORDER BY created_at ASC, id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status)
        .bind(region.as_deref())
        .bind(i64::from(pagination.limit))
        .bind(i64::from(pagination.offset))
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("list_leads", e))?;
        let items = decode_leads(&rows)?;

        tx.commit().await.map_err(|e| map_sqlx_error("list_leads", e))?;
        Ok(Page::new(items, total.max(0) as u64, pagination))
    }

    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    async fn fulfilled_rows(&self) -> Result<Vec<FulfilledLeadRow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT o.id AS order_id, o.customer_name, o.customer_email, o.customer_phone,
                   o.created_at AS order_created_at, o.fulfilled_at,
                   l.id AS lead_id, l.name AS lead_name, l.email AS lead_email,
                   l.phone AS lead_phone, l.region, l.created_at AS lead_created_at
            FROM orders o
            JOIN leads l ON l.order_id = o.id
            WHERE o.status = 'fulfilled'
            ORDER BY o.fulfilled_at DESC, o.id ASC, l.created_at ASC, l.id ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fulfilled_rows", e))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let r = FulfilledRow::from_row(row).map_err(|e| map_sqlx_error("fulfilled_rows", e))?;
            out.push(r.into_export_row()?);
        }
        Span::current().record("row_count", out.len());
        Ok(out)
    }
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // serialization_failure, deadlock_detected, unique_violation
                Some("40001") | Some("40P01") | Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("{operation}: {err}"))
        }
        sqlx::Error::RowNotFound => {
            StoreError::Backend(format!("unexpected row not found in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn parse_region(raw: &str) -> Result<RegionCode, StoreError> {
    RegionCode::parse(raw).map_err(|e| StoreError::Corrupt(format!("region {raw:?}: {e}")))
}

fn decode_lead(row: &PgRow) -> Result<Lead, StoreError> {
    LeadRow::from_row(row)
        .map_err(|e| StoreError::Corrupt(format!("failed to deserialize lead row: {}", e)))?
        .into_lead()
}

fn decode_leads(rows: &[PgRow]) -> Result<Vec<Lead>, StoreError> {
    rows.iter().map(decode_lead).collect()
}

fn decode_order(row: &PgRow) -> Result<Order, StoreError> {
    OrderRow::from_row(row)
        .map_err(|e| StoreError::Corrupt(format!("failed to deserialize order row: {}", e)))?
        .into_order()
}

// SQLx row types

struct LeadRow {
    id: Uuid,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    region: String,
    status: String,
    order_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for LeadRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(LeadRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            region: row.try_get("region")?,
            status: row.try_get("status")?,
            order_id: row.try_get("order_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl LeadRow {
    fn into_lead(self) -> Result<Lead, StoreError> {
        let status: LeadStatus = self
            .status
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("lead {}: {e}", self.id)))?;
        Ok(Lead {
            id: LeadId::from_uuid(self.id),
            contact: ContactInfo {
                name: self.name,
                email: self.email,
                phone: self.phone,
            },
            region: parse_region(&self.region)?,
            status,
            order_id: self.order_id.map(OrderId::from_uuid),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

struct OrderRow {
    id: Uuid,
    customer_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    fulfilled_at: Option<DateTime<Utc>>,
}

impl<'r> FromRow<'r, PgRow> for OrderRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(OrderRow {
            id: row.try_get("id")?,
            customer_name: row.try_get("customer_name")?,
            customer_email: row.try_get("customer_email")?,
            customer_phone: row.try_get("customer_phone")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            fulfilled_at: row.try_get("fulfilled_at")?,
        })
    }
}

impl OrderRow {
    fn into_order(self) -> Result<Order, StoreError> {
        let status: OrderStatus = self
            .status
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("order {}: {e}", self.id)))?;
        Ok(Order {
            id: OrderId::from_uuid(self.id),
            customer: CustomerInfo {
                name: self.customer_name,
                email: self.customer_email,
                phone: self.customer_phone,
            },
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            fulfilled_at: self.fulfilled_at,
        })
    }
}

struct FulfilledRow {
    order_id: Uuid,
    customer_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    order_created_at: DateTime<Utc>,
    fulfilled_at: DateTime<Utc>,
    lead_id: Uuid,
    lead_name: String,
    lead_email: Option<String>,
    lead_phone: Option<String>,
    region: String,
    lead_created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for FulfilledRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(FulfilledRow {
            order_id: row.try_get("order_id")?,
            customer_name: row.try_get("customer_name")?,
            customer_email: row.try_get("customer_email")?,
            customer_phone: row.try_get("customer_phone")?,
            order_created_at: row.try_get("order_created_at")?,
            fulfilled_at: row.try_get("fulfilled_at")?,
            lead_id: row.try_get("lead_id")?,
            lead_name: row.try_get("lead_name")?,
            lead_email: row.try_get("lead_email")?,
            lead_phone: row.try_get("lead_phone")?,
            region: row.try_get("region")?,
            lead_created_at: row.try_get("lead_created_at")?,
        })
    }
}

impl FulfilledRow {
    fn into_export_row(self) -> Result<FulfilledLeadRow, StoreError> {
        Ok(FulfilledLeadRow {
            order_id: OrderId::from_uuid(self.order_id),
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            order_created_at: self.order_created_at,
            fulfilled_at: self.fulfilled_at,
            lead_id: LeadId::from_uuid(self.lead_id),
            lead_name: self.lead_name,
            lead_email: self.lead_email,
            lead_phone: self.lead_phone,
            region: parse_region(&self.region)?,
            lead_created_at: self.lead_created_at,
        })
    }
}
