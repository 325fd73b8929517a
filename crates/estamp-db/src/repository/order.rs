//! # Order Repository
//!
//! Persistence for the `StampOrder` aggregate.
//!
//! ## Compare-and-Swap Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  load order (status = S)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  mutate in memory (estamp-core transition)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE stamp_orders SET ... WHERE id = ? AND status = S                │
//! │       │                                                                 │
//! │       ├── 1 row  → committed                                            │
//! │       └── 0 rows → another writer moved the order: StatusConflict       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::promo::redeem_with;
use estamp_core::{Money, OrderStatus, Party, PriceBreakdown, ServiceType, StampOrder};

const ORDER_COLUMNS: &str = "id, order_number, \
     first_party_name, first_party_phone, second_party_name, second_party_phone, customer_email, \
     state, document_type, purpose, stamp_amount, service_type, doorstep_delivery, delivery_address, \
     promo_code, \
     stamp_paper, convenience_fee, service_charge, doorstep_charge, discount, total, \
     status, gateway_order_id, gateway_payment_id, artifact_url, failure_reason, \
     created_at, updated_at, paid_at";

/// Raw `stamp_orders` row.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    first_party_name: String,
    first_party_phone: String,
    second_party_name: String,
    second_party_phone: String,
    customer_email: Option<String>,
    state: String,
    document_type: String,
    purpose: Option<String>,
    stamp_amount: i64,
    service_type: ServiceType,
    doorstep_delivery: bool,
    delivery_address: Option<String>,
    promo_code: Option<String>,
    stamp_paper: i64,
    convenience_fee: i64,
    service_charge: i64,
    doorstep_charge: i64,
    discount: i64,
    total: i64,
    status: OrderStatus,
    gateway_order_id: Option<String>,
    gateway_payment_id: Option<String>,
    artifact_url: Option<String>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

impl From<OrderRow> for StampOrder {
    fn from(row: OrderRow) -> Self {
        StampOrder {
            id: row.id,
            order_number: row.order_number,
            first_party: Party {
                name: row.first_party_name,
                phone: row.first_party_phone,
            },
            second_party: Party {
                name: row.second_party_name,
                phone: row.second_party_phone,
            },
            customer_email: row.customer_email,
            state: row.state,
            document_type: row.document_type,
            purpose: row.purpose,
            stamp_amount: Money::from_paise(row.stamp_amount),
            service_type: row.service_type,
            doorstep_delivery: row.doorstep_delivery,
            delivery_address: row.delivery_address,
            promo_code: row.promo_code,
            redeemed_promos: Vec::new(),
            breakdown: PriceBreakdown {
                stamp_paper: Money::from_paise(row.stamp_paper),
                convenience_fee: Money::from_paise(row.convenience_fee),
                service_charge: Money::from_paise(row.service_charge),
                doorstep_charge: Money::from_paise(row.doorstep_charge),
                discount: Money::from_paise(row.discount),
                total: Money::from_paise(row.total),
            },
            status: row.status,
            gateway_order_id: row.gateway_order_id,
            gateway_payment_id: row.gateway_payment_id,
            artifact_url: row.artifact_url,
            failure_reason: row.failure_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
            paid_at: row.paid_at,
        }
    }
}

/// Writes every mutable column, guarded by the expected status.
///
/// Returns the number of rows written (0 or 1).
async fn write_order<'e, E>(executor: E, order: &StampOrder, expected: OrderStatus) -> DbResult<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let b = &order.breakdown;

    let result = sqlx::query(
        r#"
        UPDATE stamp_orders SET
            service_type = ?3,
            doorstep_delivery = ?4,
            delivery_address = ?5,
            promo_code = ?6,
            stamp_paper = ?7,
            convenience_fee = ?8,
            service_charge = ?9,
            doorstep_charge = ?10,
            discount = ?11,
            total = ?12,
            status = ?13,
            gateway_order_id = ?14,
            gateway_payment_id = ?15,
            artifact_url = ?16,
            failure_reason = ?17,
            updated_at = ?18,
            paid_at = ?19
        WHERE id = ?1 AND status = ?2
        "#,
    )
    .bind(&order.id)
    .bind(expected)
    .bind(order.service_type)
    .bind(order.doorstep_delivery)
    .bind(&order.delivery_address)
    .bind(&order.promo_code)
    .bind(b.stamp_paper.paise())
    .bind(b.convenience_fee.paise())
    .bind(b.service_charge.paise())
    .bind(b.doorstep_charge.paise())
    .bind(b.discount.paise())
    .bind(b.total.paise())
    .bind(order.status)
    .bind(&order.gateway_order_id)
    .bind(&order.gateway_payment_id)
    .bind(&order.artifact_url)
    .bind(&order.failure_reason)
    .bind(order.updated_at)
    .bind(order.paid_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Repository for order operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts a freshly created draft.
    pub async fn insert(&self, order: &StampOrder) -> DbResult<()> {
        let b = &order.breakdown;

        sqlx::query(&format!(
            "INSERT INTO stamp_orders ({ORDER_COLUMNS}) VALUES (\
             ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, \
             ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29)"
        ))
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.first_party.name)
        .bind(&order.first_party.phone)
        .bind(&order.second_party.name)
        .bind(&order.second_party.phone)
        .bind(&order.customer_email)
        .bind(&order.state)
        .bind(&order.document_type)
        .bind(&order.purpose)
        .bind(order.stamp_amount.paise())
        .bind(order.service_type)
        .bind(order.doorstep_delivery)
        .bind(&order.delivery_address)
        .bind(&order.promo_code)
        .bind(b.stamp_paper.paise())
        .bind(b.convenience_fee.paise())
        .bind(b.service_charge.paise())
        .bind(b.doorstep_charge.paise())
        .bind(b.discount.paise())
        .bind(b.total.paise())
        .bind(order.status)
        .bind(&order.gateway_order_id)
        .bind(&order.gateway_payment_id)
        .bind(&order.artifact_url)
        .bind(&order.failure_reason)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.paid_at)
        .execute(&self.pool)
        .await?;

        info!(
            id = %order.id,
            order_number = %order.order_number,
            total = %order.breakdown.total,
            "Draft order created"
        );
        Ok(())
    }

    /// Gets an order by ID, with the codes it has redeemed.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StampOrder>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM stamp_orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut order = StampOrder::from(row);
        order.redeemed_promos = sqlx::query_scalar(
            "SELECT code FROM order_promo_redemptions WHERE order_id = ?1 ORDER BY redeemed_at, code",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(order))
    }

    /// Persists an in-memory change if the stored status is still `expected`.
    ///
    /// ## Errors
    /// - `DbError::NotFound` if the order does not exist
    /// - `DbError::StatusConflict` if another writer changed the status first
    pub async fn update(&self, order: &StampOrder, expected: OrderStatus) -> DbResult<()> {
        let rows = write_order(&self.pool, order, expected).await?;
        if rows == 0 {
            return Err(self.lost_write(&order.id, expected).await);
        }

        debug!(id = %order.id, from = %expected, to = %order.status, "Order updated");
        Ok(())
    }

    /// Like [`OrderRepository::update`], redeeming `redeem` in the same
    /// transaction.
    ///
    /// The redemption bumps the code's usage counter and records the
    /// `(order, code)` pair. Either all of it and the order write commit, or
    /// nothing does.
    ///
    /// ## Errors
    /// - `DbError::PromoUnavailable` if the code cannot be redeemed
    /// - `DbError::UniqueViolation` if this order already redeemed the code
    pub async fn update_with_redemption(
        &self,
        order: &StampOrder,
        expected: OrderStatus,
        redeem: Option<&str>,
    ) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(code) = redeem {
            redeem_with(&mut *tx, code).await?;

            sqlx::query(
                "INSERT INTO order_promo_redemptions (order_id, code, redeemed_at) VALUES (?1, ?2, ?3)",
            )
            .bind(&order.id)
            .bind(code)
            .bind(order.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        let rows = write_order(&mut *tx, order, expected).await?;
        if rows == 0 {
            tx.rollback().await?;
            return Err(self.lost_write(&order.id, expected).await);
        }

        tx.commit().await?;

        info!(
            id = %order.id,
            from = %expected,
            to = %order.status,
            redeemed = ?redeem,
            "Order updated"
        );
        Ok(())
    }

    async fn lost_write(&self, id: &str, expected: OrderStatus) -> DbError {
        match self.get_by_id(id).await {
            Ok(Some(_)) => DbError::StatusConflict {
                id: id.to_string(),
                expected,
            },
            Ok(None) => DbError::not_found("Order", id),
            Err(e) => e,
        }
    }

    /// Cancels `pending_payment` orders last touched before `cutoff`.
    ///
    /// Returns how many orders were cancelled.
    pub async fn cancel_stale_pending(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE stamp_orders SET
                status = 'cancelled',
                updated_at = ?2
            WHERE status = 'pending_payment' AND updated_at < ?1
            "#,
        )
        .bind(cutoff)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let cancelled = result.rows_affected();
        info!(cutoff = %cutoff, cancelled, "Stale pending orders swept");
        Ok(cancelled)
    }

    /// Number of orders in `status`.
    pub async fn count_by_status(&self, status: OrderStatus) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM stamp_orders WHERE status = ?1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
