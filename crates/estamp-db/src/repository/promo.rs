//! # Promo Code Repository
//!
//! Promo code storage and atomic redemption.
//!
//! ## Redemption
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE promo_codes SET usage_count = usage_count + 1                    │
//! │  WHERE code = ? AND is_active = 1                                       │
//! │    AND (usage_limit IS NULL OR usage_count < usage_limit)               │
//! │                                                                         │
//! │  N concurrent redemptions, usage_limit = 1:                             │
//! │    first writer  ──► rows_affected = 1  ✓                               │
//! │    everyone else ──► rows_affected = 0  ✗ PromoUnavailable              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The check and the increment are one statement, so no read-modify-write
//! window exists between them.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use estamp_core::{DiscountRule, Money, NewPromoCode, PromoCode};

const PROMO_COLUMNS: &str = "code, discount_kind, discount_value, max_discount, min_order_amount, \
     valid_from, valid_until, usage_limit, usage_count, is_active, created_at";

/// Raw `promo_codes` row.
#[derive(Debug, sqlx::FromRow)]
struct PromoRow {
    code: String,
    discount_kind: String,
    discount_value: i64,
    max_discount: Option<i64>,
    min_order_amount: i64,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    usage_limit: Option<i64>,
    usage_count: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<PromoRow> for PromoCode {
    type Error = DbError;

    fn try_from(row: PromoRow) -> DbResult<Self> {
        let discount = match row.discount_kind.as_str() {
            "fixed" => DiscountRule::Fixed {
                amount: Money::from_paise(row.discount_value),
            },
            "percentage" => DiscountRule::Percentage {
                percent: u32::try_from(row.discount_value)
                    .map_err(|_| DbError::corrupt("promo code", format!("percent {}", row.discount_value)))?,
                cap: row.max_discount.map(Money::from_paise),
            },
            other => return Err(DbError::corrupt("promo code", format!("discount kind '{}'", other))),
        };

        Ok(PromoCode {
            code: row.code,
            discount,
            min_order_amount: Money::from_paise(row.min_order_amount),
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            usage_limit: row.usage_limit,
            usage_count: row.usage_count,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

/// Splits a rule into `(discount_kind, discount_value, max_discount)` columns.
fn rule_columns(rule: &DiscountRule) -> (&'static str, i64, Option<i64>) {
    match *rule {
        DiscountRule::Fixed { amount } => ("fixed", amount.paise(), None),
        DiscountRule::Percentage { percent, cap } => {
            ("percentage", i64::from(percent), cap.map(|c| c.paise()))
        }
    }
}

/// Conditionally bumps the usage counter on any executor (pool or transaction).
pub(crate) async fn redeem_with<'e, E>(executor: E, code: &str) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE promo_codes SET
            usage_count = usage_count + 1,
            updated_at = ?2
        WHERE code = ?1
          AND is_active = 1
          AND (usage_limit IS NULL OR usage_count < usage_limit)
        "#,
    )
    .bind(code)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        warn!(code = %code, "Promo redemption rejected");
        return Err(DbError::PromoUnavailable {
            code: code.to_string(),
        });
    }

    debug!(code = %code, "Promo redeemed");
    Ok(())
}

/// Repository for promo code operations.
#[derive(Debug, Clone)]
pub struct PromoCodeRepository {
    pool: SqlitePool,
}

impl PromoCodeRepository {
    /// Creates a new PromoCodeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PromoCodeRepository { pool }
    }

    /// Exact, case-sensitive lookup. Inactive codes are returned too.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<PromoCode>> {
        let row = sqlx::query_as::<_, PromoRow>(&format!(
            "SELECT {PROMO_COLUMNS} FROM promo_codes WHERE code = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PromoCode::try_from).transpose()
    }

    /// Inserts a new active code with a zero usage count.
    pub async fn insert(&self, input: &NewPromoCode) -> DbResult<PromoCode> {
        let now = Utc::now();
        let (kind, value, cap) = rule_columns(&input.discount);

        sqlx::query(
            r#"
            INSERT INTO promo_codes (
                code, discount_kind, discount_value, max_discount, min_order_amount,
                valid_from, valid_until, usage_limit, usage_count, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, 1, ?9, ?9)
            "#,
        )
        .bind(&input.code)
        .bind(kind)
        .bind(value)
        .bind(cap)
        .bind(input.min_order_amount.paise())
        .bind(input.valid_from)
        .bind(input.valid_until)
        .bind(input.usage_limit)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: input.code.clone(),
            },
            other => other,
        })?;

        info!(code = %input.code, kind = kind, value = value, "Promo code created");

        Ok(PromoCode {
            code: input.code.clone(),
            discount: input.discount,
            min_order_amount: input.min_order_amount,
            valid_from: input.valid_from,
            valid_until: input.valid_until,
            usage_limit: input.usage_limit,
            usage_count: 0,
            is_active: true,
            created_at: now,
        })
    }

    /// Deactivates a code. Existing orders keep their discount.
    pub async fn deactivate(&self, code: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE promo_codes SET is_active = 0, updated_at = ?2 WHERE code = ?1",
        )
        .bind(code)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promo code", code));
        }

        info!(code = %code, "Promo code deactivated");
        Ok(())
    }

    /// Counts one use of `code`, failing if none remain.
    ///
    /// ## Errors
    /// `DbError::PromoUnavailable` when the code is inactive, missing or used up.
    pub async fn redeem(&self, code: &str) -> DbResult<()> {
        redeem_with(&self.pool, code).await
    }

    /// Number of promo codes.
    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM promo_codes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
