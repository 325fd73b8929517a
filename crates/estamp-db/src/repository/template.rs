//! # Template Repository
//!
//! The stamp-paper catalog: lookup by `(state, document_type)` and admin CRUD.
//!
//! ## Lookup
//! ```text
//! (state, document_type) ──► stamp_templates WHERE is_active = 1
//!                                 │
//!                    ┌────────────┴────────────┐
//!                    ▼                         ▼
//!              Some(template)               None → NotFound
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use estamp_core::{Money, NewTemplate, StampTemplate, TemplateUpdate};

const TEMPLATE_COLUMNS: &str = "id, state, document_type, base_price, convenience_fee, \
     description, is_active, created_at, updated_at";

/// Raw `stamp_templates` row.
#[derive(Debug, sqlx::FromRow)]
struct TemplateRow {
    id: String,
    state: String,
    document_type: String,
    base_price: i64,
    convenience_fee: i64,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TemplateRow> for StampTemplate {
    fn from(row: TemplateRow) -> Self {
        StampTemplate {
            id: row.id,
            state: row.state,
            document_type: row.document_type,
            base_price: Money::from_paise(row.base_price),
            convenience_fee: Money::from_paise(row.convenience_fee),
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for stamp template operations.
#[derive(Debug, Clone)]
pub struct TemplateRepository {
    pool: SqlitePool,
}

impl TemplateRepository {
    /// Creates a new TemplateRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TemplateRepository { pool }
    }

    /// Active templates, ordered by state then document type.
    pub async fn list_active(&self) -> DbResult<Vec<StampTemplate>> {
        let rows = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM stamp_templates \
             WHERE is_active = 1 ORDER BY state, document_type"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed active templates");
        Ok(rows.into_iter().map(StampTemplate::from).collect())
    }

    /// Finds the active template for a state and document type.
    ///
    /// Matching is exact; inactive templates are ignored.
    pub async fn lookup(&self, state: &str, document_type: &str) -> DbResult<Option<StampTemplate>> {
        debug!(state = %state, document_type = %document_type, "Looking up template");

        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM stamp_templates \
             WHERE state = ?1 AND document_type = ?2 AND is_active = 1"
        ))
        .bind(state)
        .bind(document_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StampTemplate::from))
    }

    /// Gets a template by ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StampTemplate>> {
        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM stamp_templates WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StampTemplate::from))
    }

    /// Inserts a new active template.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` if the (state, document type) pair exists.
    pub async fn insert(&self, input: &NewTemplate) -> DbResult<StampTemplate> {
        let now = Utc::now();
        let template = StampTemplate {
            id: Uuid::new_v4().to_string(),
            state: input.state.clone(),
            document_type: input.document_type.clone(),
            base_price: input.base_price,
            convenience_fee: input.convenience_fee,
            description: input.description.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO stamp_templates (
                id, state, document_type, base_price, convenience_fee,
                description, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&template.id)
        .bind(&template.state)
        .bind(&template.document_type)
        .bind(template.base_price.paise())
        .bind(template.convenience_fee.paise())
        .bind(&template.description)
        .bind(template.is_active)
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: format!("{} / {}", template.state, template.document_type),
            },
            other => other,
        })?;

        info!(
            id = %template.id,
            state = %template.state,
            document_type = %template.document_type,
            base_price = %template.base_price,
            "Template created"
        );
        Ok(template)
    }

    /// Updates prices, description and the active flag.
    pub async fn update(&self, id: &str, input: &TemplateUpdate) -> DbResult<StampTemplate> {
        let result = sqlx::query(
            r#"
            UPDATE stamp_templates SET
                base_price = ?2,
                convenience_fee = ?3,
                description = ?4,
                is_active = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.base_price.paise())
        .bind(input.convenience_fee.paise())
        .bind(&input.description)
        .bind(input.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Template", id));
        }

        info!(id = %id, is_active = input.is_active, "Template updated");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Template", id))
    }

    /// Number of templates, active or not.
    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM stamp_templates")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use testresult::TestResult;

    fn rental() -> NewTemplate {
        NewTemplate {
            state: "Karnataka".to_string(),
            document_type: "Rental Agreement".to_string(),
            base_price: Money::from_paise(10100),
            convenience_fee: Money::from_paise(7697),
            description: Some("11 month residential lease".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() -> TestResult {
        let db = Database::new(DbConfig::in_memory()).await?;
        let repo = db.templates();

        let created = repo.insert(&rental()).await?;
        let found = repo.lookup("Karnataka", "Rental Agreement").await?;

        assert_eq!(found.as_ref().map(|t| &t.id), Some(&created.id));
        assert_eq!(found.map(|t| t.base_price.paise()), Some(10100));
        assert!(repo.lookup("Karnataka", "Affidavit").await?.is_none());
        assert!(repo.lookup("karnataka", "Rental Agreement").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_state_and_document_type() -> TestResult {
        let db = Database::new(DbConfig::in_memory()).await?;
        let repo = db.templates();

        repo.insert(&rental()).await?;
        let err = repo.insert(&rental()).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(repo.count().await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_templates_are_hidden() -> TestResult {
        let db = Database::new(DbConfig::in_memory()).await?;
        let repo = db.templates();

        let created = repo.insert(&rental()).await?;
        let updated = repo
            .update(
                &created.id,
                &TemplateUpdate {
                    base_price: Money::from_paise(20000),
                    convenience_fee: Money::from_paise(5000),
                    description: None,
                    is_active: false,
                },
            )
            .await?;

        assert_eq!(updated.base_price.paise(), 20000);
        assert!(!updated.is_active);
        assert!(repo.lookup("Karnataka", "Rental Agreement").await?.is_none());
        assert!(repo.list_active().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_template() -> TestResult {
        let db = Database::new(DbConfig::in_memory()).await?;
        let err = db
            .templates()
            .update(
                "missing",
                &TemplateUpdate {
                    base_price: Money::from_paise(100),
                    convenience_fee: Money::zero(),
                    description: None,
                    is_active: true,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
        Ok(())
    }
}
