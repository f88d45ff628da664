//! Document repository
//!
//! Raw SQL access to the `documents` and `review_events` tables. Bodies are
//! exchanged as `serde_json::Value`; typing happens in the adapter.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use domain_claims::ports::ListQuery;
use domain_claims::review::ReviewUpdate;
use domain_claims::status::Collection;

use crate::error::DatabaseError;

/// One recorded review decision
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ReviewEventRow {
    pub event_id: i64,
    pub collection: String,
    pub document_id: String,
    pub status: String,
    pub review_notes: Option<String>,
    pub reviewed_by: String,
    pub reviewed_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

/// Repository for claim and analysis documents
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts a new document
    ///
    /// # Errors
    ///
    /// `DatabaseError::DuplicateEntry` if the id is already taken in the
    /// collection
    pub async fn insert(
        &self,
        collection: Collection,
        id: &str,
        body: Value,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(body))
        .bind(created_at)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Current body of a document, if it exists
    pub async fn fetch(&self, collection: Collection, id: &str) -> Result<Option<Value>, DatabaseError> {
        let body: Option<Json<Value>> = sqlx::query_scalar(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(body.map(|Json(value)| value))
    }

    /// Lists bodies newest first, applying the query's equality filters
    pub async fn list(&self, collection: Collection, query: &ListQuery) -> Result<Vec<Value>, DatabaseError> {
        let mut sql: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT body FROM documents WHERE collection = ");
        sql.push_bind(collection.as_str());

        if let Some(status) = query.status {
            sql.push(" AND status = ").push_bind(status.label());
        }
        if let Some(policy_number) = &query.policy_number {
            sql.push(" AND policy_number = ").push_bind(policy_number.clone());
        }
        if let Some(email) = &query.email {
            sql.push(" AND email = ").push_bind(email.clone());
        }

        sql.push(" ORDER BY created_at DESC, id DESC");
        if let Some(limit) = query.limit {
            sql.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let bodies: Vec<Json<Value>> = sql.build_query_scalar().fetch_all(&self.pool).await?;
        Ok(bodies.into_iter().map(|Json(value)| value).collect())
    }

    /// Merges review fields into a document and records the decision
    ///
    /// Both writes commit together. Review notes are only replaced when the
    /// update carries them.
    ///
    /// # Errors
    ///
    /// `DatabaseError::NotFound` if the document does not exist
    pub async fn apply_review(
        &self,
        collection: Collection,
        id: &str,
        update: &ReviewUpdate,
    ) -> Result<(), DatabaseError> {
        let mut patch = serde_json::json!({
            "status": update.status,
            "reviewed_at": update.reviewed_at,
            "reviewed_by": update.reviewed_by,
            "updated_at": update.updated_at,
        });
        if let Some(notes) = &update.review_notes {
            patch["review_notes"] = Value::String(notes.clone());
        }

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE documents
            SET body = body || $3, updated_at = $4
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(patch))
        .bind(update.updated_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DatabaseError::not_found(collection.as_str(), id));
        }

        sqlx::query(
            r#"
            INSERT INTO review_events
                (collection, document_id, status, review_notes, reviewed_by, reviewed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(update.status.label())
        .bind(update.review_notes.as_deref())
        .bind(&update.reviewed_by)
        .bind(update.reviewed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    /// Review decisions recorded for a document, oldest first
    pub async fn review_events(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Vec<ReviewEventRow>, DatabaseError> {
        let events = sqlx::query_as::<_, ReviewEventRow>(
            r#"
            SELECT event_id, collection, document_id, status, review_notes,
                   reviewed_by, reviewed_at, recorded_at
            FROM review_events
            WHERE collection = $1 AND document_id = $2
            ORDER BY reviewed_at, event_id
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Deletes a document together with its review trail
    pub async fn delete(&self, collection: Collection, id: &str) -> Result<bool, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM review_events WHERE collection = $1 AND document_id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(deleted.rows_affected() > 0)
    }
}
