//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DocumentStore` port from the `core` crate. Every document lives as a
//! JSONB row in a single `documents` table, keyed by project, collection and id.

use async_trait::async_trait;
use scoping_core::ports::{merge_documents, Document, DocumentStore, ListQuery, PortError, PortResult};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DocumentStore` port.
///
/// All reads and writes are scoped to the project the adapter was created for.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
    project_id: String,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool, project_id: impl Into<String>) -> Self {
        Self {
            pool,
            project_id: project_id.into(),
        }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// Row Mapping Helpers
//=========================================================================================

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn document_from_row(row: &PgRow) -> PortResult<Document> {
    let Json(value): Json<Value> = row.try_get("data").map_err(unexpected)?;
    match value {
        Value::Object(document) => Ok(document),
        other => Err(PortError::Unexpected(format!(
            "stored document is not an object: {other}"
        ))),
    }
}

const UPSERT: &str = "INSERT INTO documents (project_id, collection, id, data) VALUES ($1, $2, $3, $4) \
     ON CONFLICT (project_id, collection, id) DO UPDATE SET data = EXCLUDED.data, updated_at = now()";

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for DbAdapter {
    async fn get(&self, collection: &str, id: &str) -> PortResult<Document> {
        let row = sqlx::query(
            "SELECT data FROM documents WHERE project_id = $1 AND collection = $2 AND id = $3",
        )
        .bind(&self.project_id)
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("{collection}/{id}")))?;

        document_from_row(&row)
    }

    async fn set(&self, collection: &str, id: &str, document: Document) -> PortResult<()> {
        sqlx::query(UPSERT)
            .bind(&self.project_id)
            .bind(collection)
            .bind(id)
            .bind(Json(Value::Object(document)))
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, patch: Document) -> PortResult<Document> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let existing = sqlx::query(
            "SELECT data FROM documents WHERE project_id = $1 AND collection = $2 AND id = $3 FOR UPDATE",
        )
        .bind(&self.project_id)
        .bind(collection)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?;

        let mut merged = match existing {
            Some(row) => document_from_row(&row)?,
            None => {
                debug!("Merging into absent document {}/{}; creating it.", collection, id);
                Document::new()
            }
        };
        merge_documents(&mut merged, patch);

        sqlx::query(UPSERT)
            .bind(&self.project_id)
            .bind(collection)
            .bind(id)
            .bind(Json(Value::Object(merged.clone())))
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;

        Ok(merged)
    }

    async fn delete(&self, collection: &str, id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM documents WHERE project_id = $1 AND collection = $2 AND id = $3")
            .bind(&self.project_id)
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn list(&self, collection: &str, query: &ListQuery) -> PortResult<Vec<(String, Document)>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT id, data FROM documents WHERE project_id = ");
        builder
            .push_bind(self.project_id.clone())
            .push(" AND collection = ")
            .push_bind(collection.to_string());

        if let Some(filter) = &query.filter {
            builder
                .push(" AND data ->> ")
                .push_bind(filter.field.clone())
                .push(" = ")
                .push_bind(filter.value.clone());
        }

        // "C" collation keeps the order byte-wise, matching the in-memory store.
        match &query.order_by {
            Some(field) => {
                builder
                    .push(" AND data ->> ")
                    .push_bind(field.clone())
                    .push(" IS NOT NULL ORDER BY data ->> ")
                    .push_bind(field.clone())
                    .push(" COLLATE \"C\", id COLLATE \"C\"");
            }
            None => {
                builder.push(" ORDER BY id COLLATE \"C\"");
            }
        }

        builder
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.offset).unwrap_or(i64::MAX))
            .push(" LIMIT ")
            .push_bind(i64::try_from(query.limit).unwrap_or(i64::MAX));

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        rows.iter()
            .map(|row| {
                let id: String = row.try_get("id").map_err(unexpected)?;
                Ok((id, document_from_row(row)?))
            })
            .collect()
    }
}
