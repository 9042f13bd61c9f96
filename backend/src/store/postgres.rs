//! Postgres-backed document store
//!
//! Documents live in one JSONB table keyed by (collection, id). Every
//! merge is a single `INSERT .. ON CONFLICT DO UPDATE` statement, so
//! increments and array appends from concurrent requests compose instead
//! of overwriting each other.
//!
//! Field names interpolated into the update expressions come exclusively
//! from repository constants, never from request input.

use super::{DocKey, DocumentStore, DocumentWatch, MergeUpdate, StoreError, WatcherRegistry};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{PgPool, Row};

pub struct PostgresStore {
    pool: PgPool,
    watchers: WatcherRegistry,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            watchers: WatcherRegistry::new(),
        }
    }

    /// Create the documents table if it does not exist
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                doc JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Build the jsonb update expression for a merge.
///
/// Each increment reads the pre-update row (`documents.doc`), so distinct
/// fields never depend on each other's intermediate state. Append values
/// are bound as parameters starting at `first_param`.
fn merge_expression(update: &MergeUpdate, first_param: usize) -> String {
    let mut expr = "documents.doc".to_string();
    for (field, delta) in &update.increments {
        expr = format!(
            "jsonb_set({expr}, '{{{field}}}', \
             to_jsonb(COALESCE((documents.doc->>'{field}')::bigint, 0) + {delta}))"
        );
    }
    for (i, (field, _)) in update.appends.iter().enumerate() {
        let param = first_param + i;
        expr = format!(
            "jsonb_set({expr}, '{{{field}}}', \
             COALESCE(documents.doc->'{field}', '[]'::jsonb) || ${param}::jsonb)"
        );
    }
    expr
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn get(&self, key: &DocKey) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query("SELECT doc FROM documents WHERE collection = $1 AND id = $2")
            .bind(&key.collection)
            .bind(&key.id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<Json<Value>, _>("doc").0))
    }

    async fn create_if_absent(&self, key: &DocKey, seed: Value) -> Result<Value, StoreError> {
        // DO UPDATE with the row's own value returns the existing document
        // on conflict without modifying it
        let row = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, doc)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO UPDATE SET doc = documents.doc
            RETURNING doc, (xmax = 0) AS inserted
            "#,
        )
        .bind(&key.collection)
        .bind(&key.id)
        .bind(Json(&seed))
        .fetch_one(&self.pool)
        .await?;

        let doc = row.get::<Json<Value>, _>("doc").0;
        if row.get::<bool, _>("inserted") {
            self.watchers.notify(key, Some(doc.clone()));
        }
        Ok(doc)
    }

    async fn patch(&self, key: &DocKey, fields: Map<String, Value>) -> Result<Value, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE documents
            SET doc = doc || $3, updated_at = now()
            WHERE collection = $1 AND id = $2
            RETURNING doc
            "#,
        )
        .bind(&key.collection)
        .bind(&key.id)
        .bind(Json(Value::Object(fields)))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        let doc = row.get::<Json<Value>, _>("doc").0;
        self.watchers.notify(key, Some(doc.clone()));
        Ok(doc)
    }

    async fn upsert_merge(
        &self,
        key: &DocKey,
        seed: Value,
        update: MergeUpdate,
    ) -> Result<Value, StoreError> {
        // Parameters: $1 collection, $2 id, $3 seed, $4.. append values
        let expr = merge_expression(&update, 4);
        let sql = format!(
            "INSERT INTO documents (collection, id, doc) VALUES ($1, $2, $3) \
             ON CONFLICT (collection, id) DO UPDATE \
             SET doc = {expr}, updated_at = now() \
             RETURNING doc"
        );

        let mut query = sqlx::query(&sql)
            .bind(&key.collection)
            .bind(&key.id)
            .bind(Json(&seed));
        for (_, value) in &update.appends {
            query = query.bind(Json(value));
        }

        let row = query.fetch_one(&self.pool).await?;
        let doc = row.get::<Json<Value>, _>("doc").0;
        self.watchers.notify(key, Some(doc.clone()));
        Ok(doc)
    }

    async fn subscribe(&self, key: &DocKey) -> Result<DocumentWatch, StoreError> {
        let current = self.get(key).await?;
        Ok(self.watchers.watch(key, current))
    }

    async fn list_range(
        &self,
        collection: &str,
        start_id: &str,
        end_id: &str,
    ) -> Result<Vec<Value>, StoreError> {
        let rows = sqlx::query(
            "SELECT doc FROM documents WHERE collection = $1 AND id >= $2 AND id <= $3",
        )
        .bind(collection)
        .bind(start_id)
        .bind(end_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| r.get::<Json<Value>, _>("doc").0)
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
