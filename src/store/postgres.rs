// src/store/postgres.rs
//
// Documents live in one JSONB table keyed by (collection, doc_key).
// Upserts merge with `||` and skip the UPDATE when the stored document already
// contains every incoming field, so an unchanged re-sync modifies nothing.

use async_trait::async_trait;
use log::{debug, info};
use serde_json::Value;

use crate::models::{Collection, Document};
use crate::store::{DocumentStore, StoreError, UpsertOp, WriteSummary};
use crate::utils::constants::BATCH_DB_OPS_SIZE;
use crate::utils::db_connect::PgPool;

const UPSERT_SQL: &str = "
    INSERT INTO ips_data.documents (collection, doc_key, doc, created_at, updated_at)
    VALUES ($1::text, $2::text, $3::jsonb, now(), now())
    ON CONFLICT (collection, doc_key) DO UPDATE
        SET doc = ips_data.documents.doc || EXCLUDED.doc,
            updated_at = now()
        WHERE NOT (ips_data.documents.doc @> EXCLUDED.doc)
    RETURNING (xmax = 0) AS was_inserted";

const EXISTS_SQL: &str = "
    SELECT 1 FROM ips_data.documents WHERE collection = $1::text AND doc_key = $2::text";

const PATCH_SQL: &str = "
    WITH target AS (
        SELECT doc_key FROM ips_data.documents
        WHERE collection = $1::text AND doc_key = $2::text
    ), updated AS (
        UPDATE ips_data.documents
        SET doc = doc || $3::jsonb, updated_at = now()
        WHERE collection = $1::text AND doc_key = $2::text AND NOT (doc @> $3::jsonb)
        RETURNING doc_key
    )
    SELECT (SELECT COUNT(*) FROM target) AS matched,
           (SELECT COUNT(*) FROM updated) AS modified";

const FIND_ALL_SQL: &str = "
    SELECT doc_key, doc FROM ips_data.documents WHERE collection = $1::text ORDER BY doc_key";

const FIND_ONE_SQL: &str = "
    SELECT doc_key, doc FROM ips_data.documents WHERE collection = $1::text AND doc_key = $2::text";

pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn pool_error<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Pool(e.to_string())
}

fn into_document(collection: &str, key: String, value: Value) -> Result<Document, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::Corrupt {
            collection: collection.to_string(),
            key,
        }),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn bulk_upsert(
        &self,
        collection: Collection,
        ops: &[UpsertOp],
    ) -> Result<WriteSummary, StoreError> {
        let name = collection.name();
        let mut summary = WriteSummary::default();
        if ops.is_empty() {
            return Ok(summary);
        }

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        for (chunk_idx, chunk) in ops.chunks(BATCH_DB_OPS_SIZE).enumerate() {
            let transaction = conn.transaction().await?;
            let upsert = transaction.prepare(UPSERT_SQL).await?;
            let exists = transaction.prepare(EXISTS_SQL).await?;
            let mut chunk_summary = WriteSummary::default();

            for op in chunk {
                let doc = Value::Object(op.set.clone());
                let rows = transaction.query(&upsert, &[&name, &op.key, &doc]).await?;
                match rows.first() {
                    Some(row) if row.get::<_, bool>("was_inserted") => chunk_summary.upserted += 1,
                    Some(_) => {
                        chunk_summary.matched += 1;
                        chunk_summary.modified += 1;
                    }
                    None => {
                        // Conflict with an unchanged document: the WHERE clause skipped the update.
                        let present = transaction.query_opt(&exists, &[&name, &op.key]).await?;
                        if present.is_some() {
                            chunk_summary.matched += 1;
                        }
                    }
                }
            }

            transaction.commit().await?;
            debug!(
                "[{}] chunk {} committed: {} ops, {} inserted, {} modified",
                name,
                chunk_idx + 1,
                chunk.len(),
                chunk_summary.upserted,
                chunk_summary.modified
            );
            summary.absorb(chunk_summary);
        }

        info!(
            "[{}] bulk upsert: {} matched, {} modified, {} upserted",
            name, summary.matched, summary.modified, summary.upserted
        );
        Ok(summary)
    }

    async fn patch(
        &self,
        collection: Collection,
        key: &str,
        fields: &Document,
    ) -> Result<WriteSummary, StoreError> {
        let name = collection.name();
        let doc = Value::Object(fields.clone());
        let conn = self.pool.get().await.map_err(pool_error)?;
        let row = conn.query_one(PATCH_SQL, &[&name, &key, &doc]).await?;
        let matched: i64 = row.get("matched");
        let modified: i64 = row.get("modified");
        Ok(WriteSummary {
            matched: matched as u64,
            modified: modified as u64,
            upserted: 0,
        })
    }

    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let name = collection.name();
        let conn = self.pool.get().await.map_err(pool_error)?;
        let rows = conn.query(FIND_ALL_SQL, &[&name]).await?;
        rows.into_iter()
            .map(|row| into_document(&name, row.get("doc_key"), row.get("doc")))
            .collect()
    }

    async fn find_one(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<Document>, StoreError> {
        let name = collection.name();
        let conn = self.pool.get().await.map_err(pool_error)?;
        let row = conn.query_opt(FIND_ONE_SQL, &[&name, &key]).await?;
        row.map(|row| into_document(&name, row.get("doc_key"), row.get("doc")))
            .transpose()
    }
}
