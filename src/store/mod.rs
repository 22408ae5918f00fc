// src/store/mod.rs
//
// Document persistence. Every collection is a keyed set of JSON documents;
// writes are field-level merges so re-applying the same fields changes nothing.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::{Collection, Document};

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection pool error: {0}")]
    Pool(String),
    #[error("query failed: {0}")]
    Query(#[from] tokio_postgres::Error),
    #[error("stored document in '{collection}' under '{key}' is not a JSON object")]
    Corrupt { collection: String, key: String },
}

/// Insert-or-merge of `set` into the document stored under `key`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOp {
    pub key: String,
    pub set: Document,
}

/// Counts reported by a write, with the usual document-store meaning:
/// `matched` documents existed, `modified` of them changed, `upserted` were created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub matched: u64,
    pub modified: u64,
    pub upserted: u64,
}

impl WriteSummary {
    pub fn absorb(&mut self, other: WriteSummary) {
        self.matched += other.matched;
        self.modified += other.modified;
        self.upserted += other.upserted;
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Applies every op; each op is idempotent on its own. Implementations may
    /// commit in chunks, so a failure can leave earlier ops applied.
    async fn bulk_upsert(
        &self,
        collection: Collection,
        ops: &[UpsertOp],
    ) -> Result<WriteSummary, StoreError>;

    /// Merges `fields` into an existing document. Never creates one.
    async fn patch(
        &self,
        collection: Collection,
        key: &str,
        fields: &Document,
    ) -> Result<WriteSummary, StoreError>;

    /// All documents of a collection, ordered by key.
    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

    async fn find_one(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<Document>, StoreError>;
}
