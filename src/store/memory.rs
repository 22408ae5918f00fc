// src/store/memory.rs

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::models::{Collection, Document};
use crate::store::{DocumentStore, StoreError, UpsertOp, WriteSummary};

/// Process-local store with the same merge semantics as the PostgreSQL one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection.name())
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

/// Merges `fields` into `doc`; true when any value changed.
fn merge(doc: &mut Document, fields: &Document) -> bool {
    let mut changed = false;
    for (field, value) in fields {
        if doc.get(field) != Some(value) {
            doc.insert(field.clone(), value.clone());
            changed = true;
        }
    }
    changed
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn bulk_upsert(
        &self,
        collection: Collection,
        ops: &[UpsertOp],
    ) -> Result<WriteSummary, StoreError> {
        let mut guard = self.collections.write().await;
        let docs = guard.entry(collection.name()).or_default();
        let mut summary = WriteSummary::default();
        for op in ops {
            match docs.get_mut(&op.key) {
                Some(existing) => {
                    summary.matched += 1;
                    if merge(existing, &op.set) {
                        summary.modified += 1;
                    }
                }
                None => {
                    docs.insert(op.key.clone(), op.set.clone());
                    summary.upserted += 1;
                }
            }
        }
        Ok(summary)
    }

    async fn patch(
        &self,
        collection: Collection,
        key: &str,
        fields: &Document,
    ) -> Result<WriteSummary, StoreError> {
        let mut guard = self.collections.write().await;
        let mut summary = WriteSummary::default();
        if let Some(existing) = guard
            .get_mut(&collection.name())
            .and_then(|docs| docs.get_mut(key))
        {
            summary.matched = 1;
            if merge(existing, fields) {
                summary.modified = 1;
            }
        }
        Ok(summary)
    }

    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(&collection.name())
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn find_one(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(&collection.name())
            .and_then(|docs| docs.get(key))
            .cloned())
    }
}
