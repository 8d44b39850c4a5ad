//! In-memory document store.
//!
//! [`InMemoryDocumentStore`] keeps records per collection in insertion order
//! behind a `tokio::sync::RwLock`. It is meant for tests and for running the
//! backend without cloud credentials.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use traits_core::TraitRecord;

use crate::collection::Collection;
use crate::document::DocumentStore;
use crate::error::Result;

#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<TraitRecord>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, collection: Collection, record: TraitRecord) {
        self.collections.write().await.entry(collection).or_default().push(record);
    }

    /// Builder-style variant of [`insert`](Self::insert) for synchronous setup.
    pub fn with_record(mut self, collection: Collection, record: TraitRecord) -> Self {
        self.collections.get_mut().entry(collection).or_default().push(record);
        self
    }

    pub async fn len(&self, collection: Collection) -> usize {
        self.collections.read().await.get(&collection).map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_one(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<TraitRecord>> {
        let collections = self.collections.read().await;
        let found = collections.get(&collection).and_then(|records| {
            records
                .iter()
                .find(|record| matches!(record.get(field), Some(Value::String(s)) if s == value))
                .cloned()
        });
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LOOKUP_FIELD;

    fn lion() -> TraitRecord {
        TraitRecord::new().with_field(LOOKUP_FIELD, "lion").with_field("diet", "carnivore")
    }

    #[tokio::test]
    async fn finds_exact_match_in_the_right_collection() {
        let store = InMemoryDocumentStore::new().with_record(Collection::PerVernacularName, lion());

        let found = store.lookup(Collection::PerVernacularName, "lion").await.unwrap();
        assert_eq!(found, Some(lion()));

        assert_eq!(store.lookup(Collection::PerScientificName, "lion").await.unwrap(), None);
    }

    #[tokio::test]
    async fn match_is_exact_not_prefix_or_case_insensitive() {
        let store = InMemoryDocumentStore::new().with_record(Collection::PerVernacularName, lion());

        for term in ["Lion", "lio", "lions", " lion"] {
            assert_eq!(store.lookup(Collection::PerVernacularName, term).await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn first_inserted_match_wins() {
        let store = InMemoryDocumentStore::new();
        for rank in ["family", "duplicate"] {
            let record =
                TraitRecord::new().with_field(LOOKUP_FIELD, "felidae").with_field("rank", rank);
            store.insert(Collection::PhylogeneticTree, record).await;
        }

        let found = store.lookup(Collection::PhylogeneticTree, "felidae").await.unwrap().unwrap();
        assert_eq!(found.get("rank").and_then(Value::as_str), Some("family"));
        assert_eq!(store.len(Collection::PhylogeneticTree).await, 2);
    }
}
