//! Document store trait for exact-match trait lookups.

use async_trait::async_trait;
use traits_core::TraitRecord;

use crate::collection::{Collection, LOOKUP_FIELD};
use crate::error::Result;

/// A read-only document store holding trait records.
///
/// Implementations run a single exact-match filter against one collection and
/// return at most one record. They never cache, retry, or rank.
///
/// # Example
///
/// ```rust,ignore
/// use traits_store::{Collection, DocumentStore, InMemoryDocumentStore};
///
/// let store = InMemoryDocumentStore::new();
/// let record = store.lookup(Collection::PerVernacularName, "lion").await?;
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Return the first record in `collection` whose `field` equals `value`.
    async fn find_one(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<TraitRecord>>;

    /// Look up a record by its [`LOOKUP_FIELD`].
    async fn lookup(&self, collection: Collection, term: &str) -> Result<Option<TraitRecord>> {
        self.find_one(collection, LOOKUP_FIELD, term).await
    }
}
