//! Streaming access to the pre-built JSON datasets.

use std::collections::HashMap;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use futures::stream;
use traits_core::DatasetKind;

use crate::error::{Result, StoreError};

/// A stream of raw body chunks, forwarded to the caller without parsing.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// Object path of each dataset inside the traits bucket.
pub fn object_path(kind: DatasetKind) -> &'static str {
    match kind {
        DatasetKind::Vernacular => {
            "traits/traits_assistant_data/traits/per-species/traits_per_vernacular_name.json"
        }
        DatasetKind::Scientific => {
            "traits/traits_assistant_data/traits/per-species/traits_per_scientific_name.json"
        }
        DatasetKind::Phylo => {
            "traits/traits_assistant_data/traits/statistics/most_common_traits_patterns.json"
        }
    }
}

/// Source of the three static datasets.
///
/// `open` fails before yielding anything when the object cannot be read;
/// errors that occur mid-transfer surface as an `Err` item in the stream.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn open(&self, kind: DatasetKind) -> Result<ByteStream>;
}

/// Serves fixed bytes per dataset; missing datasets fail like an absent object.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatasetSource {
    objects: HashMap<DatasetKind, Vec<u8>>,
}

impl InMemoryDatasetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, kind: DatasetKind, body: impl Into<Vec<u8>>) -> Self {
        self.objects.insert(kind, body.into());
        self
    }
}

#[async_trait]
impl DatasetSource for InMemoryDatasetSource {
    async fn open(&self, kind: DatasetKind) -> Result<ByteStream> {
        let body = self.objects.get(&kind).cloned().ok_or_else(|| {
            StoreError::backend("in-memory", format!("no object at {}", object_path(kind)))
        })?;
        Ok(Box::pin(stream::iter([Ok(body)])))
    }
}
