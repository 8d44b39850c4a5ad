//! Backends for the data the traits assistant serves.
//!
//! Two independent abstractions live here:
//!
//! - [`DocumentStore`]: exact-match lookups of a single [`TraitRecord`] in one
//!   of the three trait collections. [`FirestoreStore`] talks to Firestore
//!   over REST; [`InMemoryDocumentStore`] backs tests and local runs.
//! - [`DatasetSource`]: streaming of the three pre-built JSON datasets.
//!   [`CloudStorageSource`] reads them from a Cloud Storage bucket;
//!   [`InMemoryDatasetSource`] serves fixed bytes.
//!
//! [`TraitRecord`]: traits_core::TraitRecord

pub mod collection;
pub mod dataset;
pub mod document;
pub mod error;
pub mod firestore;
pub mod inmemory;
pub mod storage;

pub use collection::{Collection, LOOKUP_FIELD};
pub use dataset::{ByteStream, DatasetSource, InMemoryDatasetSource, object_path};
pub use document::DocumentStore;
pub use error::{Result, StoreError};
pub use firestore::FirestoreStore;
pub use inmemory::InMemoryDocumentStore;
pub use storage::{CloudStorageSource, DEFAULT_BUCKET};
