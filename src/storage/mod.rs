//! Storage abstractions for resource persistence.
//!
//! The pipeline only depends on the [`ResourceStore`] trait. Production
//! runs use [`SqliteStore`]; [`MemoryStore`] backs development and tests.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Candidate, ResourceRecord};

// Re-export for convenience
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Trait for resource storage backends.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Every identifier currently in the store.
    async fn list_identifiers(&self) -> Result<Vec<String>>;

    /// All undelivered records, in insertion order.
    async fn list_unsent(&self) -> Result<Vec<ResourceRecord>>;

    /// Persist a new candidate with `sent` unset.
    async fn insert(&self, candidate: &Candidate) -> Result<()>;

    /// Record the transport-assigned message ID for a delivered record.
    ///
    /// The update is conditional on the record still being unsent, so a
    /// non-zero `sent` value is never overwritten. Returns `false` when no
    /// row was modified.
    async fn mark_sent(&self, store_key: i64, message_id: i64) -> Result<bool>;

    /// Release the underlying connection or pool.
    async fn close(&self);
}
