//! In-memory storage backend for development and testing.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Candidate, ResourceRecord};
use crate::storage::ResourceStore;

/// Vec-backed resource store. Not persistent across runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ResourceRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record, for assertions in tests.
    pub fn records(&self) -> Vec<ResourceRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn list_identifiers(&self) -> Result<Vec<String>> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().map(|r| r.identifier.clone()).collect())
    }

    async fn list_unsent(&self) -> Result<Vec<ResourceRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().filter(|r| !r.is_sent()).cloned().collect())
    }

    async fn insert(&self, candidate: &Candidate) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.identifier == candidate.identifier) {
            return Err(AppError::persist(
                &candidate.identifier,
                "identifier already present",
            ));
        }
        let id = records.len() as i64 + 1;
        records.push(ResourceRecord {
            id,
            identifier: candidate.identifier.clone(),
            title: candidate.title.clone(),
            description: candidate.description.clone(),
            image_url: candidate.image_url.clone(),
            link: candidate.link.clone(),
            sent: 0,
        });
        Ok(())
    }

    async fn mark_sent(&self, store_key: i64, message_id: i64) -> Result<bool> {
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.id == store_key && !r.is_sent()) {
            Some(record) => {
                record.sent = message_id;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn close(&self) {}
}
