//! In-memory statement registry built up over one build.

use indexmap::IndexMap;

use crate::models::StatementRecord;

/// Mapping of statement id to record.
///
/// Upserting an existing id replaces the record but keeps the id's original
/// position, so iteration order is first-insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatementRegistry {
    records: IndexMap<String, StatementRecord>,
}

impl StatementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record under its id. Returns the replaced record.
    pub fn upsert(&mut self, record: StatementRecord) -> Option<StatementRecord> {
        self.records.insert(record.id.clone(), record)
    }

    /// Fold another registry into this one, in its order, last write wins.
    pub fn merge(&mut self, other: StatementRegistry) {
        for (_, record) in other.records {
            self.upsert(record);
        }
    }

    pub fn get(&self, id: &str) -> Option<&StatementRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatementRecord> {
        self.records.values()
    }

    /// Records in insertion order.
    pub fn to_records(&self) -> Vec<StatementRecord> {
        self.records.values().cloned().collect()
    }
}
