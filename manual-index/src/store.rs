//! In-memory document store. Insertion-ordered, append-only.

use std::collections::{BTreeSet, HashMap};

use tracing::trace;

use crate::errors::SearchError;
use crate::record::{Record, RecordId};

/// Owns every [`Record`] of one corpus snapshot.
#[derive(Debug, Default)]
pub struct DocumentStore {
    records: Vec<Record>,
    by_id: HashMap<RecordId, usize>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record and returns its id.
    ///
    /// # Errors
    /// Returns [`SearchError::Duplicate`] if the id is already present.
    pub fn add(&mut self, record: Record) -> Result<RecordId, SearchError> {
        let id = record.id;
        if self.by_id.contains_key(&id) {
            return Err(SearchError::Duplicate(id));
        }
        trace!("store::add id={id} page={}", record.page);
        self.by_id.insert(id, self.records.len());
        self.records.push(record);
        Ok(id)
    }

    /// # Errors
    /// Returns [`SearchError::NotFound`] if no record has this id.
    pub fn get(&self, id: RecordId) -> Result<&Record, SearchError> {
        self.by_id
            .get(&id)
            .map(|&i| &self.records[i])
            .ok_or(SearchError::NotFound(id))
    }

    /// Records in insertion order. Each call starts a fresh pass.
    pub fn all(&self) -> impl Iterator<Item = &Record> + '_ {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct vehicle names.
    pub fn distinct_vehicles(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.vehicle.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }
}
