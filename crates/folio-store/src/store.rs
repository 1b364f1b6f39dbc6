//! Thread-safe in-memory job registry.
//!
//! Every operation takes the lock for the map mutation only. Callers get
//! `Arc<JobEntry>` handles back and do their file-system work afterwards.

use crate::error::StoreError;
use folio_domain::{Clock, JobEntry, JobId, ResultRecord, SystemClock};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Source of fresh job ids
///
/// Production uses [`RandomIds`]; tests can plug in a deterministic source to
/// exercise collision handling.
pub trait IdGenerator: Send + Sync {
    /// Produce the next id
    fn next_id(&self) -> JobId;
}

/// Random (v4 UUID) ids
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> JobId {
        JobId::new()
    }
}

/// Registry of completed extractions
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, Arc<JobEntry>>>,
    ids: Box<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl JobStore {
    /// Create an empty store using random ids and wall-clock time
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store stamping entries with `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            ids: Box::new(RandomIds),
            clock,
        }
    }

    /// Replace the id generator
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Time source shared with whoever judges entry age
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Store a record under a fresh id
    ///
    /// The entry becomes visible to `get`/`delete`/`snapshot` only once this
    /// returns. An id that is already live is rejected, never overwritten.
    pub fn insert(&self, record: ResultRecord) -> Result<JobId, StoreError> {
        let id = self.ids.next_id();
        let entry = Arc::new(JobEntry::new(id, record, self.clock.now()));

        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        match jobs.entry(id) {
            Entry::Occupied(_) => Err(StoreError::IdCollision(id)),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(id)
            }
        }
    }

    /// Look up an entry
    ///
    /// Reading does not refresh the entry's age.
    pub fn get(&self, id: JobId) -> Result<Arc<JobEntry>, StoreError> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    /// Remove an entry, returning it if it was present
    ///
    /// Removing an id that is not there is a no-op.
    pub fn delete(&self, id: JobId) -> Option<Arc<JobEntry>> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        jobs.remove(&id)
    }

    /// Point-in-time view of all entries, oldest first
    pub fn snapshot(&self) -> Vec<Arc<JobEntry>> {
        let mut entries: Vec<Arc<JobEntry>> = {
            let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
            jobs.values().cloned().collect()
        };
        entries.sort_by_key(|entry| entry.created_at);
        entries
    }

    /// Check whether an id is live
    pub fn contains(&self, id: JobId) -> bool {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}
