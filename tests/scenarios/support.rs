use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use scanpack_rust::{
    CommittedRecord, InMemoryPersistentStore, InMemoryUserDirectory, PersistentStore, ScanEvent,
    ScanOutcome, StoreError, Workflow, WorkflowConfig,
};

/// Wraps the in-memory store and fails writes on demand.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: InMemoryPersistentStore,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &InMemoryPersistentStore {
        &self.inner
    }
}

impl PersistentStore for FlakyStore {
    fn exists_by_primary_key(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.exists_by_primary_key(key)
    }

    fn insert_batch(&self, records: &[CommittedRecord]) -> Result<usize, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Storage("connection reset during insert".into()));
        }
        self.inner.insert_batch(records)
    }
}

pub type ScanWorkflow = Workflow<FlakyStore, InMemoryUserDirectory>;

pub fn directory() -> InMemoryUserDirectory {
    InMemoryUserDirectory::new()
        .with_user("U1", "Somchai")
        .with_user("U2", "Malee")
}

pub fn start(config: WorkflowConfig, store: FlakyStore) -> ScanWorkflow {
    Workflow::start(config, store, directory()).unwrap()
}

/// Hands out one sequence number per physical scan.
pub struct Scanner {
    sequence: u64,
}

impl Scanner {
    pub fn new() -> Self {
        Scanner { sequence: 0 }
    }

    pub fn scan(&mut self, workflow: &mut ScanWorkflow, value: &str) -> ScanOutcome {
        self.sequence += 1;
        workflow.on_scan(ScanEvent::new(self.sequence, value))
    }

    pub fn scan_all(&mut self, workflow: &mut ScanWorkflow, values: &[&str]) -> Vec<ScanOutcome> {
        values.iter().map(|value| self.scan(workflow, value)).collect()
    }
}
