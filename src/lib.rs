mod cache;
mod classifier;
mod commit;
mod config;
mod directory;
mod duplicate;
mod error;
mod feedback;
mod record;
mod source;
mod staging;
mod store;
mod workflow;

pub use cache::{DuplicateCache, NoopDuplicateCache, TtlDuplicateCache};
pub use classifier::{classify, Interpretation, Pairing, ScanClassifier, ScanMeaning};
pub use commit::{BatchCommitter, CommitContext, CommitError, CommitReceipt};
pub use config::{ConfigError, ResetPolicy, WorkflowConfig, MAX_DUPLICATE_CACHE_TTL};
pub use directory::{DirectoryError, InMemoryUserDirectory, UserDirectory, Validation};
pub use duplicate::{DuplicateCheck, DuplicateChecker, DuplicateScope};
pub use error::{LookupError, PairingConflict, StartupError, WorkflowError};
pub use feedback::{Feedback, FeedbackKind};
pub use record::{CommittedRecord, Operator, RecordId, ScanEvent, ScanMode, StagedRecord};
pub use source::{ScanSource, VecScanSource};
pub use staging::{StagingBuffer, StagingError};
pub use store::{InMemoryPersistentStore, PersistentStore, StoreError};
pub use workflow::{
    LotStep, Notice, NoticeKind, PairStep, ScanOutcome, SessionSnapshot, Severity, SnapshotError,
    Workflow, WorkflowState, SNAPSHOT_VERSION,
};

// Feedback listeners are registered through the emitter.
#[cfg(feature = "emitter")]
pub use feedback::FeedbackEmitter;
