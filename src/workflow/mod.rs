//! Workflow - one operator session driving scans into staged records.
//!
//! A [`Workflow`] owns its collaborators and all per-session state. Each
//! handler takes `&mut self`, builds the borrowing helpers it needs
//! ([`ScanClassifier`], [`BatchCommitter`]) for the duration of the call and
//! applies the result. Failures never escape as panics: they come back as
//! values and are also kept as a sticky [`Notice`] until a later scan succeeds.

mod notice;
mod snapshot;
mod state;

pub use notice::{Notice, NoticeKind, Severity};
pub use snapshot::{SessionSnapshot, SnapshotError, SNAPSHOT_VERSION};
pub use state::{LotStep, PairStep, WorkflowState};

use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::cache::{DuplicateCache, TtlDuplicateCache};
use crate::classifier::{Interpretation, Pairing, ScanClassifier};
use crate::commit::{BatchCommitter, CommitContext, CommitReceipt};
use crate::config::{ResetPolicy, WorkflowConfig};
use crate::directory::UserDirectory;
use crate::duplicate::DuplicateChecker;
use crate::error::{StartupError, WorkflowError};
use crate::feedback::{Feedback, FeedbackKind};
#[cfg(feature = "emitter")]
use crate::feedback::FeedbackEmitter;
use crate::record::{Operator, RecordId, ScanEvent, ScanMode, StagedRecord};
use crate::source::ScanSource;
use crate::staging::StagingBuffer;
use crate::store::PersistentStore;

/// What handling one scan did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Empty value or a re-delivered event; nothing changed.
    Ignored,
    SignedIn(Operator),
    KeyLocked(String),
    PrimaryHeld(String),
    Staged(RecordId),
    Rejected(WorkflowError),
}

impl ScanOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, ScanOutcome::Rejected(_))
    }

    pub fn error(&self) -> Option<&WorkflowError> {
        match self {
            ScanOutcome::Rejected(err) => Some(err),
            _ => None,
        }
    }

    pub fn staged_id(&self) -> Option<RecordId> {
        match self {
            ScanOutcome::Staged(id) => Some(*id),
            _ => None,
        }
    }
}

pub struct Workflow<S, D, C = TtlDuplicateCache> {
    config: WorkflowConfig,
    store: S,
    directory: D,
    cache: C,
    mode: ScanMode,
    state: WorkflowState,
    operator: Option<Operator>,
    buffer: StagingBuffer,
    notice: Option<Notice>,
    last_event: Option<ScanEvent>,
    vehicle_tag: Option<String>,
    committed_total: u64,
    last_receipt: Option<CommitReceipt>,
    tick: u64,
    #[cfg(feature = "emitter")]
    feedback: FeedbackEmitter,
}

impl<S, D> Workflow<S, D, TtlDuplicateCache>
where
    S: PersistentStore,
    D: UserDirectory,
{
    /// Check that both collaborators are reachable and enter `AwaitingOperator`.
    pub fn start(config: WorkflowConfig, store: S, directory: D) -> Result<Self, StartupError> {
        let cache = TtlDuplicateCache::new(config.duplicate_cache_ttl);
        Self::start_with_cache(config, store, directory, cache)
    }

    /// Continue a parked session.
    pub fn resume(
        snapshot: SessionSnapshot,
        config: WorkflowConfig,
        store: S,
        directory: D,
    ) -> Result<Self, StartupError> {
        let cache = TtlDuplicateCache::new(config.duplicate_cache_ttl);
        Self::resume_with_cache(snapshot, config, store, directory, cache)
    }
}

impl<S, D, C> Workflow<S, D, C>
where
    S: PersistentStore,
    D: UserDirectory,
    C: DuplicateCache,
{
    pub fn start_with_cache(
        config: WorkflowConfig,
        store: S,
        directory: D,
        cache: C,
    ) -> Result<Self, StartupError> {
        config.validate()?;
        store.ping()?;
        directory.ping()?;

        info!(mode = %config.default_mode, "scanning workflow started");
        Ok(Workflow {
            mode: config.default_mode,
            config,
            store,
            directory,
            cache,
            state: WorkflowState::AwaitingOperator,
            operator: None,
            buffer: StagingBuffer::new(),
            notice: None,
            last_event: None,
            vehicle_tag: None,
            committed_total: 0,
            last_receipt: None,
            tick: 0,
            #[cfg(feature = "emitter")]
            feedback: FeedbackEmitter::new(),
        })
    }

    pub fn resume_with_cache(
        snapshot: SessionSnapshot,
        config: WorkflowConfig,
        store: S,
        directory: D,
        cache: C,
    ) -> Result<Self, StartupError> {
        snapshot.check()?;
        let buffer = StagingBuffer::restore(snapshot.staged, snapshot.next_record_id)
            .map_err(SnapshotError::from)?;

        let mut workflow = Self::start_with_cache(config, store, directory, cache)?;
        workflow.mode = snapshot.mode;
        workflow.state = snapshot.state;
        workflow.operator = snapshot.operator;
        workflow.buffer = buffer;
        workflow.notice = snapshot.notice;
        workflow.last_event = snapshot.last_event;
        workflow.vehicle_tag = snapshot.vehicle_tag;
        workflow.committed_total = snapshot.committed_total;
        workflow.tick = snapshot.tick;

        info!(
            operator = workflow.operator.as_ref().map(Operator::id),
            staged = workflow.buffer.len(),
            "scanning workflow resumed"
        );
        Ok(workflow)
    }

    /// Handle one decoded scan.
    pub fn on_scan(&mut self, event: ScanEvent) -> ScanOutcome {
        if event.is_empty() {
            return ScanOutcome::Ignored;
        }
        if self.last_event.as_ref() == Some(&event) {
            debug!(sequence = event.sequence, "ignoring re-delivered scan");
            return ScanOutcome::Ignored;
        }

        self.tick += 1;
        let interpretation = {
            let checker = DuplicateChecker::new(&self.store, &mut self.cache);
            let mut classifier =
                ScanClassifier::new(&self.directory, checker, &self.buffer, self.mode, self.tick);
            classifier.interpret(&self.state, self.operator.as_ref(), &event.value)
        };
        self.last_event = Some(event);
        self.apply(interpretation)
    }

    /// Handle every scan the source has pending, in order.
    pub fn drain<Src>(&mut self, source: &mut Src) -> Vec<ScanOutcome>
    where
        Src: ScanSource + ?Sized,
    {
        let mut outcomes = Vec::new();
        while let Some(event) = source.next_scan() {
            outcomes.push(self.on_scan(event));
        }
        outcomes
    }

    /// Stage a typed pair. Same checks as scanning; the current step is kept.
    /// While a lot key is locked, `secondary` may be empty.
    pub fn stage_manual(&mut self, primary: &str, secondary: &str) -> ScanOutcome {
        let Some(operator) = self.operator.clone() else {
            return self.reject(WorkflowError::OperatorRequired);
        };
        let needs_secondary = self.state.locked_reference().is_none();
        if primary.is_empty() || (secondary.is_empty() && needs_secondary) {
            return ScanOutcome::Ignored;
        }

        self.tick += 1;
        let interpretation = {
            let checker = DuplicateChecker::new(&self.store, &mut self.cache);
            let mut classifier =
                ScanClassifier::new(&self.directory, checker, &self.buffer, self.mode, self.tick);
            classifier.interpret_manual(&self.state, &operator, primary, secondary)
        };
        self.apply(interpretation)
    }

    /// Switch between lot and pair scanning. Locked key and held primary are
    /// dropped; staged records stay.
    pub fn select_mode(&mut self, mode: ScanMode) {
        if self.mode == mode {
            return;
        }
        debug!(from = %self.mode, to = %mode, "scan mode changed");
        self.mode = mode;
        if self.operator.is_some() {
            self.state = WorkflowState::initial_for(mode);
        }
    }

    /// Release the lot's locked key. Returns the key that was locked.
    pub fn unlock_key(&mut self) -> Option<String> {
        let (next, key) = self.state.unlock()?;
        debug!(key = %key, "locked key released");
        self.state = next;
        Some(key)
    }

    /// Drop the held primary of an unfinished pair. Returns it.
    pub fn cancel_pair(&mut self) -> Option<String> {
        let (next, primary) = self.state.cancel_pair()?;
        debug!(primary = %primary, "pending pair cancelled");
        self.state = next;
        Some(primary)
    }

    /// Tag applied to records staged from now on. Blank clears it.
    pub fn set_vehicle_tag(&mut self, tag: Option<String>) {
        self.vehicle_tag = tag
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty());
    }

    pub fn remove_staged(&mut self, id: RecordId) -> Option<StagedRecord> {
        let removed = self.buffer.remove(id);
        if let Some(record) = &removed {
            debug!(id = %id, primary_key = %record.primary_key, "staged record removed");
        }
        removed
    }

    pub fn clear_staged(&mut self) {
        debug!(count = self.buffer.len(), "staging buffer cleared");
        self.buffer.clear();
    }

    /// Persist the staging buffer as one batch.
    pub fn commit(&mut self) -> Result<CommitReceipt, WorkflowError> {
        let result = {
            let context = CommitContext {
                operator: self.operator.as_ref(),
                mode: self.mode,
                locked_reference: self.state.locked_reference(),
            };
            BatchCommitter::new(&self.store)
                .require_vehicle_tag(self.config.require_vehicle_tag)
                .commit(&mut self.buffer, &mut self.cache, context)
        };

        match result {
            Ok(receipt) => {
                self.committed_total += receipt.committed_count as u64;
                self.notice = None;
                self.emit(
                    FeedbackKind::BatchCommitted,
                    Some(receipt.batch_id.clone()),
                    format!("saved {} records", receipt.committed_count),
                );
                self.reset_after_commit();
                self.last_receipt = Some(receipt.clone());
                Ok(receipt)
            }
            Err(err) => {
                let error = WorkflowError::CommitFailure(err);
                self.notice = Some(Notice::from_error(&error, self.tick));
                self.emit(FeedbackKind::BatchFailed, None, error.to_string());
                Err(error)
            }
        }
    }

    /// Back to `AwaitingOperator` with a fresh session.
    pub fn restart(&mut self) {
        info!(
            operator = self.operator.as_ref().map(Operator::id),
            staged = self.buffer.len(),
            "session restarted"
        );
        self.sign_out();
        self.mode = self.config.default_mode;
        if self.config.clear_buffer_on_restart {
            self.buffer.clear();
        }
        self.cache.clear();
        self.notice = None;
        self.committed_total = 0;
        self.last_receipt = None;
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            operator: self.operator.clone(),
            mode: self.mode,
            state: self.state.clone(),
            staged: self.buffer.records_oldest_first(),
            next_record_id: self.buffer.next_id(),
            notice: self.notice.clone(),
            last_event: self.last_event.clone(),
            vehicle_tag: self.vehicle_tag.clone(),
            committed_total: self.committed_total,
            tick: self.tick,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn operator(&self) -> Option<&Operator> {
        self.operator.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn staged(&self) -> Vec<&StagedRecord> {
        self.buffer.list()
    }

    pub fn staged_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn vehicle_tag(&self) -> Option<&str> {
        self.vehicle_tag.as_deref()
    }

    pub fn committed_total(&self) -> u64 {
        self.committed_total
    }

    pub fn last_receipt(&self) -> Option<&CommitReceipt> {
        self.last_receipt.as_ref()
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[cfg(feature = "emitter")]
    pub fn feedback_mut(&mut self) -> &mut FeedbackEmitter {
        &mut self.feedback
    }

    fn apply(&mut self, interpretation: Interpretation) -> ScanOutcome {
        match interpretation {
            Interpretation::SignedIn { operator, next } => {
                info!(operator = operator.id(), mode = %self.mode, "operator signed in");
                self.operator = Some(operator.clone());
                self.state = next;
                self.accept(
                    Some(operator.id().to_string()),
                    format!("signed in as {}", operator.display_name()),
                );
                ScanOutcome::SignedIn(operator)
            }
            Interpretation::KeyLocked { key, next } => {
                self.state = next;
                self.accept(Some(key.clone()), format!("locked {key}"));
                ScanOutcome::KeyLocked(key)
            }
            Interpretation::PrimaryHeld { primary, next } => {
                self.state = next;
                self.accept(Some(primary.clone()), format!("holding {primary}"));
                ScanOutcome::PrimaryHeld(primary)
            }
            Interpretation::Completed { pairing, next } => {
                self.state = next;
                let primary = pairing.primary_key.clone();
                match self.stage(pairing) {
                    Ok(id) => {
                        self.accept(Some(primary.clone()), format!("staged {primary}"));
                        ScanOutcome::Staged(id)
                    }
                    Err(err) => self.reject(err),
                }
            }
            Interpretation::Rejected { error, next } => {
                self.state = next;
                self.reject(error)
            }
        }
    }

    fn stage(&mut self, pairing: Pairing) -> Result<RecordId, WorkflowError> {
        let operator = self.operator.as_ref().ok_or(WorkflowError::OperatorRequired)?;
        let id = self.buffer.allocate_id()?;
        let record = StagedRecord {
            id,
            operator_id: operator.id().to_string(),
            operator_name: operator.display_name().to_string(),
            primary_key: pairing.primary_key,
            secondary_key: pairing.secondary_key,
            vehicle_tag: self.vehicle_tag.clone(),
            mode: pairing.mode,
            staged_at: SystemTime::now(),
        };
        debug!(
            id = %id,
            primary_key = %record.primary_key,
            secondary_key = %record.secondary_key,
            "record staged"
        );
        self.buffer.add(record)?;
        Ok(id)
    }

    fn accept(&mut self, value: Option<String>, message: String) {
        self.notice = None;
        self.emit(FeedbackKind::ScanAccepted, value, message);
    }

    fn reject(&mut self, error: WorkflowError) -> ScanOutcome {
        let notice = Notice::from_error(&error, self.tick);
        match notice.severity {
            Severity::Warning => debug!(error = %error, "scan rejected"),
            Severity::Error => warn!(error = %error, "scan rejected"),
        }
        self.emit(FeedbackKind::ScanRejected, notice.value.clone(), notice.message.clone());
        self.notice = Some(notice);
        ScanOutcome::Rejected(error)
    }

    fn reset_after_commit(&mut self) {
        match self.config.reset_policy {
            ResetPolicy::KeepOperator => {
                if self.operator.is_some() {
                    self.state = WorkflowState::initial_for(self.mode);
                }
            }
            ResetPolicy::RequireOperator => self.sign_out(),
        }
    }

    fn sign_out(&mut self) {
        self.operator = None;
        self.state = WorkflowState::AwaitingOperator;
        self.vehicle_tag = None;
    }

    fn emit(&mut self, kind: FeedbackKind, value: Option<String>, message: String) {
        let feedback = Feedback {
            kind,
            value,
            message,
            staged: self.buffer.len(),
        };
        #[cfg(feature = "emitter")]
        self.feedback.emit(feedback);
        #[cfg(not(feature = "emitter"))]
        let _ = feedback;
    }
}
