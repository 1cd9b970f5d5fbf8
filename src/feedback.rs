//! Feedback - fire-and-forget cues for a UI (success/error sounds, toasts).
//!
//! The workflow emits one [`Feedback`] per handled scan or commit. With the
//! `emitter` feature, listeners registered on the [`FeedbackEmitter`] receive
//! them through `event_emitter_rs`.
//!
//! ```ignore
//! workflow.feedback_mut().on(FeedbackKind::ScanRejected, |feedback| {
//!     play_error_sound(&feedback.message);
//! });
//! ```

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    ScanAccepted,
    ScanRejected,
    BatchCommitted,
    BatchFailed,
}

impl FeedbackKind {
    pub fn event_name(&self) -> &'static str {
        match self {
            FeedbackKind::ScanAccepted => "scan.accepted",
            FeedbackKind::ScanRejected => "scan.rejected",
            FeedbackKind::BatchCommitted => "batch.committed",
            FeedbackKind::BatchFailed => "batch.failed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub value: Option<String>,
    pub message: String,
    /// Records in the staging buffer after the event.
    pub staged: usize,
}

#[cfg(feature = "emitter")]
pub use emitter::FeedbackEmitter;

#[cfg(feature = "emitter")]
mod emitter {
    use event_emitter_rs::EventEmitter;

    use super::{Feedback, FeedbackKind};

    /// Thin wrapper over `EventEmitter` keyed by [`FeedbackKind`].
    ///
    /// Listeners run on the emitter's own threads; they must not assume they
    /// are called before `emit` returns.
    pub struct FeedbackEmitter {
        event_emitter: EventEmitter,
        emitted: u64,
    }

    impl Default for FeedbackEmitter {
        fn default() -> Self {
            Self::new()
        }
    }

    impl FeedbackEmitter {
        pub fn new() -> Self {
            Self {
                event_emitter: EventEmitter::new(),
                emitted: 0,
            }
        }

        /// Register a listener; returns the listener id.
        pub fn on<F>(&mut self, kind: FeedbackKind, listener: F) -> String
        where
            F: Fn(Feedback) + Send + Sync + 'static,
        {
            self.event_emitter.on(kind.event_name(), listener)
        }

        pub fn emit(&mut self, feedback: Feedback) {
            self.emitted += 1;
            self.event_emitter
                .emit(feedback.kind.event_name(), feedback);
        }

        /// Number of feedback events emitted so far.
        pub fn emitted(&self) -> u64 {
            self.emitted
        }
    }
}
