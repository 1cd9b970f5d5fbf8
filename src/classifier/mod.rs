//! ScanClassifier - what does a scanned value mean in the current step?
//!
//! Classification is split in two. [`classify`] is a pure function of the
//! state, the operator and the raw value. [`ScanClassifier::interpret`] then
//! performs the one external call the meaning requires (operator lookup or
//! duplicate check) and settles on an [`Interpretation`].

use tracing::debug;

use crate::cache::DuplicateCache;
use crate::directory::{UserDirectory, Validation};
use crate::duplicate::{DuplicateCheck, DuplicateChecker};
use crate::error::{LookupError, PairingConflict, WorkflowError};
use crate::record::{Operator, ScanMode};
use crate::staging::StagingBuffer;
use crate::store::PersistentStore;
use crate::workflow::{LotStep, PairStep, WorkflowState};

/// A completed primary/secondary association, not yet staged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pairing {
    pub primary_key: String,
    pub secondary_key: String,
    pub mode: ScanMode,
}

/// Meaning of a scan before any external lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanMeaning {
    /// Must be validated against the user directory.
    OperatorCandidate,
    /// Becomes the lot's locked key.
    LockKey { next: WorkflowState },
    /// First half of a pair, held until the second scan.
    HoldPrimary { next: WorkflowState },
    /// Completes a record once the primary key passes the duplicate check.
    Complete {
        pairing: Pairing,
        next: WorkflowState,
    },
    /// Collides with a value already in play.
    Conflict {
        reason: PairingConflict,
        next: WorkflowState,
    },
}

/// Decide what `value` means. Comparisons are exact on the raw value.
pub fn classify(state: &WorkflowState, operator: Option<&Operator>, value: &str) -> ScanMeaning {
    let operator_id = match operator {
        Some(operator) if !state.is_awaiting_operator() => operator.id(),
        _ => return ScanMeaning::OperatorCandidate,
    };
    let is_operator = value == operator_id;

    match state {
        WorkflowState::AwaitingOperator => ScanMeaning::OperatorCandidate,
        WorkflowState::Lot(LotStep::AwaitingKey) => {
            if is_operator {
                ScanMeaning::Conflict {
                    reason: PairingConflict::Operator,
                    next: state.clone(),
                }
            } else {
                ScanMeaning::LockKey {
                    next: WorkflowState::Lot(LotStep::AwaitingPrimary {
                        locked: value.to_string(),
                    }),
                }
            }
        }
        WorkflowState::Lot(LotStep::AwaitingPrimary { locked }) => {
            let reason = if is_operator {
                Some(PairingConflict::Operator)
            } else if value == locked {
                Some(PairingConflict::LockedKey)
            } else {
                None
            };
            match reason {
                Some(reason) => ScanMeaning::Conflict {
                    reason,
                    next: state.clone(),
                },
                None => ScanMeaning::Complete {
                    pairing: Pairing {
                        primary_key: value.to_string(),
                        secondary_key: locked.clone(),
                        mode: ScanMode::Lot,
                    },
                    next: state.clone(),
                },
            }
        }
        WorkflowState::Pair(PairStep::AwaitingPrimary) => {
            if is_operator {
                ScanMeaning::Conflict {
                    reason: PairingConflict::Operator,
                    next: state.clone(),
                }
            } else {
                ScanMeaning::HoldPrimary {
                    next: WorkflowState::Pair(PairStep::AwaitingSecondary {
                        primary: value.to_string(),
                    }),
                }
            }
        }
        WorkflowState::Pair(PairStep::AwaitingSecondary { primary }) => {
            // Whatever happens, the pair in progress ends here.
            let next = WorkflowState::Pair(PairStep::AwaitingPrimary);
            if value == primary {
                ScanMeaning::Conflict {
                    reason: PairingConflict::PendingPrimary,
                    next,
                }
            } else if is_operator {
                ScanMeaning::Conflict {
                    reason: PairingConflict::Operator,
                    next,
                }
            } else {
                ScanMeaning::Complete {
                    pairing: Pairing {
                        primary_key: primary.clone(),
                        secondary_key: value.to_string(),
                        mode: ScanMode::Pair,
                    },
                    next,
                }
            }
        }
    }
}

/// Final meaning of a scan after its external lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interpretation {
    SignedIn {
        operator: Operator,
        next: WorkflowState,
    },
    KeyLocked {
        key: String,
        next: WorkflowState,
    },
    PrimaryHeld {
        primary: String,
        next: WorkflowState,
    },
    Completed {
        pairing: Pairing,
        next: WorkflowState,
    },
    Rejected {
        error: WorkflowError,
        next: WorkflowState,
    },
}

impl Interpretation {
    pub fn next_state(&self) -> &WorkflowState {
        match self {
            Interpretation::SignedIn { next, .. }
            | Interpretation::KeyLocked { next, .. }
            | Interpretation::PrimaryHeld { next, .. }
            | Interpretation::Completed { next, .. }
            | Interpretation::Rejected { next, .. } => next,
        }
    }
}

/// Borrowing classifier over the session's collaborators, built per scan.
pub struct ScanClassifier<'a, D: ?Sized, S: ?Sized, C: ?Sized> {
    directory: &'a D,
    checker: DuplicateChecker<'a, S, C>,
    buffer: &'a StagingBuffer,
    mode: ScanMode,
    now: u64,
}

impl<'a, D, S, C> ScanClassifier<'a, D, S, C>
where
    D: UserDirectory + ?Sized,
    S: PersistentStore + ?Sized,
    C: DuplicateCache + ?Sized,
{
    /// `mode` is the step a freshly signed-in operator lands in.
    pub fn new(
        directory: &'a D,
        checker: DuplicateChecker<'a, S, C>,
        buffer: &'a StagingBuffer,
        mode: ScanMode,
        now: u64,
    ) -> Self {
        ScanClassifier {
            directory,
            checker,
            buffer,
            mode,
            now,
        }
    }

    pub fn interpret(
        &mut self,
        state: &WorkflowState,
        operator: Option<&Operator>,
        value: &str,
    ) -> Interpretation {
        match classify(state, operator, value) {
            ScanMeaning::OperatorCandidate => self.sign_in(value),
            ScanMeaning::LockKey { next } => Interpretation::KeyLocked {
                key: value.to_string(),
                next,
            },
            ScanMeaning::HoldPrimary { next } => Interpretation::PrimaryHeld {
                primary: value.to_string(),
                next,
            },
            ScanMeaning::Conflict { reason, next } => Interpretation::Rejected {
                error: WorkflowError::InvalidPairing {
                    value: value.to_string(),
                    reason,
                },
                next,
            },
            ScanMeaning::Complete { pairing, next } => self.complete(pairing, next),
        }
    }

    /// Typed entry of a whole pair. The current step is left as it is.
    ///
    /// With a lot key locked the record is always paired with that key; the
    /// typed secondary may be left empty or must repeat it.
    pub fn interpret_manual(
        &mut self,
        state: &WorkflowState,
        operator: &Operator,
        primary: &str,
        secondary: &str,
    ) -> Interpretation {
        let locked = state.locked_reference();
        let secondary = match locked {
            Some(locked) if secondary.is_empty() || secondary == locked => locked,
            Some(_) => {
                return Self::reject_manual(state, secondary, PairingConflict::NotLockedKey)
            }
            None => secondary,
        };

        let conflict = if primary == operator.id() {
            Some((primary, PairingConflict::Operator))
        } else if secondary == operator.id() {
            Some((secondary, PairingConflict::Operator))
        } else if locked == Some(primary) {
            Some((primary, PairingConflict::LockedKey))
        } else if primary == secondary {
            Some((secondary, PairingConflict::PendingPrimary))
        } else {
            None
        };

        if let Some((value, reason)) = conflict {
            return Self::reject_manual(state, value, reason);
        }

        let pairing = Pairing {
            primary_key: primary.to_string(),
            secondary_key: secondary.to_string(),
            mode: self.mode,
        };
        self.complete(pairing, state.clone())
    }

    fn reject_manual(
        state: &WorkflowState,
        value: &str,
        reason: PairingConflict,
    ) -> Interpretation {
        Interpretation::Rejected {
            error: WorkflowError::InvalidPairing {
                value: value.to_string(),
                reason,
            },
            next: state.clone(),
        }
    }

    fn sign_in(&mut self, value: &str) -> Interpretation {
        let next = WorkflowState::AwaitingOperator;
        match self.directory.validate(value) {
            Ok(Validation::Found { display_name }) => Interpretation::SignedIn {
                operator: Operator::new(value, display_name),
                next: WorkflowState::initial_for(self.mode),
            },
            Ok(Validation::NotFound) => Interpretation::Rejected {
                error: WorkflowError::OperatorNotFound {
                    value: value.to_string(),
                },
                next,
            },
            Err(err) => Interpretation::Rejected {
                error: WorkflowError::LookupFailure(LookupError::Directory(err)),
                next,
            },
        }
    }

    fn complete(&mut self, pairing: Pairing, next: WorkflowState) -> Interpretation {
        match self.checker.check(&pairing.primary_key, self.buffer, self.now) {
            Ok(DuplicateCheck::Unique) => Interpretation::Completed { pairing, next },
            Ok(DuplicateCheck::Duplicate(scope)) => {
                debug!(primary_key = %pairing.primary_key, %scope, "duplicate primary key");
                Interpretation::Rejected {
                    error: WorkflowError::DuplicatePrimaryKey {
                        key: pairing.primary_key,
                        scope,
                    },
                    next,
                }
            }
            Err(err) => Interpretation::Rejected {
                error: WorkflowError::LookupFailure(LookupError::Store(err)),
                next,
            },
        }
    }
}
