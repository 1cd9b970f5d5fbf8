use serde::{Deserialize, Serialize};

use crate::record::ScanMode;

/// Steps of lot mode: lock one product code, then scan many tracking codes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotStep {
    AwaitingKey,
    AwaitingPrimary { locked: String },
}

/// Steps of pair mode: tracking code, then its product code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairStep {
    AwaitingPrimary,
    AwaitingSecondary { primary: String },
}

/// The whole position of a session in the scanning workflow.
///
/// Locked reference and pending primary live inside the step that owns
/// them, so leaving a step drops them with it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    AwaitingOperator,
    Lot(LotStep),
    Pair(PairStep),
}

impl WorkflowState {
    /// First step of a mode once an operator is known.
    pub fn initial_for(mode: ScanMode) -> Self {
        match mode {
            ScanMode::Lot => WorkflowState::Lot(LotStep::AwaitingKey),
            ScanMode::Pair => WorkflowState::Pair(PairStep::AwaitingPrimary),
        }
    }

    pub fn mode(&self) -> Option<ScanMode> {
        match self {
            WorkflowState::AwaitingOperator => None,
            WorkflowState::Lot(_) => Some(ScanMode::Lot),
            WorkflowState::Pair(_) => Some(ScanMode::Pair),
        }
    }

    pub fn is_awaiting_operator(&self) -> bool {
        matches!(self, WorkflowState::AwaitingOperator)
    }

    pub fn locked_reference(&self) -> Option<&str> {
        match self {
            WorkflowState::Lot(LotStep::AwaitingPrimary { locked }) => Some(locked.as_str()),
            _ => None,
        }
    }

    pub fn pending_primary(&self) -> Option<&str> {
        match self {
            WorkflowState::Pair(PairStep::AwaitingSecondary { primary }) => Some(primary.as_str()),
            _ => None,
        }
    }

    /// Lot mode back to key selection. `None` if no key was locked.
    pub fn unlock(&self) -> Option<(WorkflowState, String)> {
        self.locked_reference()
            .map(|key| (WorkflowState::Lot(LotStep::AwaitingKey), key.to_string()))
    }

    /// Pair mode back to the first scan. `None` if no pair was in progress.
    pub fn cancel_pair(&self) -> Option<(WorkflowState, String)> {
        self.pending_primary()
            .map(|primary| (WorkflowState::Pair(PairStep::AwaitingPrimary), primary.to_string()))
    }
}
