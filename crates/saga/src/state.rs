//! Submission state machine.

use serde::{Deserialize, Serialize};

/// The state of one donation submission.
///
/// State transitions:
/// ```text
/// Validating ──┬──► ParentInserted ──► ItemsInserted ──► DetailsInserting ──► Completed
///              │          │                  │                  │
///              │          └──────────────────┴──────────────────┴──► RollingBack ──┬──► RolledBack
///              │                                                                    └──► RollbackFailed
///              └──► Rejected
/// ```
///
/// `Rejected` covers failures that left nothing behind: a validation failure
/// or a failed parent insert, both of which happen before `ParentInserted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SubmissionState {
    /// Payload is being validated; nothing has been written.
    #[default]
    Validating,

    /// The donation row exists.
    ParentInserted,

    /// The donation item rows exist.
    ItemsInserted,

    /// Item identities are mapped and detail rows are being written.
    DetailsInserting,

    /// Every row was written (terminal state).
    Completed,

    /// A step failed and compensating deletes are running.
    RollingBack,

    /// Every compensating delete succeeded (terminal state).
    RolledBack,

    /// At least one compensating delete failed; rows may be orphaned
    /// (terminal state).
    RollbackFailed,

    /// Failed before anything was written (terminal state).
    Rejected,
}

impl SubmissionState {
    /// Returns true if a failure in this state must be compensated.
    pub fn can_compensate(&self) -> bool {
        matches!(
            self,
            SubmissionState::ParentInserted
                | SubmissionState::ItemsInserted
                | SubmissionState::DetailsInserting
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionState::Completed
                | SubmissionState::RolledBack
                | SubmissionState::RollbackFailed
                | SubmissionState::Rejected
        )
    }

    /// Returns true if `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: SubmissionState) -> bool {
        use SubmissionState::*;
        match (self, next) {
            (Validating, ParentInserted | Rejected) => true,
            (ParentInserted, ItemsInserted) => true,
            (ItemsInserted, DetailsInserting) => true,
            (DetailsInserting, Completed) => true,
            (from, RollingBack) => from.can_compensate(),
            (RollingBack, RolledBack | RollbackFailed) => true,
            _ => false,
        }
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionState::Validating => "Validating",
            SubmissionState::ParentInserted => "ParentInserted",
            SubmissionState::ItemsInserted => "ItemsInserted",
            SubmissionState::DetailsInserting => "DetailsInserting",
            SubmissionState::Completed => "Completed",
            SubmissionState::RollingBack => "RollingBack",
            SubmissionState::RolledBack => "RolledBack",
            SubmissionState::RollbackFailed => "RollbackFailed",
            SubmissionState::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
