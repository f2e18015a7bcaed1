//! Journal-backed record of one donation submission.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::RowId;
use domain::ItemType;
use serde::{Deserialize, Serialize};

use crate::donation_submission;
use crate::events::SubmissionEvent;
use crate::state::SubmissionState;

/// A donation submission rebuilt from its journal.
///
/// Tracks the state of the write protocol, the identities generated along
/// the way and every compensating delete that ran. The journal is kept in
/// memory for the duration of one request and returned with the outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    id: Option<RowId>,
    state: SubmissionState,
    item_types: Vec<ItemType>,
    donation_id: Option<RowId>,
    items: BTreeMap<ItemType, RowId>,
    completed_steps: Vec<String>,
    compensated_steps: Vec<String>,
    compensation_failures: Vec<String>,
    failure_reason: Option<String>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    history: Vec<SubmissionEvent>,
}

impl Submission {
    /// Applies an event, advancing the state machine.
    pub fn apply(&mut self, event: SubmissionEvent) {
        self.history.push(event.clone());
        match event {
            SubmissionEvent::Started(data) => {
                self.id = Some(data.submission_id);
                self.item_types = data.item_types;
                self.started_at = Some(data.started_at);
            }
            SubmissionEvent::StepCompleted(data) => {
                match data.step_name.as_str() {
                    donation_submission::STEP_INSERT_DONATION => {
                        self.donation_id = data.row_id;
                        self.transition(SubmissionState::ParentInserted);
                    }
                    donation_submission::STEP_INSERT_ITEMS => {
                        self.transition(SubmissionState::ItemsInserted);
                    }
                    _ => {}
                }
                self.completed_steps.push(data.step_name);
            }
            SubmissionEvent::ItemsMapped(data) => {
                self.items = data.items;
                self.completed_steps
                    .push(donation_submission::STEP_MAP_ITEMS.to_string());
                self.transition(SubmissionState::DetailsInserting);
            }
            SubmissionEvent::StepFailed(data) => {
                self.failure_reason = Some(data.error);
            }
            SubmissionEvent::CompensationStarted(_) => {
                self.transition(SubmissionState::RollingBack);
            }
            SubmissionEvent::CompensationStepCompleted(data) => {
                self.compensated_steps.push(data.step_name);
            }
            SubmissionEvent::CompensationStepFailed(data) => {
                self.compensation_failures
                    .push(format!("{}: {}", data.step_name, data.error));
            }
            SubmissionEvent::Completed(data) => {
                self.donation_id = Some(data.donation_id);
                self.finished_at = Some(data.completed_at);
                self.transition(SubmissionState::Completed);
            }
            SubmissionEvent::Failed(data) => {
                let next = match self.state {
                    SubmissionState::RollingBack if self.compensation_failures.is_empty() => {
                        SubmissionState::RolledBack
                    }
                    SubmissionState::RollingBack => SubmissionState::RollbackFailed,
                    _ => SubmissionState::Rejected,
                };
                self.failure_reason = Some(data.reason);
                self.finished_at = Some(data.failed_at);
                self.transition(next);
            }
        }
    }

    fn transition(&mut self, next: SubmissionState) {
        if !self.state.can_transition_to(next) {
            tracing::warn!(from = %self.state, to = %next, "unexpected submission transition");
        }
        self.state = next;
    }
}

// Query methods
impl Submission {
    /// Returns the correlation ID of this submission.
    pub fn id(&self) -> Option<RowId> {
        self.id
    }

    /// Returns the submission state.
    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Returns the item types present in the request.
    pub fn item_types(&self) -> &[ItemType] {
        &self.item_types
    }

    /// Returns the generated donation identity, once the parent row exists.
    pub fn donation_id(&self) -> Option<RowId> {
        self.donation_id
    }

    /// Returns the generated identity of the item row of `item_type`.
    pub fn item_id(&self, item_type: ItemType) -> Option<RowId> {
        self.items.get(&item_type).copied()
    }

    /// Returns the names of completed forward steps, in order.
    pub fn completed_steps(&self) -> &[String] {
        &self.completed_steps
    }

    /// Returns the names of compensating deletes that succeeded, in order.
    pub fn compensated_steps(&self) -> &[String] {
        &self.compensated_steps
    }

    /// Returns the compensating deletes that failed.
    pub fn compensation_failures(&self) -> &[String] {
        &self.compensation_failures
    }

    /// Returns the failure reason, if any.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Returns every event applied so far.
    pub fn events(&self) -> &[SubmissionEvent] {
        &self.history
    }
}
