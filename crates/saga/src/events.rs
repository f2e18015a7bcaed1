//! Submission journal events.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::RowId;
use domain::ItemType;
use serde::{Deserialize, Serialize};

/// Events recorded while a donation submission runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SubmissionEvent {
    /// Submission started.
    Started(StartedData),

    /// A forward step completed.
    StepCompleted(StepCompletedData),

    /// Returned item rows were mapped to their types.
    ItemsMapped(ItemsMappedData),

    /// A forward step failed.
    StepFailed(StepFailedData),

    /// Compensation started after a failure.
    CompensationStarted(CompensationData),

    /// A compensating delete succeeded.
    CompensationStepCompleted(CompensationStepData),

    /// A compensating delete failed (recorded, compensation continues).
    CompensationStepFailed(StepFailedData),

    /// Every row was written.
    Completed(CompletedData),

    /// Submission failed, after compensation if any was needed.
    Failed(FailedData),
}

impl SubmissionEvent {
    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            SubmissionEvent::Started(_) => "Started",
            SubmissionEvent::StepCompleted(_) => "StepCompleted",
            SubmissionEvent::ItemsMapped(_) => "ItemsMapped",
            SubmissionEvent::StepFailed(_) => "StepFailed",
            SubmissionEvent::CompensationStarted(_) => "CompensationStarted",
            SubmissionEvent::CompensationStepCompleted(_) => "CompensationStepCompleted",
            SubmissionEvent::CompensationStepFailed(_) => "CompensationStepFailed",
            SubmissionEvent::Completed(_) => "Completed",
            SubmissionEvent::Failed(_) => "Failed",
        }
    }

    pub fn started(submission_id: RowId, item_types: Vec<ItemType>) -> Self {
        SubmissionEvent::Started(StartedData {
            submission_id,
            item_types,
            started_at: Utc::now(),
        })
    }

    pub fn step_completed(step: &str, row_id: Option<RowId>) -> Self {
        SubmissionEvent::StepCompleted(StepCompletedData {
            step_name: step.to_string(),
            row_id,
        })
    }

    pub fn items_mapped(items: BTreeMap<ItemType, RowId>) -> Self {
        SubmissionEvent::ItemsMapped(ItemsMappedData { items })
    }

    pub fn step_failed(step: &str, error: impl Into<String>) -> Self {
        SubmissionEvent::StepFailed(StepFailedData {
            step_name: step.to_string(),
            error: error.into(),
        })
    }

    pub fn compensation_started(from_step: &str) -> Self {
        SubmissionEvent::CompensationStarted(CompensationData {
            from_step: from_step.to_string(),
        })
    }

    pub fn compensation_step_completed(step: &str, rows_deleted: u64) -> Self {
        SubmissionEvent::CompensationStepCompleted(CompensationStepData {
            step_name: step.to_string(),
            rows_deleted,
        })
    }

    pub fn compensation_step_failed(step: &str, error: impl Into<String>) -> Self {
        SubmissionEvent::CompensationStepFailed(StepFailedData {
            step_name: step.to_string(),
            error: error.into(),
        })
    }

    pub fn completed(donation_id: RowId) -> Self {
        SubmissionEvent::Completed(CompletedData {
            donation_id,
            completed_at: Utc::now(),
        })
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        SubmissionEvent::Failed(FailedData {
            reason: reason.into(),
            failed_at: Utc::now(),
        })
    }
}

/// Data for Started event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartedData {
    /// Correlation ID of this submission (not stored).
    pub submission_id: RowId,
    /// Item types present in the request.
    pub item_types: Vec<ItemType>,
    pub started_at: DateTime<Utc>,
}

/// Data for StepCompleted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepCompletedData {
    pub step_name: String,
    /// Identity generated by the step, if it produced one.
    pub row_id: Option<RowId>,
}

/// Data for ItemsMapped event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemsMappedData {
    pub items: BTreeMap<ItemType, RowId>,
}

/// Data for StepFailed and CompensationStepFailed events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailedData {
    pub step_name: String,
    pub error: String,
}

/// Data for CompensationStarted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationData {
    /// The step whose failure triggered compensation.
    pub from_step: String,
}

/// Data for CompensationStepCompleted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationStepData {
    pub step_name: String,
    pub rows_deleted: u64,
}

/// Data for Completed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedData {
    pub donation_id: RowId,
    pub completed_at: DateTime<Utc>,
}

/// Data for Failed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedData {
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}
