//! Response Assembler: maps submission outcomes to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use saga::{DetailFailure, RollbackOutcome, StorageFailure, SubmissionOutcome};
use serde_json::{Map, Value, json};

/// HTTP rendering of a submission outcome.
///
/// Clean and failed rollbacks produce the same body; the distinction is only
/// logged and counted.
#[derive(Debug)]
pub struct SubmissionResponse(pub SubmissionOutcome);

impl SubmissionResponse {
    /// Returns the status code and JSON body for the outcome.
    pub fn parts(&self) -> (StatusCode, Value) {
        match &self.0 {
            SubmissionOutcome::Success(receipt) => (
                StatusCode::CREATED,
                json!({
                    "message": "Donation details added successfully",
                    "donation_id": receipt.donation_id(),
                    "donationItemData": receipt.items,
                    "details": receipt.details,
                }),
            ),
            SubmissionOutcome::ValidationError(error) => {
                let mut body = json!({ "message": error.to_string() });
                if !error.missing_fields().is_empty() {
                    body["missing_fields"] = json!(error.missing_fields());
                }
                (StatusCode::BAD_REQUEST, body)
            }
            SubmissionOutcome::StorageError { failure, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, storage_body(failure))
            }
            SubmissionOutcome::PartialFailure { failures, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "message": "Failed to insert all donation details, transaction rolled back",
                    "errors": failures.iter().map(detail_body).collect::<Vec<_>>(),
                }),
            ),
            SubmissionOutcome::UnexpectedFault { message, rollback } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "message": "Failed to process donation due to an unexpected error",
                    "error": { "message": message },
                    "rollback_status": rollback_status(rollback),
                }),
            ),
        }
    }
}

impl IntoResponse for SubmissionResponse {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        (status, Json(body)).into_response()
    }
}

fn storage_body(failure: &StorageFailure) -> Value {
    let mut body = json!({ "message": failure.summary() });
    match failure {
        StorageFailure::Rejected {
            error,
            code,
            details,
            ..
        } => {
            body["error"] = json!(error);
            body["code"] = json!(code);
            body["details"] = json!(details);
        }
        StorageFailure::MissingReturnedRows { .. } => {}
        StorageFailure::InconsistentItemMapping { expected, received } => {
            body["expected"] = json!(expected);
            body["received"] = json!(received);
        }
    }
    body
}

fn detail_body(failure: &DetailFailure) -> Value {
    let mut body = Map::new();
    body.insert("type".to_string(), json!(failure.item_type()));
    body.insert("reason".to_string(), json!(failure.to_string()));
    match failure {
        DetailFailure::Validation(missing) => {
            body.insert("missing_fields".to_string(), json!(missing.fields));
        }
        DetailFailure::Storage { code, details, .. } => {
            body.insert("code".to_string(), json!(code));
            body.insert("details".to_string(), json!(details));
        }
        DetailFailure::MissingReturnedRow { .. } => {}
    }
    Value::Object(body)
}

fn rollback_status(rollback: &RollbackOutcome) -> &'static str {
    if rollback.attempted() {
        "attempted"
    } else {
        "not_needed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{ItemType, MissingDetailFields, ValidationError};

    #[test]
    fn test_validation_error_lists_missing_fields() {
        let response = SubmissionResponse(SubmissionOutcome::ValidationError(
            ValidationError::MissingFields(vec!["donor_id"]),
        ));
        let (status, body) = response.parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Donor ID, Org ID, and Status are required");
        assert_eq!(body["missing_fields"], json!(["donor_id"]));
    }

    #[test]
    fn test_no_items_has_only_a_message() {
        let response =
            SubmissionResponse(SubmissionOutcome::ValidationError(ValidationError::NoItems));
        let (_, body) = response.parts();
        assert_eq!(
            body,
            json!({ "message": "At least one donation item (food or clothes) is required" })
        );
    }

    #[test]
    fn test_partial_failure_body() {
        let response = SubmissionResponse(SubmissionOutcome::PartialFailure {
            failures: vec![
                DetailFailure::Validation(MissingDetailFields {
                    item_type: ItemType::Food,
                    fields: vec!["exp_date"],
                }),
                DetailFailure::Storage {
                    item_type: ItemType::Clothes,
                    message: "check constraint".to_string(),
                    code: Some("23514".to_string()),
                    details: None,
                },
            ],
            rollback: RollbackOutcome::RolledBack,
        });
        let (status, body) = response.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["message"],
            "Failed to insert all donation details, transaction rolled back"
        );
        assert_eq!(body["errors"][0]["type"], "food");
        assert_eq!(body["errors"][0]["missing_fields"], json!(["exp_date"]));
        assert_eq!(body["errors"][1]["type"], "clothes");
        assert_eq!(body["errors"][1]["code"], "23514");
    }

    #[test]
    fn test_rollback_outcome_is_not_exposed() {
        let clean = SubmissionResponse(SubmissionOutcome::StorageError {
            failure: StorageFailure::MissingReturnedRows {
                step: "insert_donation_items",
            },
            rollback: RollbackOutcome::RolledBack,
        });
        let failed = SubmissionResponse(SubmissionOutcome::StorageError {
            failure: StorageFailure::MissingReturnedRows {
                step: "insert_donation_items",
            },
            rollback: RollbackOutcome::RollbackFailed { failures: vec![] },
        });
        assert_eq!(clean.parts(), failed.parts());
    }

    #[test]
    fn test_unexpected_fault_reports_rollback_attempt() {
        let response = SubmissionResponse(SubmissionOutcome::UnexpectedFault {
            message: "boom".to_string(),
            rollback: RollbackOutcome::NotNeeded,
        });
        let (status, body) = response.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "boom");
        assert_eq!(body["rollback_status"], "not_needed");
    }
}
