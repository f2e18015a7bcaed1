//! Donation submission and read-back endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use common::RowId;
use domain::{DonationRecord, DonationRequest, DonationService};
use row_store::RowStore;
use saga::DonationWriter;

use crate::error::ApiError;
use crate::response::SubmissionResponse;

/// Shared application state accessible from all handlers.
pub struct AppState<S: RowStore> {
    pub writer: DonationWriter<S>,
    pub donations: DonationService<S>,
}

/// POST /donate: writes a donation with its items and detail rows.
///
/// Also mounted at `/api/donor/donate`. The submission runs detached from
/// the request, so a client hanging up mid-write still gets rolled back.
#[tracing::instrument(skip_all)]
pub async fn donate<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<DonationRequest>, JsonRejection>,
) -> Result<SubmissionResponse, ApiError> {
    let Json(request) = payload?;
    let report = state.writer.submit_detached(request).await;
    tracing::info!(
        outcome = report.outcome.kind(),
        state = %report.submission.state(),
        "donation submission handled"
    );
    Ok(SubmissionResponse(report.into_outcome()))
}

/// GET /api/donations/{id}: loads a donation with its items and details.
#[tracing::instrument(skip(state))]
pub async fn get<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<DonationRecord>, ApiError> {
    let donation_id: RowId = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid donation id: {e}")))?;

    state
        .donations
        .get_donation(donation_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Donation not found: {donation_id}")))
}
