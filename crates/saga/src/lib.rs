//! Saga implementation of the donation submission write protocol.
//!
//! The store offers no multi-table transaction, so a submission is written
//! as a sequence of independent steps, each gated on the previous one:
//! 1. Validate the top-level payload
//! 2. Insert the donation
//! 3. Insert one donation item per present type
//! 4. Map item types to their generated identities
//! 5. Insert every type's detail row
//!
//! Every successful write registers a compensating delete. If any later step
//! fails, the compensations run in reverse order before the outcome is
//! returned.

pub mod compensation;
pub mod coordinator;
pub mod details;
pub mod donation_submission;
pub mod error;
pub mod events;
pub mod outcome;
pub mod state;
pub mod submission;

pub use compensation::{CompensationFailure, CompensationStack, RollbackOutcome, UndoAction};
pub use coordinator::DonationWriter;
pub use details::{DetailFailure, insert_detail};
pub use error::SagaError;
pub use events::SubmissionEvent;
pub use outcome::{StorageFailure, SubmissionOutcome, SubmissionReceipt, SubmissionReport};
pub use state::SubmissionState;
pub use submission::Submission;
