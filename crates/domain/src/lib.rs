//! Domain layer for the donation submission system.
//!
//! This crate provides:
//! - The incoming `DonationRequest` payload and its top-level validation
//! - Per-type item handlers (`ItemDetail`) for food and clothes
//! - Typed records for every table a submission writes
//! - A read-side `DonationService`

pub mod donation;
pub mod error;

pub use donation::{
    ClothesDetail, ClothesPayload, Donation, DonationItem, DonationRecord, DonationRequest,
    DonationService, DonationStatus, FoodDetail, FoodPayload, ItemDetail, ItemType,
    MissingDetailFields, NewDonation, Record, RecordError, ValidationError,
};
pub use error::DomainError;
