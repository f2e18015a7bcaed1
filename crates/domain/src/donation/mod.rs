//! Donation model: request payloads, item handlers and stored records.

mod items;
mod records;
mod request;
mod service;
mod value_objects;

pub use items::{ClothesPayload, FoodPayload, ItemDetail};
pub use records::{
    ClothesDetail, Donation, DonationItem, DonationRecord, FoodDetail, NewDonation, Record,
};
pub use request::DonationRequest;
pub use service::DonationService;
pub use value_objects::{DonationStatus, ItemType};

use row_store::Table;
use thiserror::Error;

/// Errors in the top-level donation payload. Detected before any write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// One or more of donor, organization and status are absent.
    #[error("Donor ID, Org ID, and Status are required")]
    MissingFields(Vec<&'static str>),

    /// Neither a food nor a clothes payload was supplied.
    #[error("At least one donation item (food or clothes) is required")]
    NoItems,

    /// The status is not one of the known donation statuses.
    #[error("Unknown donation status: {0}")]
    UnknownStatus(String),
}

impl ValidationError {
    /// Returns the names of the missing fields, if that is the failure.
    pub fn missing_fields(&self) -> &[&'static str] {
        match self {
            ValidationError::MissingFields(fields) => fields,
            _ => &[],
        }
    }
}

/// Required fields absent from one item type's detail payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing required {item_type} fields: {}", .fields.join(", "))]
pub struct MissingDetailFields {
    pub item_type: ItemType,
    pub fields: Vec<&'static str>,
}

/// A row returned by the store could not be read as a record.
#[derive(Debug, Error)]
#[error("Malformed {table} row: {source}")]
pub struct RecordError {
    pub table: Table,
    #[source]
    pub source: serde_json::Error,
}
