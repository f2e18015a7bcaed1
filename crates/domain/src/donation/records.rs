//! Records as stored in, and read back from, the row store.

use chrono::{DateTime, Utc};
use common::RowId;
use row_store::{Row, Table};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DonationStatus, ItemType, RecordError};

/// A typed view of a row in one table.
pub trait Record: DeserializeOwned {
    /// The table this record lives in.
    const TABLE: Table;

    /// Reads a record from a stored row.
    fn from_row(row: Row) -> Result<Self, RecordError> {
        serde_json::from_value(Value::Object(row)).map_err(|source| RecordError {
            table: Self::TABLE,
            source,
        })
    }
}

/// The parent record of one donor-to-organization transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: RowId,
    pub donor_id: String,
    pub org_id: String,
    pub status: DonationStatus,
    pub created_at: DateTime<Utc>,
}

impl Record for Donation {
    const TABLE: Table = Table::Donations;
}

/// A validated donation that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDonation {
    pub donor_id: String,
    pub org_id: String,
    pub status: DonationStatus,
}

impl NewDonation {
    /// Builds the `donations` row to insert.
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("donor_id".to_string(), Value::from(self.donor_id.as_str()));
        row.insert("org_id".to_string(), Value::from(self.org_id.as_str()));
        row.insert("status".to_string(), Value::from(self.status.as_str()));
        row
    }
}

/// A typed line item belonging to one donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationItem {
    pub id: RowId,
    pub donation_id: RowId,
    #[serde(rename = "type")]
    pub item_type: ItemType,
}

impl DonationItem {
    /// Builds the `donation_items` row to insert for `item_type`.
    pub fn new_row(donation_id: RowId, item_type: ItemType) -> Row {
        let mut row = Row::new();
        row.insert(
            "donation_id".to_string(),
            Value::String(donation_id.to_string()),
        );
        row.insert("type".to_string(), Value::from(item_type.as_str()));
        row
    }
}

impl Record for DonationItem {
    const TABLE: Table = Table::DonationItems;
}

/// Food detail row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodDetail {
    pub id: RowId,
    pub donation_id: RowId,
    pub donation_item_id: RowId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub qty: u32,
    pub pkg_type: String,
    pub exp_date: String,
    pub additional_comments: Option<String>,
}

impl Record for FoodDetail {
    const TABLE: Table = Table::Food;
}

/// Clothes detail row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClothesDetail {
    pub id: RowId,
    pub donation_id: RowId,
    pub donation_item_id: RowId,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: String,
    pub condition: String,
    pub fabric_type: String,
    pub qty: u32,
    pub additional_comments: Option<String>,
}

impl Record for ClothesDetail {
    const TABLE: Table = Table::Clothes;
}

/// A donation read back together with all of its child rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonationRecord {
    pub donation: Donation,
    pub items: Vec<DonationItem>,
    pub food: Vec<FoodDetail>,
    pub clothes: Vec<ClothesDetail>,
}

impl DonationRecord {
    /// Returns the item of the given type, if present.
    pub fn item(&self, item_type: ItemType) -> Option<&DonationItem> {
        self.items.iter().find(|i| i.item_type == item_type)
    }
}
