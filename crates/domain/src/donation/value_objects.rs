//! Value objects for the donation domain.

use row_store::Table;
use serde::{Deserialize, Serialize};

/// Status of a donation.
///
/// Submissions normally arrive as `Pending`; the other values exist so that
/// rows written by later workflows can still be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl DonationStatus {
    /// Returns the status as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::Accepted => "accepted",
            DonationStatus::Rejected => "rejected",
            DonationStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DonationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DonationStatus::Pending),
            "accepted" => Ok(DonationStatus::Accepted),
            "rejected" => Ok(DonationStatus::Rejected),
            "completed" => Ok(DonationStatus::Completed),
            other => Err(other.to_string()),
        }
    }
}

/// Category of a donation item.
///
/// Each category owns exactly one detail table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Food,
    Clothes,
}

impl ItemType {
    /// All item types, in the order a submission processes them.
    pub const ALL: [ItemType; 2] = [ItemType::Food, ItemType::Clothes];

    /// Returns the type name as stored in `donation_items.type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Food => "food",
            ItemType::Clothes => "clothes",
        }
    }

    /// Returns the table holding this type's detail rows.
    pub fn detail_table(&self) -> Table {
        match self {
            ItemType::Food => Table::Food,
            ItemType::Clothes => Table::Clothes,
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "food" => Ok(ItemType::Food),
            "clothes" => Ok(ItemType::Clothes),
            other => Err(other.to_string()),
        }
    }
}
