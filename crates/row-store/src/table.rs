//! Table catalogue and row filters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::RowId;

/// A single stored row, keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// Tables known to the store.
///
/// Every SQL identifier the store emits comes from this catalogue, never
/// from caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Donations,
    DonationItems,
    Food,
    Clothes,
}

impl Table {
    /// All tables in dependency order (parents first).
    pub const ALL: [Table; 4] = [
        Table::Donations,
        Table::DonationItems,
        Table::Food,
        Table::Clothes,
    ];

    /// Returns the table name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Donations => "donations",
            Table::DonationItems => "donation_items",
            Table::Food => "food",
            Table::Clothes => "clothes",
        }
    }

    /// Returns the columns of this table.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Table::Donations => &["id", "donor_id", "org_id", "status", "created_at"],
            Table::DonationItems => &["id", "donation_id", "type"],
            Table::Food => &[
                "id",
                "donation_id",
                "donation_item_id",
                "name",
                "type",
                "qty",
                "pkg_type",
                "exp_date",
                "additional_comments",
            ],
            Table::Clothes => &[
                "id",
                "donation_id",
                "donation_item_id",
                "type",
                "size",
                "condition",
                "fabric_type",
                "qty",
                "additional_comments",
            ],
        }
    }

    /// Returns the SQL type of `column`, used to compare filter values
    /// without casting the column itself.
    pub fn column_type(&self, column: &str) -> Option<&'static str> {
        if !self.has_column(column) {
            return None;
        }
        Some(match column {
            "id" | "donation_id" | "donation_item_id" => "uuid",
            "qty" => "integer",
            "exp_date" => "date",
            "created_at" => "timestamptz",
            _ => "text",
        })
    }

    /// Returns true if `column` belongs to this table.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    /// Returns true if the store stamps a `created_at` value on insert.
    pub fn has_created_at(&self) -> bool {
        matches!(self, Table::Donations)
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An equality filter on a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    column: &'static str,
    value: Value,
}

impl Filter {
    /// Matches rows whose `column` equals `value`.
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }

    /// Matches rows whose `column` holds the given row identity.
    pub fn eq_id(column: &'static str, id: RowId) -> Self {
        Self::eq(column, id.to_string())
    }

    /// Matches the row with the given primary key.
    pub fn id(id: RowId) -> Self {
        Self::eq_id("id", id)
    }

    /// Returns the filtered column.
    pub fn column(&self) -> &'static str {
        self.column
    }

    /// Returns the value to compare against.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns the value in the text form used for store-side comparison.
    pub fn value_text(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Returns true if `row` satisfies this filter.
    pub fn matches(&self, row: &Row) -> bool {
        row.get(self.column) == Some(&self.value)
    }
}
