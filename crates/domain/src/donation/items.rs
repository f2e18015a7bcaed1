//! Per-type item handlers.
//!
//! Each donation category provides its own payload type implementing
//! [`ItemDetail`]; the submission pipeline only ever talks to the trait, so a
//! new category is a new payload type plus an [`ItemType`] variant.
//!
//! Sub-payload fields are loosely typed JSON. A field counts as present when
//! it is truthy (not null, `false`, `0` or `""`), and present values are
//! handed to the store as sent, so a value of the wrong shape surfaces as a
//! storage failure of that one type rather than a malformed request.

use common::RowId;
use row_store::{Row, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ItemType, MissingDetailFields};

/// Type-specific detail payload of a donation item.
pub trait ItemDetail: std::fmt::Debug + Send + Sync {
    /// The item category this payload describes.
    fn item_type(&self) -> ItemType;

    /// The table the detail row is written to.
    fn table(&self) -> Table {
        self.item_type().detail_table()
    }

    /// Required fields that are absent, in reporting order.
    fn missing_fields(&self) -> Vec<&'static str>;

    /// Checks that every required field is present.
    fn validate(&self) -> Result<(), MissingDetailFields> {
        let fields = self.missing_fields();
        if fields.is_empty() {
            Ok(())
        } else {
            Err(MissingDetailFields {
                item_type: self.item_type(),
                fields,
            })
        }
    }

    /// Builds the detail row referencing the donation and its matching item.
    fn build_row(&self, donation_id: RowId, item_id: RowId) -> Result<Row, MissingDetailFields>;
}

fn present(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Numeric strings become numbers; anything else is left for the store to judge.
fn quantity(value: &Value) -> Value {
    match value {
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| value.clone()),
        other => other.clone(),
    }
}

fn comments(value: &Option<Value>) -> Value {
    value.clone().unwrap_or(Value::Null)
}

fn collect_missing<const N: usize>(checks: [(&'static str, bool); N]) -> Vec<&'static str> {
    checks
        .into_iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| name)
        .collect()
}

fn detail_row<const N: usize>(
    donation_id: RowId,
    item_id: RowId,
    columns: [(&str, Value); N],
) -> Row {
    let mut row = Row::new();
    row.insert(
        "donation_id".to_string(),
        Value::String(donation_id.to_string()),
    );
    row.insert(
        "donation_item_id".to_string(),
        Value::String(item_id.to_string()),
    );
    for (column, value) in columns {
        row.insert(column.to_string(), value);
    }
    row
}

/// Food donation payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodPayload {
    pub name: Option<Value>,
    #[serde(rename = "type")]
    pub kind: Option<Value>,
    pub qty: Option<Value>,
    pub pkg_type: Option<Value>,
    pub exp_date: Option<Value>,
    pub additional_comments: Option<Value>,
}

impl FoodPayload {
    /// Creates a complete food payload without comments.
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        qty: u32,
        pkg_type: impl Into<String>,
        exp_date: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(Value::String(name.into())),
            kind: Some(Value::String(kind.into())),
            qty: Some(Value::from(qty)),
            pkg_type: Some(Value::String(pkg_type.into())),
            exp_date: Some(Value::String(exp_date.into())),
            additional_comments: None,
        }
    }

    /// Sets the free-text comment.
    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.additional_comments = Some(Value::String(comments.into()));
        self
    }
}

impl ItemDetail for FoodPayload {
    fn item_type(&self) -> ItemType {
        ItemType::Food
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        collect_missing([
            ("name", present(&self.name).is_some()),
            ("type", present(&self.kind).is_some()),
            ("qty", present(&self.qty).is_some()),
            ("pkg_type", present(&self.pkg_type).is_some()),
            ("exp_date", present(&self.exp_date).is_some()),
        ])
    }

    fn build_row(&self, donation_id: RowId, item_id: RowId) -> Result<Row, MissingDetailFields> {
        match (
            present(&self.name),
            present(&self.kind),
            present(&self.qty),
            present(&self.pkg_type),
            present(&self.exp_date),
        ) {
            (Some(name), Some(kind), Some(qty), Some(pkg_type), Some(exp_date)) => Ok(detail_row(
                donation_id,
                item_id,
                [
                    ("name", name.clone()),
                    ("type", kind.clone()),
                    ("qty", quantity(qty)),
                    ("pkg_type", pkg_type.clone()),
                    ("exp_date", exp_date.clone()),
                    ("additional_comments", comments(&self.additional_comments)),
                ],
            )),
            _ => Err(MissingDetailFields {
                item_type: self.item_type(),
                fields: self.missing_fields(),
            }),
        }
    }
}

/// Clothes donation payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClothesPayload {
    #[serde(rename = "type")]
    pub kind: Option<Value>,
    pub size: Option<Value>,
    pub condition: Option<Value>,
    pub fabric_type: Option<Value>,
    pub qty: Option<Value>,
    pub additional_comments: Option<Value>,
}

impl ClothesPayload {
    /// Creates a complete clothes payload without comments.
    pub fn new(
        kind: impl Into<String>,
        size: impl Into<String>,
        condition: impl Into<String>,
        fabric_type: impl Into<String>,
        qty: u32,
    ) -> Self {
        Self {
            kind: Some(Value::String(kind.into())),
            size: Some(Value::String(size.into())),
            condition: Some(Value::String(condition.into())),
            fabric_type: Some(Value::String(fabric_type.into())),
            qty: Some(Value::from(qty)),
            additional_comments: None,
        }
    }

    /// Sets the free-text comment.
    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.additional_comments = Some(Value::String(comments.into()));
        self
    }
}

impl ItemDetail for ClothesPayload {
    fn item_type(&self) -> ItemType {
        ItemType::Clothes
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        collect_missing([
            ("type", present(&self.kind).is_some()),
            ("size", present(&self.size).is_some()),
            ("condition", present(&self.condition).is_some()),
            ("fabric_type", present(&self.fabric_type).is_some()),
            ("qty", present(&self.qty).is_some()),
        ])
    }

    fn build_row(&self, donation_id: RowId, item_id: RowId) -> Result<Row, MissingDetailFields> {
        match (
            present(&self.kind),
            present(&self.size),
            present(&self.condition),
            present(&self.fabric_type),
            present(&self.qty),
        ) {
            (Some(kind), Some(size), Some(condition), Some(fabric_type), Some(qty)) => {
                Ok(detail_row(
                    donation_id,
                    item_id,
                    [
                        ("type", kind.clone()),
                        ("size", size.clone()),
                        ("condition", condition.clone()),
                        ("fabric_type", fabric_type.clone()),
                        ("qty", quantity(qty)),
                        ("additional_comments", comments(&self.additional_comments)),
                    ],
                ))
            }
            _ => Err(MissingDetailFields {
                item_type: self.item_type(),
                fields: self.missing_fields(),
            }),
        }
    }
}
