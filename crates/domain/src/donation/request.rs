//! Incoming donation request and top-level validation.

use serde::{Deserialize, Serialize};

use super::{
    ClothesPayload, DonationStatus, FoodPayload, ItemDetail, ItemType, NewDonation,
    ValidationError,
};

/// Body of a donation submission.
///
/// Every field is optional at the wire level so that absent values surface
/// as validation failures listing the missing names, not as parse errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationRequest {
    pub donor_id: Option<String>,
    pub org_id: Option<String>,
    pub status: Option<String>,
    pub food: Option<FoodPayload>,
    pub clothes: Option<ClothesPayload>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl DonationRequest {
    /// Creates a request with the top-level fields set and no items.
    pub fn new(
        donor_id: impl Into<String>,
        org_id: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            donor_id: Some(donor_id.into()),
            org_id: Some(org_id.into()),
            status: Some(status.into()),
            food: None,
            clothes: None,
        }
    }

    /// Attaches a food payload.
    pub fn with_food(mut self, food: FoodPayload) -> Self {
        self.food = Some(food);
        self
    }

    /// Attaches a clothes payload.
    pub fn with_clothes(mut self, clothes: ClothesPayload) -> Self {
        self.clothes = Some(clothes);
        self
    }

    /// Returns every absent top-level field, not just the first.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("donor_id", &self.donor_id),
            ("org_id", &self.org_id),
            ("status", &self.status),
        ]
        .into_iter()
        .filter(|(_, value)| present(value).is_none())
        .map(|(name, _)| name)
        .collect()
    }

    /// Returns true if at least one item payload is present.
    pub fn has_items(&self) -> bool {
        self.food.is_some() || self.clothes.is_some()
    }

    /// Returns the detail payload for `item_type`, if present.
    pub fn detail(&self, item_type: ItemType) -> Option<&dyn ItemDetail> {
        match item_type {
            ItemType::Food => self.food.as_ref().map(|f| f as &dyn ItemDetail),
            ItemType::Clothes => self.clothes.as_ref().map(|c| c as &dyn ItemDetail),
        }
    }

    /// Returns the present detail payloads in processing order.
    pub fn details(&self) -> Vec<&dyn ItemDetail> {
        ItemType::ALL
            .into_iter()
            .filter_map(|t| self.detail(t))
            .collect()
    }

    /// Returns the item types present in this request.
    pub fn item_types(&self) -> Vec<ItemType> {
        self.details().iter().map(|d| d.item_type()).collect()
    }

    /// Validates the top-level payload.
    ///
    /// Item payload contents are not inspected here; they are checked per
    /// type when their detail rows are written.
    pub fn validate(&self) -> Result<NewDonation, ValidationError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }
        if !self.has_items() {
            return Err(ValidationError::NoItems);
        }

        let (Some(donor_id), Some(org_id), Some(status)) = (
            present(&self.donor_id),
            present(&self.org_id),
            present(&self.status),
        ) else {
            return Err(ValidationError::MissingFields(self.missing_fields()));
        };

        let status: DonationStatus = status.parse().map_err(ValidationError::UnknownStatus)?;

        Ok(NewDonation {
            donor_id: donor_id.to_string(),
            org_id: org_id.to_string(),
            status,
        })
    }
}
