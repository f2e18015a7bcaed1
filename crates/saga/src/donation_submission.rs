//! Donation submission saga constants.

use domain::ItemType;

/// The saga type identifier for donation submission.
pub const SAGA_TYPE: &str = "DonationSubmission";

/// Step name: Validate the top-level payload.
pub const STEP_VALIDATE: &str = "validate_request";

/// Step name: Insert the parent donation row.
pub const STEP_INSERT_DONATION: &str = "insert_donation";

/// Step name: Insert one donation item row per present type.
pub const STEP_INSERT_ITEMS: &str = "insert_donation_items";

/// Step name: Map item types to the identities the store generated.
pub const STEP_MAP_ITEMS: &str = "map_donation_items";

/// Step name: Insert every type's detail row.
pub const STEP_INSERT_DETAILS: &str = "insert_details";

/// Step name used when a fault escaped every modelled step.
pub const STEP_UNEXPECTED: &str = "unexpected";

/// Step name: Insert the detail row of one item type.
pub fn detail_step(item_type: ItemType) -> &'static str {
    match item_type {
        ItemType::Food => "insert_food_detail",
        ItemType::Clothes => "insert_clothes_detail",
    }
}
