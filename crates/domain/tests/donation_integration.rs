//! Integration tests for donation requests and item handlers.
//!
//! These tests exercise the request as it arrives over the wire, through
//! validation and per-type row building, down to the stored records.

use common::RowId;
use domain::{
    DonationItem, DonationRequest, DonationService, DonationStatus, ItemDetail, ItemType, Record,
    ValidationError,
};
use row_store::{InMemoryRowStore, RowStoreExt, Table};
use serde_json::json;

fn parse(value: serde_json::Value) -> DonationRequest {
    serde_json::from_value(value).unwrap()
}

mod request_parsing {
    use super::*;

    #[test]
    fn full_payload_uses_wire_names() {
        let request = parse(json!({
            "donor_id": "d1",
            "org_id": "o1",
            "status": "pending",
            "food": {
                "name": "Rice",
                "type": "grain",
                "qty": 5,
                "pkg_type": "bag",
                "exp_date": "2025-01-01",
                "additional_comments": "dry storage"
            },
            "clothes": {
                "type": "shirt",
                "size": "M",
                "condition": "good",
                "fabric_type": "cotton",
                "qty": 3
            }
        }));

        assert_eq!(request.item_types(), vec![ItemType::Food, ItemType::Clothes]);
        let food = request.food.as_ref().unwrap();
        assert_eq!(food.kind, Some(json!("grain")));
        assert_eq!(food.additional_comments, Some(json!("dry storage")));

        let donation = request.validate().unwrap();
        assert_eq!(donation.status, DonationStatus::Pending);
    }

    #[test]
    fn null_and_empty_fields_count_as_missing() {
        let request = parse(json!({
            "donor_id": null,
            "org_id": "",
            "status": "pending",
            "food": { "name": "Rice" }
        }));

        assert_eq!(
            request.validate(),
            Err(ValidationError::MissingFields(vec!["donor_id", "org_id"]))
        );
    }

    #[test]
    fn missing_fields_are_reported_before_missing_items() {
        let request = parse(json!({ "org_id": "o1" }));

        assert_eq!(
            request.validate(),
            Err(ValidationError::MissingFields(vec!["donor_id", "status"]))
        );
    }

    #[test]
    fn incomplete_items_pass_top_level_validation() {
        let request = parse(json!({
            "donor_id": "d1",
            "org_id": "o1",
            "status": "accepted",
            "clothes": { "type": "shirt" }
        }));

        assert!(request.validate().is_ok());
        let clothes = request.detail(ItemType::Clothes).unwrap();
        assert_eq!(
            clothes.missing_fields(),
            vec!["size", "condition", "fabric_type", "qty"]
        );
    }
}

mod stored_records {
    use super::*;

    #[tokio::test]
    async fn detail_rows_round_trip_through_the_store() {
        let store = InMemoryRowStore::new();
        let request = parse(json!({
            "donor_id": "d1",
            "org_id": "o1",
            "status": "pending",
            "food": {
                "name": "Beans",
                "type": "canned",
                "qty": 12,
                "pkg_type": "can",
                "exp_date": "2026-03-01"
            }
        }));

        let donation_row = store
            .insert_one(Table::Donations, request.validate().unwrap().to_row())
            .await
            .unwrap()
            .unwrap();
        let donation_id: RowId = donation_row["id"].as_str().unwrap().parse().unwrap();

        let item_row = store
            .insert_one(
                Table::DonationItems,
                DonationItem::new_row(donation_id, ItemType::Food),
            )
            .await
            .unwrap()
            .unwrap();
        let item = DonationItem::from_row(item_row).unwrap();

        for detail in request.details() {
            let row = detail.build_row(donation_id, item.id).unwrap();
            store.insert_one(detail.table(), row).await.unwrap();
        }

        let service = DonationService::new(store);
        let record = service.get_donation(donation_id).await.unwrap().unwrap();
        assert_eq!(record.donation.donor_id, "d1");
        assert_eq!(record.item(ItemType::Food), Some(&item));
        assert_eq!(record.food.len(), 1);
        assert_eq!(record.food[0].qty, 12);
        assert_eq!(record.food[0].donation_item_id, item.id);
        assert!(record.clothes.is_empty());
    }

    #[tokio::test]
    async fn unknown_donation_is_none() {
        let service = DonationService::new(InMemoryRowStore::new());
        assert!(service.get_donation(RowId::new()).await.unwrap().is_none());
    }
}
