//! Read-side access to stored donations.

use common::RowId;
use row_store::{Filter, Row, RowStore, RowStoreExt, Table};

use super::{
    ClothesDetail, Donation, DonationItem, DonationRecord, FoodDetail, Record, RecordError,
};
use crate::error::DomainError;

fn decode_all<R: Record>(rows: Vec<Row>) -> Result<Vec<R>, RecordError> {
    rows.into_iter().map(R::from_row).collect()
}

/// Service for reading donations back from the store.
pub struct DonationService<S: RowStore> {
    store: S,
}

impl<S: RowStore> DonationService<S> {
    /// Creates a new donation service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads a donation with its items and detail rows.
    ///
    /// Returns `None` if no donation has the given ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_donation(&self, id: RowId) -> Result<Option<DonationRecord>, DomainError> {
        let Some(row) = self.store.find_by_id(Table::Donations, id).await? else {
            return Ok(None);
        };
        let donation = Donation::from_row(row)?;

        let by_donation = || Filter::eq_id("donation_id", id);
        let items = self.store.select(Table::DonationItems, by_donation()).await?;
        let food = self.store.select(Table::Food, by_donation()).await?;
        let clothes = self.store.select(Table::Clothes, by_donation()).await?;

        Ok(Some(DonationRecord {
            donation,
            items: decode_all(items)?,
            food: decode_all(food)?,
            clothes: decode_all(clothes)?,
        }))
    }
}
