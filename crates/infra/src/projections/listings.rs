use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use estate_catalog::{PropertyTypeId, TagId};
use estate_core::{Money, PartnerId, UserId};
use estate_events::EventEnvelope;
use estate_property::{PropertyEvent, PropertyId, PropertyState};

use crate::projections::Projection;
use crate::projections::cursor::{CursorCheck, ProjectionError, StreamCursors};
use crate::read_model::{InMemoryReadStore, ReadStore};
use crate::streams;

/// One row of the property list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyListing {
    pub property_id: PropertyId,
    pub name: String,
    pub postcode: Option<String>,
    pub state: PropertyState,
    pub expected_price: Money,
    pub best_price: Money,
    pub selling_price: Money,
    pub buyer_id: Option<PartnerId>,
    pub salesperson_id: Option<UserId>,
    pub property_type_id: Option<PropertyTypeId>,
    pub tag_ids: BTreeSet<TagId>,
    pub living_area: u32,
    pub garden_area: u32,
    pub active: bool,
    pub offer_count: u32,
    pub listed_at: DateTime<Utc>,
}

impl PropertyListing {
    pub fn total_area(&self) -> u32 {
        self.living_area.saturating_add(self.garden_area)
    }
}

/// Property listings and the per-type offer statistics derived from them.
#[derive(Debug, Default)]
pub struct ListingsProjection {
    store: InMemoryReadStore<PropertyId, PropertyListing>,
    cursors: StreamCursors,
}

impl ListingsProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property_id: PropertyId) -> Option<PropertyListing> {
        self.store.get(&property_id)
    }

    /// Every listing, archived ones included, newest first.
    pub fn all(&self) -> Vec<PropertyListing> {
        newest_first(self.store.list())
    }

    /// Listings a salesperson is in charge of, newest first.
    pub fn by_salesperson(&self, salesperson_id: UserId, include_archived: bool) -> Vec<PropertyListing> {
        newest_first(
            self.store
                .list()
                .into_iter()
                .filter(|l| l.salesperson_id == Some(salesperson_id))
                .filter(|l| include_archived || l.active)
                .collect(),
        )
    }

    pub fn properties_of_type(&self, type_id: PropertyTypeId) -> Vec<PropertyListing> {
        newest_first(
            self.store
                .list()
                .into_iter()
                .filter(|l| l.property_type_id == Some(type_id))
                .collect(),
        )
    }

    /// Offers made on properties of the given type.
    pub fn offer_count_for_type(&self, type_id: PropertyTypeId) -> u32 {
        self.store
            .list()
            .iter()
            .filter(|l| l.property_type_id == Some(type_id))
            .map(|l| l.offer_count)
            .sum()
    }

    fn update(
        &self,
        property_id: PropertyId,
        change: impl FnOnce(&mut PropertyListing),
    ) {
        if let Some(mut listing) = self.store.get(&property_id) {
            change(&mut listing);
            self.store.upsert(property_id, listing);
        }
    }

    fn apply_event(&self, ev: PropertyEvent) {
        match ev {
            PropertyEvent::PropertyCreated(e) => {
                self.store.upsert(
                    e.property_id,
                    PropertyListing {
                        property_id: e.property_id,
                        name: e.details.name,
                        postcode: e.details.postcode,
                        state: PropertyState::New,
                        expected_price: e.expected_price,
                        best_price: Money::ZERO,
                        selling_price: Money::ZERO,
                        buyer_id: None,
                        salesperson_id: e.salesperson_id,
                        property_type_id: e.property_type_id,
                        tag_ids: e.tag_ids,
                        living_area: e.details.living_area,
                        garden_area: e.garden.area,
                        active: true,
                        offer_count: 0,
                        listed_at: e.occurred_at,
                    },
                );
            }
            PropertyEvent::DetailsUpdated(e) => self.update(e.property_id, |l| {
                l.name = e.details.name;
                l.postcode = e.details.postcode;
                l.living_area = e.details.living_area;
            }),
            PropertyEvent::ExpectedPriceChanged(e) => {
                self.update(e.property_id, |l| l.expected_price = e.expected_price)
            }
            PropertyEvent::GardenChanged(e) => {
                self.update(e.property_id, |l| l.garden_area = e.garden.area)
            }
            PropertyEvent::PropertyTypeAssigned(e) => {
                self.update(e.property_id, |l| l.property_type_id = e.property_type_id)
            }
            PropertyEvent::TagsChanged(e) => self.update(e.property_id, |l| l.tag_ids = e.tag_ids),
            PropertyEvent::SalespersonAssigned(e) => {
                self.update(e.property_id, |l| l.salesperson_id = e.salesperson_id)
            }
            PropertyEvent::ActiveChanged(e) => self.update(e.property_id, |l| l.active = e.active),
            PropertyEvent::OfferSubmitted(e) => self.update(e.property_id, |l| {
                l.offer_count += 1;
                l.best_price = l.best_price.max(e.price);
                l.state = e.state;
            }),
            PropertyEvent::OfferAccepted(e) => self.update(e.property_id, |l| {
                l.buyer_id = Some(e.partner_id);
                l.selling_price = e.price;
                l.state = PropertyState::OfferAccepted;
            }),
            PropertyEvent::OfferRefused(_) | PropertyEvent::OfferValidityChanged(_) => {}
            PropertyEvent::PropertySold(e) => {
                self.update(e.property_id, |l| l.state = PropertyState::Sold)
            }
            PropertyEvent::PropertyCancelled(e) => {
                self.update(e.property_id, |l| l.state = PropertyState::Cancelled)
            }
            PropertyEvent::PropertyDeleted(e) => {
                self.store.remove(&e.property_id);
            }
        }
    }
}

fn newest_first(mut listings: Vec<PropertyListing>) -> Vec<PropertyListing> {
    listings.sort_by(|a, b| {
        b.listed_at
            .cmp(&a.listed_at)
            .then_with(|| b.property_id.cmp(&a.property_id))
    });
    listings
}

impl Projection for ListingsProjection {
    fn name(&self) -> &'static str {
        "estate.listings"
    }

    fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != streams::PROPERTY {
            return Ok(());
        }

        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();
        if self.cursors.check(aggregate_id, seq)? == CursorCheck::Skip {
            tracing::debug!(projection = self.name(), %aggregate_id, seq, "skipping replayed event");
            return Ok(());
        }

        let ev: PropertyEvent = serde_json::from_value(envelope.payload().clone()).map_err(|e| {
            ProjectionError::Deserialize {
                aggregate_type: streams::PROPERTY,
                reason: e.to_string(),
            }
        })?;
        if ev.property_id().0 != aggregate_id {
            return Err(ProjectionError::StreamMismatch(aggregate_id));
        }

        self.apply_event(ev);
        self.cursors.advance(aggregate_id, seq);
        Ok(())
    }

    fn reset(&self) {
        self.store.clear();
        self.cursors.clear();
    }
}
