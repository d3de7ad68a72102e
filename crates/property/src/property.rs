use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use estate_catalog::{PropertyTypeId, TagId};
use estate_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, Money, PartnerId, UserId, validate,
};
use estate_events::{Command, Event};

use crate::details::{AVAILABILITY_OFFSET_MONTHS, Garden, GardenOrientation, PropertyDetails};
use crate::offer::{
    DEFAULT_VALIDITY_DAYS, Offer, OfferId, OfferStatus, deadline_for, validity_for_deadline,
};
use crate::state::PropertyState;

estate_core::aggregate_id!(
    /// Property identifier.
    PropertyId
);

/// Selling price must be at least `9/10` of the expected price.
pub const MIN_SELLING_RATIO: (i64, i64) = (9, 10);

/// Aggregate root: Property (a listing and the offers made on it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    id: PropertyId,
    details: PropertyDetails,
    expected_price: Money,
    /// Zero until an offer is accepted.
    selling_price: Money,
    garden: Garden,
    active: bool,
    state: PropertyState,
    property_type_id: Option<PropertyTypeId>,
    buyer_id: Option<PartnerId>,
    salesperson_id: Option<UserId>,
    tag_ids: BTreeSet<TagId>,
    offers: Vec<Offer>,
    version: u64,
    created: bool,
    deleted: bool,
}

impl Property {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: PropertyId) -> Self {
        Self {
            id,
            details: PropertyDetails::named(""),
            expected_price: Money::ZERO,
            selling_price: Money::ZERO,
            garden: Garden::none(),
            active: true,
            state: PropertyState::New,
            property_type_id: None,
            buyer_id: None,
            salesperson_id: None,
            tag_ids: BTreeSet::new(),
            offers: Vec::new(),
            version: 0,
            created: false,
            deleted: false,
        }
    }

    pub fn id_typed(&self) -> PropertyId {
        self.id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn details(&self) -> &PropertyDetails {
        &self.details
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn expected_price(&self) -> Money {
        self.expected_price
    }

    pub fn selling_price(&self) -> Money {
        self.selling_price
    }

    pub fn garden(&self) -> Garden {
        self.garden
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> PropertyState {
        self.state
    }

    pub fn property_type_id(&self) -> Option<PropertyTypeId> {
        self.property_type_id
    }

    pub fn buyer_id(&self) -> Option<PartnerId> {
        self.buyer_id
    }

    pub fn salesperson_id(&self) -> Option<UserId> {
        self.salesperson_id
    }

    pub fn tag_ids(&self) -> &BTreeSet<TagId> {
        &self.tag_ids
    }

    /// Offers in submission order.
    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    pub fn offer(&self, offer_id: OfferId) -> Option<&Offer> {
        self.offers.iter().find(|o| o.id == offer_id)
    }

    pub fn accepted_offer(&self) -> Option<&Offer> {
        self.offers.iter().find(|o| o.is_accepted())
    }

    /// Offers for display: highest price first.
    pub fn offers_by_price(&self) -> Vec<&Offer> {
        let mut sorted: Vec<&Offer> = self.offers.iter().collect();
        sorted.sort_by(|a, b| b.price.cmp(&a.price));
        sorted
    }

    /// Living area + garden area.
    pub fn total_area(&self) -> u32 {
        self.details.living_area.saturating_add(self.garden.area)
    }

    /// Highest offer price, or zero without offers.
    pub fn best_price(&self) -> Money {
        self.offers
            .iter()
            .map(|o| o.price)
            .max()
            .unwrap_or(Money::ZERO)
    }
}

impl AggregateRoot for Property {
    type Id = PropertyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProperty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProperty {
    pub property_id: PropertyId,
    pub details: PropertyDetails,
    pub expected_price: Money,
    pub garden: Garden,
    pub property_type_id: Option<PropertyTypeId>,
    pub tag_ids: BTreeSet<TagId>,
    pub salesperson_id: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateDetails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDetails {
    pub property_id: PropertyId,
    pub details: PropertyDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetExpectedPrice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetExpectedPrice {
    pub property_id: PropertyId,
    pub expected_price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetGarden (flag toggle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetGarden {
    pub property_id: PropertyId,
    pub enabled: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateGarden (area/orientation edit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateGarden {
    pub property_id: PropertyId,
    pub area: u32,
    pub orientation: Option<GardenOrientation>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AssignPropertyType.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignPropertyType {
    pub property_id: PropertyId,
    pub property_type_id: Option<PropertyTypeId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetTags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTags {
    pub property_id: PropertyId,
    pub tag_ids: BTreeSet<TagId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AssignSalesperson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignSalesperson {
    pub property_id: PropertyId,
    pub salesperson_id: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetActive (archive / unarchive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetActive {
    pub property_id: PropertyId,
    pub active: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SubmitOffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOffer {
    pub property_id: PropertyId,
    pub offer_id: OfferId,
    pub partner_id: PartnerId,
    pub price: Money,
    /// Defaults to [`DEFAULT_VALIDITY_DAYS`].
    pub validity_days: Option<u32>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AcceptOffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptOffer {
    pub property_id: PropertyId,
    pub offer_id: OfferId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RefuseOffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefuseOffer {
    pub property_id: PropertyId,
    pub offer_id: OfferId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetOfferValidity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOfferValidity {
    pub property_id: PropertyId,
    pub offer_id: OfferId,
    pub validity_days: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetOfferDeadline (back-derives validity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOfferDeadline {
    pub property_id: PropertyId,
    pub offer_id: OfferId,
    pub deadline: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkSold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkSold {
    pub property_id: PropertyId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkCancelled {
    pub property_id: PropertyId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteProperty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteProperty {
    pub property_id: PropertyId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyCommand {
    CreateProperty(CreateProperty),
    UpdateDetails(UpdateDetails),
    SetExpectedPrice(SetExpectedPrice),
    SetGarden(SetGarden),
    UpdateGarden(UpdateGarden),
    AssignPropertyType(AssignPropertyType),
    SetTags(SetTags),
    AssignSalesperson(AssignSalesperson),
    SetActive(SetActive),
    SubmitOffer(SubmitOffer),
    AcceptOffer(AcceptOffer),
    RefuseOffer(RefuseOffer),
    SetOfferValidity(SetOfferValidity),
    SetOfferDeadline(SetOfferDeadline),
    MarkSold(MarkSold),
    MarkCancelled(MarkCancelled),
    DeleteProperty(DeleteProperty),
}

impl PropertyCommand {
    pub fn property_id(&self) -> PropertyId {
        match self {
            PropertyCommand::CreateProperty(c) => c.property_id,
            PropertyCommand::UpdateDetails(c) => c.property_id,
            PropertyCommand::SetExpectedPrice(c) => c.property_id,
            PropertyCommand::SetGarden(c) => c.property_id,
            PropertyCommand::UpdateGarden(c) => c.property_id,
            PropertyCommand::AssignPropertyType(c) => c.property_id,
            PropertyCommand::SetTags(c) => c.property_id,
            PropertyCommand::AssignSalesperson(c) => c.property_id,
            PropertyCommand::SetActive(c) => c.property_id,
            PropertyCommand::SubmitOffer(c) => c.property_id,
            PropertyCommand::AcceptOffer(c) => c.property_id,
            PropertyCommand::RefuseOffer(c) => c.property_id,
            PropertyCommand::SetOfferValidity(c) => c.property_id,
            PropertyCommand::SetOfferDeadline(c) => c.property_id,
            PropertyCommand::MarkSold(c) => c.property_id,
            PropertyCommand::MarkCancelled(c) => c.property_id,
            PropertyCommand::DeleteProperty(c) => c.property_id,
        }
    }
}

impl Command for PropertyCommand {
    fn target_aggregate_id(&self) -> AggregateId {
        self.property_id().0
    }
}

/// Event: PropertyCreated (defaults already resolved).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyCreated {
    pub property_id: PropertyId,
    pub details: PropertyDetails,
    pub expected_price: Money,
    pub garden: Garden,
    pub property_type_id: Option<PropertyTypeId>,
    pub tag_ids: BTreeSet<TagId>,
    pub salesperson_id: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DetailsUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailsUpdated {
    pub property_id: PropertyId,
    pub details: PropertyDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ExpectedPriceChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedPriceChanged {
    pub property_id: PropertyId,
    pub expected_price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: GardenChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GardenChanged {
    pub property_id: PropertyId,
    pub garden: Garden,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PropertyTypeAssigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTypeAssigned {
    pub property_id: PropertyId,
    pub property_type_id: Option<PropertyTypeId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TagsChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagsChanged {
    pub property_id: PropertyId,
    pub tag_ids: BTreeSet<TagId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SalespersonAssigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalespersonAssigned {
    pub property_id: PropertyId,
    pub salesperson_id: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ActiveChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveChanged {
    pub property_id: PropertyId,
    pub active: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OfferSubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferSubmitted {
    pub property_id: PropertyId,
    pub offer_id: OfferId,
    pub partner_id: PartnerId,
    pub price: Money,
    pub validity_days: u32,
    pub created_on: NaiveDate,
    /// Property state once the offer is admitted.
    pub state: PropertyState,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OfferAccepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferAccepted {
    pub property_id: PropertyId,
    pub offer_id: OfferId,
    pub partner_id: PartnerId,
    pub price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OfferRefused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferRefused {
    pub property_id: PropertyId,
    pub offer_id: OfferId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OfferValidityChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferValidityChanged {
    pub property_id: PropertyId,
    pub offer_id: OfferId,
    pub validity_days: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PropertySold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySold {
    pub property_id: PropertyId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PropertyCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyCancelled {
    pub property_id: PropertyId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PropertyDeleted (offers go with it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDeleted {
    pub property_id: PropertyId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyEvent {
    PropertyCreated(PropertyCreated),
    DetailsUpdated(DetailsUpdated),
    ExpectedPriceChanged(ExpectedPriceChanged),
    GardenChanged(GardenChanged),
    PropertyTypeAssigned(PropertyTypeAssigned),
    TagsChanged(TagsChanged),
    SalespersonAssigned(SalespersonAssigned),
    ActiveChanged(ActiveChanged),
    OfferSubmitted(OfferSubmitted),
    OfferAccepted(OfferAccepted),
    OfferRefused(OfferRefused),
    OfferValidityChanged(OfferValidityChanged),
    PropertySold(PropertySold),
    PropertyCancelled(PropertyCancelled),
    PropertyDeleted(PropertyDeleted),
}

impl Event for PropertyEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PropertyEvent::PropertyCreated(_) => "estate.property.created",
            PropertyEvent::DetailsUpdated(_) => "estate.property.details_updated",
            PropertyEvent::ExpectedPriceChanged(_) => "estate.property.expected_price_changed",
            PropertyEvent::GardenChanged(_) => "estate.property.garden_changed",
            PropertyEvent::PropertyTypeAssigned(_) => "estate.property.type_assigned",
            PropertyEvent::TagsChanged(_) => "estate.property.tags_changed",
            PropertyEvent::SalespersonAssigned(_) => "estate.property.salesperson_assigned",
            PropertyEvent::ActiveChanged(_) => "estate.property.active_changed",
            PropertyEvent::OfferSubmitted(_) => "estate.property.offer_submitted",
            PropertyEvent::OfferAccepted(_) => "estate.property.offer_accepted",
            PropertyEvent::OfferRefused(_) => "estate.property.offer_refused",
            PropertyEvent::OfferValidityChanged(_) => "estate.property.offer_validity_changed",
            PropertyEvent::PropertySold(_) => "estate.property.sold",
            PropertyEvent::PropertyCancelled(_) => "estate.property.cancelled",
            PropertyEvent::PropertyDeleted(_) => "estate.property.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PropertyEvent::PropertyCreated(e) => e.occurred_at,
            PropertyEvent::DetailsUpdated(e) => e.occurred_at,
            PropertyEvent::ExpectedPriceChanged(e) => e.occurred_at,
            PropertyEvent::GardenChanged(e) => e.occurred_at,
            PropertyEvent::PropertyTypeAssigned(e) => e.occurred_at,
            PropertyEvent::TagsChanged(e) => e.occurred_at,
            PropertyEvent::SalespersonAssigned(e) => e.occurred_at,
            PropertyEvent::ActiveChanged(e) => e.occurred_at,
            PropertyEvent::OfferSubmitted(e) => e.occurred_at,
            PropertyEvent::OfferAccepted(e) => e.occurred_at,
            PropertyEvent::OfferRefused(e) => e.occurred_at,
            PropertyEvent::OfferValidityChanged(e) => e.occurred_at,
            PropertyEvent::PropertySold(e) => e.occurred_at,
            PropertyEvent::PropertyCancelled(e) => e.occurred_at,
            PropertyEvent::PropertyDeleted(e) => e.occurred_at,
        }
    }
}

impl PropertyEvent {
    pub fn property_id(&self) -> PropertyId {
        match self {
            PropertyEvent::PropertyCreated(e) => e.property_id,
            PropertyEvent::DetailsUpdated(e) => e.property_id,
            PropertyEvent::ExpectedPriceChanged(e) => e.property_id,
            PropertyEvent::GardenChanged(e) => e.property_id,
            PropertyEvent::PropertyTypeAssigned(e) => e.property_id,
            PropertyEvent::TagsChanged(e) => e.property_id,
            PropertyEvent::SalespersonAssigned(e) => e.property_id,
            PropertyEvent::ActiveChanged(e) => e.property_id,
            PropertyEvent::OfferSubmitted(e) => e.property_id,
            PropertyEvent::OfferAccepted(e) => e.property_id,
            PropertyEvent::OfferRefused(e) => e.property_id,
            PropertyEvent::OfferValidityChanged(e) => e.property_id,
            PropertyEvent::PropertySold(e) => e.property_id,
            PropertyEvent::PropertyCancelled(e) => e.property_id,
            PropertyEvent::PropertyDeleted(e) => e.property_id,
        }
    }
}

impl Aggregate for Property {
    type Command = PropertyCommand;
    type Event = PropertyEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PropertyEvent::PropertyCreated(e) => {
                self.id = e.property_id;
                self.details = e.details.clone();
                self.expected_price = e.expected_price;
                self.selling_price = Money::ZERO;
                self.garden = e.garden;
                self.active = true;
                self.state = PropertyState::New;
                self.property_type_id = e.property_type_id;
                self.buyer_id = None;
                self.salesperson_id = e.salesperson_id;
                self.tag_ids = e.tag_ids.clone();
                self.offers.clear();
                self.created = true;
            }
            PropertyEvent::DetailsUpdated(e) => {
                self.details = e.details.clone();
            }
            PropertyEvent::ExpectedPriceChanged(e) => {
                self.expected_price = e.expected_price;
            }
            PropertyEvent::GardenChanged(e) => {
                self.garden = e.garden;
            }
            PropertyEvent::PropertyTypeAssigned(e) => {
                self.property_type_id = e.property_type_id;
                for offer in &mut self.offers {
                    offer.property_type_id = e.property_type_id;
                }
            }
            PropertyEvent::TagsChanged(e) => {
                self.tag_ids = e.tag_ids.clone();
            }
            PropertyEvent::SalespersonAssigned(e) => {
                self.salesperson_id = e.salesperson_id;
            }
            PropertyEvent::ActiveChanged(e) => {
                self.active = e.active;
            }
            PropertyEvent::OfferSubmitted(e) => {
                self.offers.push(Offer {
                    id: e.offer_id,
                    partner_id: e.partner_id,
                    price: e.price,
                    status: None,
                    validity_days: e.validity_days,
                    created_on: e.created_on,
                    property_type_id: self.property_type_id,
                });
                self.state = e.state;
            }
            PropertyEvent::OfferAccepted(e) => {
                if let Some(offer) = self.offer_mut(e.offer_id) {
                    offer.status = Some(OfferStatus::Accepted);
                }
                self.buyer_id = Some(e.partner_id);
                self.selling_price = e.price;
                self.state = PropertyState::OfferAccepted;
            }
            PropertyEvent::OfferRefused(e) => {
                if let Some(offer) = self.offer_mut(e.offer_id) {
                    offer.status = Some(OfferStatus::Refused);
                }
            }
            PropertyEvent::OfferValidityChanged(e) => {
                if let Some(offer) = self.offer_mut(e.offer_id) {
                    offer.validity_days = e.validity_days;
                }
            }
            PropertyEvent::PropertySold(_) => {
                self.state = PropertyState::Sold;
            }
            PropertyEvent::PropertyCancelled(_) => {
                self.state = PropertyState::Cancelled;
            }
            PropertyEvent::PropertyDeleted(_) => {
                self.offers.clear();
                self.deleted = true;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        if !matches!(command, PropertyCommand::CreateProperty(_)) {
            self.ensure_live(command.property_id())?;
        }

        match command {
            PropertyCommand::CreateProperty(cmd) => self.handle_create(cmd),
            PropertyCommand::UpdateDetails(cmd) => self.handle_update_details(cmd),
            PropertyCommand::SetExpectedPrice(cmd) => self.handle_set_expected_price(cmd),
            PropertyCommand::SetGarden(cmd) => Ok(self
                .garden
                .toggled(cmd.enabled)
                .map(|garden| {
                    PropertyEvent::GardenChanged(GardenChanged {
                        property_id: cmd.property_id,
                        garden,
                        occurred_at: cmd.occurred_at,
                    })
                })
                .into_iter()
                .collect()),
            PropertyCommand::UpdateGarden(cmd) => {
                let garden = Garden {
                    enabled: self.garden.enabled,
                    area: cmd.area,
                    orientation: cmd.orientation,
                };
                if garden == self.garden {
                    return Ok(vec![]);
                }
                Ok(vec![PropertyEvent::GardenChanged(GardenChanged {
                    property_id: cmd.property_id,
                    garden,
                    occurred_at: cmd.occurred_at,
                })])
            }
            PropertyCommand::AssignPropertyType(cmd) => {
                if cmd.property_type_id == self.property_type_id {
                    return Ok(vec![]);
                }
                Ok(vec![PropertyEvent::PropertyTypeAssigned(PropertyTypeAssigned {
                    property_id: cmd.property_id,
                    property_type_id: cmd.property_type_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
            PropertyCommand::SetTags(cmd) => {
                if cmd.tag_ids == self.tag_ids {
                    return Ok(vec![]);
                }
                Ok(vec![PropertyEvent::TagsChanged(TagsChanged {
                    property_id: cmd.property_id,
                    tag_ids: cmd.tag_ids.clone(),
                    occurred_at: cmd.occurred_at,
                })])
            }
            PropertyCommand::AssignSalesperson(cmd) => {
                if cmd.salesperson_id == self.salesperson_id {
                    return Ok(vec![]);
                }
                Ok(vec![PropertyEvent::SalespersonAssigned(SalespersonAssigned {
                    property_id: cmd.property_id,
                    salesperson_id: cmd.salesperson_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
            PropertyCommand::SetActive(cmd) => {
                if cmd.active == self.active {
                    return Ok(vec![]);
                }
                Ok(vec![PropertyEvent::ActiveChanged(ActiveChanged {
                    property_id: cmd.property_id,
                    active: cmd.active,
                    occurred_at: cmd.occurred_at,
                })])
            }
            PropertyCommand::SubmitOffer(cmd) => self.handle_submit_offer(cmd),
            PropertyCommand::AcceptOffer(cmd) => self.handle_accept_offer(cmd),
            PropertyCommand::RefuseOffer(cmd) => {
                let offer = self.find_offer(cmd.offer_id)?;
                if offer.status == Some(OfferStatus::Refused) {
                    return Ok(vec![]);
                }
                Ok(vec![PropertyEvent::OfferRefused(OfferRefused {
                    property_id: cmd.property_id,
                    offer_id: cmd.offer_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
            PropertyCommand::SetOfferValidity(cmd) => {
                self.validity_change(cmd.offer_id, cmd.validity_days, cmd.occurred_at)
            }
            PropertyCommand::SetOfferDeadline(cmd) => {
                let offer = self.find_offer(cmd.offer_id)?;
                let validity_days = validity_for_deadline(offer.created_on, cmd.deadline)?;
                self.validity_change(cmd.offer_id, validity_days, cmd.occurred_at)
            }
            PropertyCommand::MarkSold(cmd) => self.handle_mark_sold(cmd),
            PropertyCommand::MarkCancelled(cmd) => self.handle_mark_cancelled(cmd),
            PropertyCommand::DeleteProperty(cmd) => {
                if !self.state.can_be_deleted() {
                    return Err(DomainError::guard(
                        "only new and cancelled properties can be deleted",
                    ));
                }
                Ok(vec![PropertyEvent::PropertyDeleted(PropertyDeleted {
                    property_id: cmd.property_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
        }
    }
}

/// Price-ratio rule: a set selling price must reach 90% of the expected price.
pub fn check_price_ratio(selling_price: Money, expected_price: Money) -> Result<(), DomainError> {
    if selling_price.is_zero() {
        return Ok(());
    }
    let (numerator, denominator) = MIN_SELLING_RATIO;
    if !selling_price.at_least_fraction_of(expected_price, numerator, denominator) {
        return Err(DomainError::guard(
            "the selling price must be at least 90% of the expected price; \
             reduce the expected price to accept this offer",
        ));
    }
    Ok(())
}

impl Property {
    fn ensure_live(&self, property_id: PropertyId) -> Result<(), DomainError> {
        if !self.created || self.deleted {
            return Err(DomainError::not_found());
        }
        if self.id != property_id {
            return Err(DomainError::invalid_id("property_id mismatch"));
        }
        Ok(())
    }

    fn find_offer(&self, offer_id: OfferId) -> Result<&Offer, DomainError> {
        self.offer(offer_id).ok_or_else(DomainError::not_found)
    }

    fn offer_mut(&mut self, offer_id: OfferId) -> Option<&mut Offer> {
        self.offers.iter_mut().find(|o| o.id == offer_id)
    }

    fn handle_create(&self, cmd: &CreateProperty) -> Result<Vec<PropertyEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("property already exists"));
        }
        validate::positive_price("expected price", cmd.expected_price)?;

        let mut details = cmd.details.clone();
        details.name = validate::required_text("property title", &details.name)?;
        if details.date_availability.is_none() {
            details.date_availability = Some(crate::details::default_availability(
                cmd.occurred_at.date_naive(),
                AVAILABILITY_OFFSET_MONTHS,
            ));
        }

        Ok(vec![PropertyEvent::PropertyCreated(PropertyCreated {
            property_id: cmd.property_id,
            details,
            expected_price: cmd.expected_price,
            garden: cmd.garden,
            property_type_id: cmd.property_type_id,
            tag_ids: cmd.tag_ids.clone(),
            salesperson_id: cmd.salesperson_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_details(
        &self,
        cmd: &UpdateDetails,
    ) -> Result<Vec<PropertyEvent>, DomainError> {
        let mut details = cmd.details.clone();
        details.name = validate::required_text("property title", &details.name)?;
        if details == self.details {
            return Ok(vec![]);
        }

        Ok(vec![PropertyEvent::DetailsUpdated(DetailsUpdated {
            property_id: cmd.property_id,
            details,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_expected_price(
        &self,
        cmd: &SetExpectedPrice,
    ) -> Result<Vec<PropertyEvent>, DomainError> {
        validate::positive_price("expected price", cmd.expected_price)?;
        check_price_ratio(self.selling_price, cmd.expected_price)?;
        if cmd.expected_price == self.expected_price {
            return Ok(vec![]);
        }

        Ok(vec![PropertyEvent::ExpectedPriceChanged(ExpectedPriceChanged {
            property_id: cmd.property_id,
            expected_price: cmd.expected_price,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_submit_offer(&self, cmd: &SubmitOffer) -> Result<Vec<PropertyEvent>, DomainError> {
        validate::positive_price("offer price", cmd.price)?;

        if self.state.is_closed() {
            return Err(DomainError::guard(format!(
                "offers cannot be made on a {} property",
                self.state
            )));
        }

        if !self.offers.is_empty() {
            let best = self.best_price();
            if cmd.price <= best {
                return Err(DomainError::guard(format!(
                    "the offer must be higher than {best}"
                )));
            }
        }

        if self.offer(cmd.offer_id).is_some() {
            return Err(DomainError::conflict("offer already exists"));
        }

        let created_on = cmd.occurred_at.date_naive();
        let validity_days = cmd.validity_days.unwrap_or(DEFAULT_VALIDITY_DAYS);
        deadline_for(created_on, validity_days)?;

        Ok(vec![PropertyEvent::OfferSubmitted(OfferSubmitted {
            property_id: cmd.property_id,
            offer_id: cmd.offer_id,
            partner_id: cmd.partner_id,
            price: cmd.price,
            validity_days,
            created_on,
            state: self.state.after_offer_submitted(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_accept_offer(&self, cmd: &AcceptOffer) -> Result<Vec<PropertyEvent>, DomainError> {
        let offer = self.find_offer(cmd.offer_id)?;

        if self.state.is_closed() {
            return Err(DomainError::guard(format!(
                "offers on a {} property cannot be accepted",
                self.state
            )));
        }

        if self
            .offers
            .iter()
            .any(|o| o.is_accepted() && o.id != cmd.offer_id)
        {
            return Err(DomainError::guard("another offer has already been accepted"));
        }

        if offer.is_accepted() {
            return Ok(vec![]);
        }

        check_price_ratio(offer.price, self.expected_price)?;

        let mut events = vec![PropertyEvent::OfferAccepted(OfferAccepted {
            property_id: cmd.property_id,
            offer_id: offer.id,
            partner_id: offer.partner_id,
            price: offer.price,
            occurred_at: cmd.occurred_at,
        })];

        events.extend(
            self.offers
                .iter()
                .filter(|o| o.id != cmd.offer_id && o.status != Some(OfferStatus::Refused))
                .map(|o| {
                    PropertyEvent::OfferRefused(OfferRefused {
                        property_id: cmd.property_id,
                        offer_id: o.id,
                        occurred_at: cmd.occurred_at,
                    })
                }),
        );

        Ok(events)
    }

    fn validity_change(
        &self,
        offer_id: OfferId,
        validity_days: u32,
        occurred_at: DateTime<Utc>,
    ) -> Result<Vec<PropertyEvent>, DomainError> {
        let offer = self.find_offer(offer_id)?;
        deadline_for(offer.created_on, validity_days)?;
        if offer.validity_days == validity_days {
            return Ok(vec![]);
        }

        Ok(vec![PropertyEvent::OfferValidityChanged(OfferValidityChanged {
            property_id: self.id,
            offer_id,
            validity_days,
            occurred_at,
        })])
    }

    fn handle_mark_sold(&self, cmd: &MarkSold) -> Result<Vec<PropertyEvent>, DomainError> {
        if !self.state.can_be_sold() {
            return Err(DomainError::guard("cancelled properties cannot be sold"));
        }
        if self.state == PropertyState::Sold {
            return Ok(vec![]);
        }

        Ok(vec![PropertyEvent::PropertySold(PropertySold {
            property_id: cmd.property_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mark_cancelled(
        &self,
        cmd: &MarkCancelled,
    ) -> Result<Vec<PropertyEvent>, DomainError> {
        if !self.state.can_be_cancelled() {
            return Err(DomainError::guard("sold properties cannot be cancelled"));
        }
        if self.state == PropertyState::Cancelled {
            return Ok(vec![]);
        }

        Ok(vec![PropertyEvent::PropertyCancelled(PropertyCancelled {
            property_id: cmd.property_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_events::execute;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn listed(expected_units: i64) -> Property {
        let property_id = PropertyId::generate();
        let mut property = Property::empty(property_id);
        execute(
            &mut property,
            &PropertyCommand::CreateProperty(CreateProperty {
                property_id,
                details: PropertyDetails::named("Seaside villa"),
                expected_price: Money::from_units(expected_units),
                garden: Garden::none(),
                property_type_id: None,
                tag_ids: BTreeSet::new(),
                salesperson_id: Some(UserId::new()),
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        property
    }

    fn submit(property: &mut Property, units: i64) -> Result<OfferId, DomainError> {
        let offer_id = OfferId::generate();
        let property_id = property.id_typed();
        execute(
            property,
            &PropertyCommand::SubmitOffer(SubmitOffer {
                property_id,
                offer_id,
                partner_id: PartnerId::new(),
                price: Money::from_units(units),
                validity_days: None,
                occurred_at: test_time(),
            }),
        )?;
        Ok(offer_id)
    }

    fn accept(
        property: &mut Property,
        offer_id: OfferId,
    ) -> Result<Vec<PropertyEvent>, DomainError> {
        let property_id = property.id_typed();
        execute(
            property,
            &PropertyCommand::AcceptOffer(AcceptOffer {
                property_id,
                offer_id,
                occurred_at: test_time(),
            }),
        )
    }

    fn sell(property: &mut Property) -> Result<Vec<PropertyEvent>, DomainError> {
        let property_id = property.id_typed();
        execute(
            property,
            &PropertyCommand::MarkSold(MarkSold {
                property_id,
                occurred_at: test_time(),
            }),
        )
    }

    fn cancel(property: &mut Property) -> Result<Vec<PropertyEvent>, DomainError> {
        let property_id = property.id_typed();
        execute(
            property,
            &PropertyCommand::MarkCancelled(MarkCancelled {
                property_id,
                occurred_at: test_time(),
            }),
        )
    }

    fn delete(property: &mut Property) -> Result<Vec<PropertyEvent>, DomainError> {
        let property_id = property.id_typed();
        execute(
            property,
            &PropertyCommand::DeleteProperty(DeleteProperty {
                property_id,
                occurred_at: test_time(),
            }),
        )
    }

    #[test]
    fn create_applies_listing_defaults() {
        let property = listed(300_000);
        assert_eq!(property.state(), PropertyState::New);
        assert!(property.is_active());
        assert_eq!(property.selling_price(), Money::ZERO);
        assert_eq!(property.details().bedrooms, 2);
        assert!(property.details().date_availability.is_some());
        assert_eq!(property.best_price(), Money::ZERO);
    }

    #[test]
    fn create_rejects_non_positive_expected_price() {
        let property_id = PropertyId::generate();
        let err = Property::empty(property_id)
            .handle(&PropertyCommand::CreateProperty(CreateProperty {
                property_id,
                details: PropertyDetails::named("Shed"),
                expected_price: Money::ZERO,
                garden: Garden::none(),
                property_type_id: None,
                tag_ids: BTreeSet::new(),
                salesperson_id: None,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(err.is_constraint());
    }

    #[test]
    fn worked_example_offers_acceptance_and_sale() {
        let mut property = listed(300_000);

        let offer_a = submit(&mut property, 250_000).unwrap();
        assert_eq!(property.state(), PropertyState::OfferReceived);
        assert_eq!(property.best_price(), Money::from_units(250_000));

        let offer_b = submit(&mut property, 280_000).unwrap();
        assert_eq!(property.best_price(), Money::from_units(280_000));

        let err = submit(&mut property, 260_000).unwrap_err();
        assert!(err.is_guard());
        assert_eq!(property.offers().len(), 2);

        accept(&mut property, offer_b).unwrap();
        let accepted = property.offer(offer_b).unwrap();
        assert_eq!(accepted.status(), Some(OfferStatus::Accepted));
        assert_eq!(property.buyer_id(), Some(accepted.partner_id()));
        assert_eq!(property.selling_price(), Money::from_units(280_000));
        assert_eq!(property.state(), PropertyState::OfferAccepted);
        assert_eq!(
            property.offer(offer_a).unwrap().status(),
            Some(OfferStatus::Refused)
        );

        sell(&mut property).unwrap();
        assert_eq!(property.state(), PropertyState::Sold);
    }

    #[test]
    fn second_acceptance_is_a_guard_violation() {
        let mut property = listed(100_000);
        let first = submit(&mut property, 95_000).unwrap();
        let second = submit(&mut property, 96_000).unwrap();

        accept(&mut property, first).unwrap();
        let err = accept(&mut property, second).unwrap_err();
        assert!(matches!(err, DomainError::GuardViolation(ref m) if m.contains("already been accepted")));
        assert_eq!(property.accepted_offer().unwrap().id_typed(), first);
    }

    #[test]
    fn accepting_below_ninety_percent_is_rejected_without_changes() {
        let mut property = listed(300_000);
        let low = submit(&mut property, 200_000).unwrap();
        let version = property.version();

        let err = accept(&mut property, low).unwrap_err();
        assert!(err.is_guard());
        assert_eq!(property.version(), version);
        assert_eq!(property.selling_price(), Money::ZERO);
        assert_eq!(property.offer(low).unwrap().status(), None);
    }

    #[test]
    fn lowering_expected_price_below_selling_ratio_fails() {
        let mut property = listed(100_000);
        let offer = submit(&mut property, 100_000).unwrap();
        accept(&mut property, offer).unwrap();

        let raise = PropertyCommand::SetExpectedPrice(SetExpectedPrice {
            property_id: property.id_typed(),
            expected_price: Money::from_units(200_000),
            occurred_at: test_time(),
        });
        assert!(property.handle(&raise).unwrap_err().is_guard());
    }

    #[test]
    fn refusing_is_unconditional_and_idempotent() {
        let mut property = listed(100_000);
        let offer = submit(&mut property, 95_000).unwrap();
        accept(&mut property, offer).unwrap();

        let refuse = PropertyCommand::RefuseOffer(RefuseOffer {
            property_id: property.id_typed(),
            offer_id: offer,
            occurred_at: test_time(),
        });
        execute(&mut property, &refuse).unwrap();
        assert_eq!(property.offer(offer).unwrap().status(), Some(OfferStatus::Refused));
        assert!(execute(&mut property, &refuse).unwrap().is_empty());
    }

    #[test]
    fn cancelled_property_cannot_be_sold_and_sold_cannot_be_cancelled() {
        let mut cancelled = listed(100_000);
        cancel(&mut cancelled).unwrap();
        assert!(sell(&mut cancelled).unwrap_err().is_guard());
        assert_eq!(cancelled.state(), PropertyState::Cancelled);

        let mut sold = listed(100_000);
        sell(&mut sold).unwrap();
        assert!(cancel(&mut sold).unwrap_err().is_guard());
        assert_eq!(sold.state(), PropertyState::Sold);
    }

    #[test]
    fn closed_properties_reject_new_offers() {
        let mut property = listed(100_000);
        cancel(&mut property).unwrap();
        assert!(submit(&mut property, 99_000).unwrap_err().is_guard());
    }

    #[test]
    fn offer_after_acceptance_keeps_offer_accepted_state() {
        let mut property = listed(100_000);
        let offer = submit(&mut property, 95_000).unwrap();
        accept(&mut property, offer).unwrap();

        submit(&mut property, 120_000).unwrap();
        assert_eq!(property.state(), PropertyState::OfferAccepted);
    }

    #[test]
    fn deletion_only_from_new_or_cancelled() {
        let mut fresh = listed(100_000);
        delete(&mut fresh).unwrap();
        assert!(fresh.is_deleted());
        assert_eq!(sell(&mut fresh).unwrap_err(), DomainError::NotFound);

        let mut with_offer = listed(100_000);
        submit(&mut with_offer, 10_000).unwrap();
        assert!(delete(&mut with_offer).unwrap_err().is_guard());

        cancel(&mut with_offer).unwrap();
        delete(&mut with_offer).unwrap();
        assert!(with_offer.offers().is_empty());
    }

    #[test]
    fn total_area_tracks_garden_toggle() {
        let mut property = listed(100_000);
        let mut details = property.details().clone();
        details.living_area = 120;
        let property_id = property.id_typed();
        execute(
            &mut property,
            &PropertyCommand::UpdateDetails(UpdateDetails {
                property_id,
                details,
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        assert_eq!(property.total_area(), 120);

        let toggle = |enabled| {
            PropertyCommand::SetGarden(SetGarden {
                property_id,
                enabled,
                occurred_at: test_time(),
            })
        };
        let on = toggle(true);
        let off = toggle(false);

        execute(&mut property, &on).unwrap();
        assert_eq!(property.total_area(), 130);
        assert_eq!(property.garden().orientation, Some(GardenOrientation::North));
        assert!(execute(&mut property, &on).unwrap().is_empty());

        execute(&mut property, &off).unwrap();
        assert_eq!(property.total_area(), 120);
        assert_eq!(property.garden().orientation, None);
    }

    #[test]
    fn validity_past_the_calendar_is_a_constraint_violation() {
        let mut property = listed(100_000);
        let property_id = property.id_typed();
        let err = execute(
            &mut property,
            &PropertyCommand::SubmitOffer(SubmitOffer {
                property_id,
                offer_id: OfferId::generate(),
                partner_id: PartnerId::new(),
                price: Money::from_units(50_000),
                validity_days: Some(u32::MAX),
                occurred_at: test_time(),
            }),
        )
        .unwrap_err();
        assert!(err.is_constraint());
        assert!(property.offers().is_empty());

        let offer_id = submit(&mut property, 50_000).unwrap();
        let err = execute(
            &mut property,
            &PropertyCommand::SetOfferValidity(SetOfferValidity {
                property_id,
                offer_id,
                validity_days: u32::MAX,
                occurred_at: test_time(),
            }),
        )
        .unwrap_err();
        assert!(err.is_constraint());
        assert_eq!(property.offer(offer_id).unwrap().validity_days(), 7);
    }

    #[test]
    fn offer_deadline_round_trip() {
        let mut property = listed(100_000);
        let offer_id = submit(&mut property, 50_000).unwrap();
        let created_on = property.offer(offer_id).unwrap().created_on();
        assert_eq!(
            property.offer(offer_id).unwrap().deadline(),
            created_on + chrono::Days::new(7)
        );

        let property_id = property.id_typed();
        execute(
            &mut property,
            &PropertyCommand::SetOfferDeadline(SetOfferDeadline {
                property_id,
                offer_id,
                deadline: created_on + chrono::Days::new(10),
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        assert_eq!(property.offer(offer_id).unwrap().validity_days(), 10);
    }

    #[test]
    fn offers_follow_property_type_changes() {
        let mut property = listed(100_000);
        let offer_id = submit(&mut property, 50_000).unwrap();
        let type_id = PropertyTypeId::generate();

        let property_id = property.id_typed();
        execute(
            &mut property,
            &PropertyCommand::AssignPropertyType(AssignPropertyType {
                property_id,
                property_type_id: Some(type_id),
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        assert_eq!(property.offer(offer_id).unwrap().property_type_id(), Some(type_id));
    }

    #[test]
    fn offers_by_price_is_descending() {
        let mut property = listed(100_000);
        for units in [10_000, 20_000, 30_000] {
            submit(&mut property, units).unwrap();
        }
        let prices: Vec<_> = property
            .offers_by_price()
            .iter()
            .map(|o| o.price().cents())
            .collect();
        assert_eq!(prices, vec![3_000_000, 2_000_000, 1_000_000]);
    }

    #[test]
    fn replaying_history_rebuilds_identical_state() {
        let property_id = PropertyId::generate();
        let mut live = Property::empty(property_id);
        let offer_id = OfferId::generate();
        let now = test_time();
        let cmds = vec![
            PropertyCommand::CreateProperty(CreateProperty {
                property_id,
                details: PropertyDetails::named("Loft"),
                expected_price: Money::from_units(300_000),
                garden: Garden::with_defaults(),
                property_type_id: None,
                tag_ids: BTreeSet::new(),
                salesperson_id: None,
                occurred_at: now,
            }),
            PropertyCommand::SubmitOffer(SubmitOffer {
                property_id,
                offer_id,
                partner_id: PartnerId::new(),
                price: Money::from_units(290_000),
                validity_days: Some(14),
                occurred_at: now,
            }),
            PropertyCommand::AcceptOffer(AcceptOffer {
                property_id,
                offer_id,
                occurred_at: now,
            }),
        ];

        let mut history = Vec::new();
        for cmd in &cmds {
            history.extend(execute(&mut live, cmd).unwrap());
        }

        let mut replayed = Property::empty(property_id);
        for event in &history {
            replayed.apply(event);
        }

        assert_eq!(replayed, live);
        assert_eq!(replayed.version(), 3);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Action {
            Offer(i64),
            AcceptBest,
            Sell,
            Cancel,
        }

        #[derive(Debug, Clone)]
        enum GardenEdit {
            Toggle(bool),
            Resize(u32),
        }

        fn action() -> impl Strategy<Value = Action> {
            prop_oneof![
                (1i64..500_000).prop_map(Action::Offer),
                Just(Action::AcceptBest),
                Just(Action::Sell),
                Just(Action::Cancel),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Guards and computed fields hold after any action sequence.
            #[test]
            fn lifecycle_guards_hold(actions in prop::collection::vec(action(), 1..25)) {
                let mut property = listed(200_000);

                for action in actions {
                    let before = property.clone();
                    match action {
                        Action::Offer(units) => {
                            let result = submit(&mut property, units);
                            let admissible = !before.state().is_closed()
                                && (before.offers().is_empty()
                                    || Money::from_units(units) > before.best_price());
                            prop_assert_eq!(result.is_ok(), admissible);
                        }
                        Action::AcceptBest => {
                            if let Some(best) = before.offers_by_price().first().map(|o| o.id_typed()) {
                                if accept(&mut property, best).is_ok() && !before.state().is_closed() {
                                    prop_assert_eq!(property.state(), PropertyState::OfferAccepted);
                                    let accepted = property.offers().iter().filter(|o| o.is_accepted()).count();
                                    prop_assert_eq!(accepted, 1);
                                }
                            }
                        }
                        Action::Sell => {
                            let result = sell(&mut property);
                            prop_assert_eq!(result.is_err(), before.state() == PropertyState::Cancelled);
                            if result.is_ok() {
                                prop_assert_eq!(property.state(), PropertyState::Sold);
                            }
                        }
                        Action::Cancel => {
                            let result = cancel(&mut property);
                            prop_assert_eq!(result.is_err(), before.state() == PropertyState::Sold);
                            if result.is_ok() {
                                prop_assert_eq!(property.state(), PropertyState::Cancelled);
                            }
                        }
                    }

                    // A failed action leaves the aggregate untouched.
                    if property.version() == before.version() {
                        prop_assert_eq!(&property, &before);
                    }

                    let max = property.offers().iter().map(|o| o.price()).max().unwrap_or(Money::ZERO);
                    prop_assert_eq!(property.best_price(), max);
                    prop_assert!(property.offers().iter().filter(|o| o.is_accepted()).count() <= 1);
                    prop_assert!(check_price_ratio(property.selling_price(), property.expected_price()).is_ok());
                }
            }

            /// `total_area` is living area plus whatever the garden currently
            /// measures, through any mix of toggles and edits.
            #[test]
            fn total_area_follows_living_and_garden_area(
                living_area in 0u32..100_000,
                edits in prop::collection::vec(
                    prop_oneof![
                        any::<bool>().prop_map(GardenEdit::Toggle),
                        (0u32..10_000).prop_map(GardenEdit::Resize),
                    ],
                    0..20,
                ),
            ) {
                let mut property = listed(100_000);
                let property_id = property.id_typed();
                let mut details = property.details().clone();
                details.living_area = living_area;
                execute(
                    &mut property,
                    &PropertyCommand::UpdateDetails(UpdateDetails {
                        property_id,
                        details,
                        occurred_at: test_time(),
                    }),
                )
                .unwrap();

                let mut enabled = false;
                let mut garden_area = 0u32;
                for edit in edits {
                    let command = match edit {
                        GardenEdit::Toggle(flag) => {
                            if flag != enabled {
                                enabled = flag;
                                garden_area = if flag { crate::details::DEFAULT_GARDEN_AREA } else { 0 };
                            }
                            PropertyCommand::SetGarden(SetGarden {
                                property_id,
                                enabled: flag,
                                occurred_at: test_time(),
                            })
                        }
                        GardenEdit::Resize(area) => {
                            garden_area = area;
                            PropertyCommand::UpdateGarden(UpdateGarden {
                                property_id,
                                area,
                                orientation: None,
                                occurred_at: test_time(),
                            })
                        }
                    };
                    execute(&mut property, &command).unwrap();
                    prop_assert_eq!(property.garden().area, garden_area);
                    prop_assert_eq!(property.total_area(), living_area + garden_area);
                }
            }

            #[test]
            fn ratio_rule_matches_exact_arithmetic(
                expected in 1i64..10_000_000_000,
                selling in 1i64..10_000_000_000,
            ) {
                let ok = check_price_ratio(Money::from_cents(selling), Money::from_cents(expected)).is_ok();
                prop_assert_eq!(ok, (selling as i128) * 10 >= (expected as i128) * 9);
            }
        }
    }
}
