//! Property listings domain module (event-sourced).
//!
//! A [`Property`] owns its [`Offer`]s, so the offer invariants (strictly
//! increasing bids, at most one accepted offer) and the lifecycle state machine
//! are all enforced inside one aggregate. Pure domain logic: no IO, no storage.

pub mod details;
pub mod offer;
pub mod property;
pub mod state;

pub use details::{
    AVAILABILITY_OFFSET_MONTHS, DEFAULT_BEDROOMS, DEFAULT_GARDEN_AREA, Garden, GardenOrientation,
    PropertyDetails, default_availability,
};
pub use offer::{DEFAULT_VALIDITY_DAYS, Offer, OfferId, OfferStatus};
pub use property::{
    AcceptOffer, ActiveChanged, AssignPropertyType, AssignSalesperson, CreateProperty,
    DeleteProperty, DetailsUpdated, ExpectedPriceChanged, GardenChanged, MarkCancelled, MarkSold,
    MIN_SELLING_RATIO, OfferAccepted, OfferRefused, OfferSubmitted, OfferValidityChanged, Property,
    PropertyCancelled, PropertyCommand, PropertyCreated, PropertyDeleted, PropertyEvent,
    PropertyId, PropertySold, PropertyTypeAssigned, RefuseOffer, SalespersonAssigned, SetActive,
    SetExpectedPrice, SetGarden, SetOfferDeadline, SetOfferValidity, SetTags, SubmitOffer,
    TagsChanged, UpdateDetails, UpdateGarden, check_price_ratio,
};
pub use state::PropertyState;
