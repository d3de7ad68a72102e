//! Offers: bids owned by a property.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use estate_catalog::PropertyTypeId;
use estate_core::{DomainError, DomainResult, Entity, Money, PartnerId};

/// Days an offer stays valid when the bidder does not say otherwise.
pub const DEFAULT_VALIDITY_DAYS: u32 = 7;

/// Offer identifier (unique within the owning property).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferId(pub Uuid);

impl OfferId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl core::fmt::Display for OfferId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Decision on an offer. An undecided offer has no status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Accepted,
    Refused,
}

/// Entity: Offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    pub(crate) id: OfferId,
    pub(crate) partner_id: PartnerId,
    pub(crate) price: Money,
    pub(crate) status: Option<OfferStatus>,
    pub(crate) validity_days: u32,
    pub(crate) created_on: NaiveDate,
    /// Mirror of the owning property's type, kept in sync on every type change.
    pub(crate) property_type_id: Option<PropertyTypeId>,
}

impl Offer {
    pub fn id_typed(&self) -> OfferId {
        self.id
    }

    pub fn partner_id(&self) -> PartnerId {
        self.partner_id
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn status(&self) -> Option<OfferStatus> {
        self.status
    }

    pub fn is_accepted(&self) -> bool {
        self.status == Some(OfferStatus::Accepted)
    }

    pub fn validity_days(&self) -> u32 {
        self.validity_days
    }

    pub fn created_on(&self) -> NaiveDate {
        self.created_on
    }

    pub fn property_type_id(&self) -> Option<PropertyTypeId> {
        self.property_type_id
    }

    /// Creation date + validity.
    /// Creation date + validity. Admission rejects validities that leave the
    /// calendar, so this only saturates for hand-built offers.
    pub fn deadline(&self) -> NaiveDate {
        checked_deadline(self.created_on, self.validity_days).unwrap_or(NaiveDate::MAX)
    }
}

impl Entity for Offer {
    type Id = OfferId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// `None` when the deadline falls outside the calendar.
pub(crate) fn checked_deadline(created_on: NaiveDate, validity_days: u32) -> Option<NaiveDate> {
    created_on.checked_add_days(Days::new(u64::from(validity_days)))
}

pub(crate) fn deadline_for(created_on: NaiveDate, validity_days: u32) -> DomainResult<NaiveDate> {
    checked_deadline(created_on, validity_days)
        .ok_or_else(|| DomainError::constraint("the offer validity is too long"))
}

/// Validity (in days) that makes an offer created on `created_on` expire on `deadline`.
pub(crate) fn validity_for_deadline(created_on: NaiveDate, deadline: NaiveDate) -> DomainResult<u32> {
    let days = (deadline - created_on).num_days();
    if days < 0 {
        return Err(DomainError::constraint(
            "the offer deadline cannot be before its creation date",
        ));
    }
    u32::try_from(days).map_err(|_| DomainError::constraint("the offer deadline is too far away"))
}
