//! Descriptive property fields and the garden sub-record.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BEDROOMS: u32 = 2;
pub const DEFAULT_GARDEN_AREA: u32 = 10;
pub const AVAILABILITY_OFFSET_MONTHS: u32 = 3;

/// Default availability: `months` after `today`, clamped to the end of the
/// target month (Jan 31 + 1 month = Feb 28/29).
pub fn default_availability(today: NaiveDate, months: u32) -> NaiveDate {
    today
        .checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// Editable descriptive fields of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDetails {
    /// Listing title.
    pub name: String,
    pub description: Option<String>,
    pub postcode: Option<String>,
    /// `None` on creation means "today + 3 months".
    pub date_availability: Option<NaiveDate>,
    pub bedrooms: u32,
    /// Square meters.
    pub living_area: u32,
    pub facades: u32,
    pub garage: bool,
}

impl PropertyDetails {
    /// Details with every optional field at its default.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            postcode: None,
            date_availability: None,
            bedrooms: DEFAULT_BEDROOMS,
            living_area: 0,
            facades: 0,
            garage: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GardenOrientation {
    North,
    South,
    East,
    West,
}

/// Garden flag with its area and orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Garden {
    pub enabled: bool,
    /// Square meters.
    pub area: u32,
    pub orientation: Option<GardenOrientation>,
}

impl Garden {
    pub fn none() -> Self {
        Self::default()
    }

    /// Values a garden gets when the flag is switched on.
    pub fn with_defaults() -> Self {
        Self {
            enabled: true,
            area: DEFAULT_GARDEN_AREA,
            orientation: Some(GardenOrientation::North),
        }
    }

    /// Result of flipping the flag to `enabled`; `None` when nothing changes.
    ///
    /// Defaults apply only on the transition, never as a standing rule.
    pub fn toggled(self, enabled: bool) -> Option<Garden> {
        if self.enabled == enabled {
            return None;
        }
        Some(if enabled {
            Garden::with_defaults()
        } else {
            Garden::none()
        })
    }
}
