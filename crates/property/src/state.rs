//! Property lifecycle state machine.
//!
//! ```text
//! new ──offer──▶ offer_received ──accept──▶ offer_accepted ──sell──▶ sold
//!  │                   │                          │
//!  └───────────────────┴──────────cancel──────────┴──▶ cancelled
//! ```
//!
//! `sold` and `cancelled` are terminal: nothing moves a property out of them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyState {
    #[default]
    New,
    OfferReceived,
    OfferAccepted,
    Sold,
    Cancelled,
}

impl PropertyState {
    pub const ALL: [PropertyState; 5] = [
        PropertyState::New,
        PropertyState::OfferReceived,
        PropertyState::OfferAccepted,
        PropertyState::Sold,
        PropertyState::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PropertyState::New => "new",
            PropertyState::OfferReceived => "offer_received",
            PropertyState::OfferAccepted => "offer_accepted",
            PropertyState::Sold => "sold",
            PropertyState::Cancelled => "cancelled",
        }
    }

    /// Terminal states.
    pub fn is_closed(self) -> bool {
        matches!(self, PropertyState::Sold | PropertyState::Cancelled)
    }

    pub fn can_be_sold(self) -> bool {
        self != PropertyState::Cancelled
    }

    pub fn can_be_cancelled(self) -> bool {
        self != PropertyState::Sold
    }

    pub fn can_be_deleted(self) -> bool {
        matches!(self, PropertyState::New | PropertyState::Cancelled)
    }

    /// State after a new offer is admitted. Only `new` advances; later states
    /// are never pulled back to `offer_received`.
    pub fn after_offer_submitted(self) -> PropertyState {
        match self {
            PropertyState::New => PropertyState::OfferReceived,
            other => other,
        }
    }
}

impl core::fmt::Display for PropertyState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
