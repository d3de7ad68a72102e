//! Explicit acting-user context passed into every action.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Who performs an action, and when.
///
/// Replaces an implicit session: defaults such as "salesperson = current user"
/// or "availability = today + 3 months" are computed from this value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionContext {
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl ActionContext {
    pub fn new(actor: UserId, occurred_at: DateTime<Utc>) -> Self {
        Self { actor, occurred_at }
    }

    /// Context for `actor` at the current wall-clock time.
    pub fn now(actor: UserId) -> Self {
        Self::new(actor, Utc::now())
    }

    /// Business date of the action.
    pub fn today(&self) -> NaiveDate {
        self.occurred_at.date_naive()
    }
}
