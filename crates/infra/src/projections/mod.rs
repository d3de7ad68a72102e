//! Read model builders.
//!
//! Projections consume committed envelopes and keep query-friendly views.
//! They are rebuildable from the event store and idempotent per stream.

use serde_json::Value as JsonValue;

use estate_events::EventEnvelope;

pub mod catalog;
pub mod cursor;
pub mod invoices;
pub mod listings;

pub use catalog::{CatalogProjection, PropertyTypeReadModel, TagReadModel};
pub use cursor::{CursorCheck, ProjectionError, StreamCursors};
pub use invoices::{InvoiceReadModel, InvoicesProjection};
pub use listings::{ListingsProjection, PropertyListing};

/// A read model fed with committed envelopes.
pub trait Projection: Send + Sync {
    fn name(&self) -> &'static str;

    /// Envelopes of unrelated aggregate types are ignored.
    fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError>;

    /// Forget all state and cursors.
    fn reset(&self);

    /// Reset, then replay `envelopes` in the given (commit) order.
    fn rebuild_from_scratch(
        &self,
        envelopes: &[EventEnvelope<JsonValue>],
    ) -> Result<(), ProjectionError> {
        self.reset();
        for envelope in envelopes {
            self.apply_envelope(envelope)?;
        }
        Ok(())
    }
}
