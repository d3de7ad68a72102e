use serde_json::Value as JsonValue;

use estate_account::{InvoiceEvent, InvoiceId, InvoiceLine, InvoiceStatus};
use estate_core::{AggregateId, Money, PartnerId};
use estate_events::EventEnvelope;

use crate::projections::Projection;
use crate::projections::cursor::{CursorCheck, ProjectionError, StreamCursors};
use crate::read_model::{InMemoryReadStore, ReadStore};
use crate::streams;

/// Queryable invoice (header + lines).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceReadModel {
    pub invoice_id: InvoiceId,
    pub partner_id: PartnerId,
    /// Stream that caused the invoice (the sold property).
    pub origin: AggregateId,
    pub status: InvoiceStatus,
    pub total: Money,
    pub lines: Vec<InvoiceLine>,
}

#[derive(Debug, Default)]
pub struct InvoicesProjection {
    store: InMemoryReadStore<InvoiceId, InvoiceReadModel>,
    cursors: StreamCursors,
}

impl InvoicesProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, invoice_id: InvoiceId) -> Option<InvoiceReadModel> {
        self.store.get(&invoice_id)
    }

    pub fn list(&self) -> Vec<InvoiceReadModel> {
        self.store.list()
    }

    /// Every invoice raised for `origin`, voided ones included.
    pub fn for_origin(&self, origin: AggregateId) -> Vec<InvoiceReadModel> {
        self.store
            .list()
            .into_iter()
            .filter(|i| i.origin == origin)
            .collect()
    }

    pub fn open_for_origin(&self, origin: AggregateId) -> Vec<InvoiceReadModel> {
        self.for_origin(origin)
            .into_iter()
            .filter(|i| i.status == InvoiceStatus::Open)
            .collect()
    }
}

impl Projection for InvoicesProjection {
    fn name(&self) -> &'static str {
        "account.invoices"
    }

    fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != streams::INVOICE {
            return Ok(());
        }

        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();
        if self.cursors.check(aggregate_id, seq)? == CursorCheck::Skip {
            tracing::debug!(projection = self.name(), %aggregate_id, seq, "skipping replayed event");
            return Ok(());
        }

        let ev: InvoiceEvent = serde_json::from_value(envelope.payload().clone()).map_err(|e| {
            ProjectionError::Deserialize {
                aggregate_type: streams::INVOICE,
                reason: e.to_string(),
            }
        })?;

        let invoice_id = match &ev {
            InvoiceEvent::InvoiceIssued(e) => e.invoice_id,
            InvoiceEvent::InvoiceVoided(e) => e.invoice_id,
        };
        if invoice_id.0 != aggregate_id {
            return Err(ProjectionError::StreamMismatch(aggregate_id));
        }

        match ev {
            InvoiceEvent::InvoiceIssued(e) => {
                self.store.upsert(
                    e.invoice_id,
                    InvoiceReadModel {
                        invoice_id: e.invoice_id,
                        partner_id: e.partner_id,
                        origin: e.origin,
                        status: InvoiceStatus::Open,
                        total: e.total,
                        lines: e.lines,
                    },
                );
            }
            InvoiceEvent::InvoiceVoided(e) => {
                if let Some(mut rm) = self.store.get(&e.invoice_id) {
                    rm.status = InvoiceStatus::Void;
                    self.store.upsert(e.invoice_id, rm);
                }
            }
        }

        self.cursors.advance(aggregate_id, seq);
        Ok(())
    }

    fn reset(&self) {
        self.store.clear();
        self.cursors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use estate_account::{InvoiceIssued, InvoiceVoided};
    use uuid::Uuid;

    fn envelope(invoice_id: InvoiceId, seq: u64, ev: &InvoiceEvent) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            Uuid::now_v7(),
            invoice_id.0,
            streams::INVOICE,
            seq,
            "test",
            serde_json::to_value(ev).unwrap(),
        )
    }

    #[test]
    fn voided_invoices_are_not_open() {
        let projection = InvoicesProjection::new();
        let invoice_id = InvoiceId::generate();
        let origin = AggregateId::new();

        let issued = InvoiceEvent::InvoiceIssued(InvoiceIssued {
            invoice_id,
            partner_id: PartnerId::new(),
            origin,
            lines: vec![InvoiceLine {
                line_no: 1,
                description: "Administrative fees".to_string(),
                quantity: 1,
                unit_price: Money::from_units(100),
            }],
            total: Money::from_units(100),
            occurred_at: Utc::now(),
        });
        projection.apply_envelope(&envelope(invoice_id, 1, &issued)).unwrap();
        assert_eq!(projection.open_for_origin(origin).len(), 1);

        let voided = InvoiceEvent::InvoiceVoided(InvoiceVoided {
            invoice_id,
            reason: None,
            occurred_at: Utc::now(),
        });
        projection.apply_envelope(&envelope(invoice_id, 2, &voided)).unwrap();
        assert!(projection.open_for_origin(origin).is_empty());
        assert_eq!(projection.get(invoice_id).unwrap().status, InvoiceStatus::Void);
    }
}
