//! Sale hooks: extensions that run before a property is marked sold.
//!
//! `EstateService::mark_sold` runs every registered hook in order. When a
//! hook or the final transition fails, the hooks that already ran are
//! aborted in reverse order, so a sale is all-or-nothing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value as JsonValue;

use estate_account::{
    CommissionTerms, Invoice, InvoiceCommand, InvoiceId, InvoiceLine, IssueInvoice, VoidInvoice,
    sale_invoice_lines,
};
use estate_core::{ActionContext, PartnerId};
use estate_events::{EventBus, EventEnvelope};
use estate_property::{Property, PropertyId};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::event_store::EventStore;
use crate::streams;

/// The sale being processed.
#[derive(Debug, Clone, Copy)]
pub struct SaleContext<'a> {
    pub property: &'a Property,
    pub ctx: &'a ActionContext,
}

pub trait SaleHook: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs before the property transitions to sold. An error cancels the sale.
    fn before_sold(&self, sale: &SaleContext<'_>) -> Result<(), DispatchError>;

    /// Undo whatever `before_sold` did for this sale.
    fn abort(&self, sale: &SaleContext<'_>) -> Result<(), DispatchError>;
}

/// Where customer invoices are created.
pub trait InvoiceSink: Send + Sync {
    fn create_invoice(
        &self,
        buyer: PartnerId,
        property_id: PropertyId,
        lines: Vec<InvoiceLine>,
        ctx: &ActionContext,
    ) -> Result<InvoiceId, DispatchError>;

    fn void_invoice(
        &self,
        invoice_id: InvoiceId,
        reason: &str,
        ctx: &ActionContext,
    ) -> Result<(), DispatchError>;
}

impl<K> InvoiceSink for Arc<K>
where
    K: InvoiceSink + ?Sized,
{
    fn create_invoice(
        &self,
        buyer: PartnerId,
        property_id: PropertyId,
        lines: Vec<InvoiceLine>,
        ctx: &ActionContext,
    ) -> Result<InvoiceId, DispatchError> {
        (**self).create_invoice(buyer, property_id, lines, ctx)
    }

    fn void_invoice(
        &self,
        invoice_id: InvoiceId,
        reason: &str,
        ctx: &ActionContext,
    ) -> Result<(), DispatchError> {
        (**self).void_invoice(invoice_id, reason, ctx)
    }
}

/// Issues `Invoice` aggregates through the command dispatcher.
#[derive(Debug)]
pub struct DispatchingInvoiceSink<S, B> {
    dispatcher: Arc<CommandDispatcher<S, B>>,
}

impl<S, B> DispatchingInvoiceSink<S, B> {
    pub fn new(dispatcher: Arc<CommandDispatcher<S, B>>) -> Self {
        Self { dispatcher }
    }
}

impl<S, B> InvoiceSink for DispatchingInvoiceSink<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    fn create_invoice(
        &self,
        buyer: PartnerId,
        property_id: PropertyId,
        lines: Vec<InvoiceLine>,
        ctx: &ActionContext,
    ) -> Result<InvoiceId, DispatchError> {
        let invoice_id = InvoiceId::generate();
        self.dispatcher.dispatch(
            streams::INVOICE,
            InvoiceCommand::IssueInvoice(IssueInvoice {
                invoice_id,
                partner_id: buyer,
                origin: property_id.0,
                lines,
                occurred_at: ctx.occurred_at,
            }),
            |id| Invoice::empty(InvoiceId::new(id)),
        )?;
        Ok(invoice_id)
    }

    fn void_invoice(
        &self,
        invoice_id: InvoiceId,
        reason: &str,
        ctx: &ActionContext,
    ) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(
            streams::INVOICE,
            InvoiceCommand::VoidInvoice(VoidInvoice {
                invoice_id,
                reason: Some(reason.to_string()),
                occurred_at: ctx.occurred_at,
            }),
            |id| Invoice::empty(InvoiceId::new(id)),
        )?;
        Ok(())
    }
}

/// Bills the buyer a commission and the administrative fee on every sale
/// with an accepted offer.
pub struct CommissionInvoiceHook<K> {
    sink: K,
    terms: CommissionTerms,
    issued: Mutex<HashMap<PropertyId, InvoiceId>>,
}

impl<K: InvoiceSink> CommissionInvoiceHook<K> {
    pub fn new(sink: K, terms: CommissionTerms) -> Self {
        Self {
            sink,
            terms,
            issued: Mutex::new(HashMap::new()),
        }
    }

    /// Invoice raised for the sale of `property_id`, if any.
    pub fn invoice_for(&self, property_id: PropertyId) -> Option<InvoiceId> {
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&property_id)
            .copied()
    }
}

impl<K: InvoiceSink> SaleHook for CommissionInvoiceHook<K> {
    fn name(&self) -> &'static str {
        "commission_invoice"
    }

    /// Sales without an accepted offer have nobody to bill; they go through
    /// uninvoiced.
    fn before_sold(&self, sale: &SaleContext<'_>) -> Result<(), DispatchError> {
        let property = sale.property;
        let Some(buyer) = property
            .buyer_id()
            .filter(|_| property.selling_price().is_positive())
        else {
            tracing::warn!(
                property_id = %property.id_typed(),
                state = %property.state(),
                "sold without an accepted offer; no commission invoice"
            );
            return Ok(());
        };

        let lines = sale_invoice_lines(property.name(), property.selling_price(), &self.terms)?;
        if lines.is_empty() {
            tracing::debug!(property_id = %property.id_typed(), "nothing to bill on this sale");
            return Ok(());
        }

        let invoice_id = self
            .sink
            .create_invoice(buyer, property.id_typed(), lines, sale.ctx)?;
        tracing::debug!(
            property_id = %property.id_typed(),
            %invoice_id,
            "commission invoice issued"
        );

        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(property.id_typed(), invoice_id);
        Ok(())
    }

    fn abort(&self, sale: &SaleContext<'_>) -> Result<(), DispatchError> {
        let property_id = sale.property.id_typed();
        let issued = self
            .issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&property_id);

        if let Some(invoice_id) = issued {
            tracing::warn!(%property_id, %invoice_id, "voiding commission invoice of aborted sale");
            self.sink.void_invoice(invoice_id, "sale aborted", sale.ctx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use estate_core::{Money, UserId};
    use estate_events::execute;
    use estate_property::{
        AcceptOffer, CreateProperty, Garden, OfferId, PropertyCommand, PropertyDetails, SubmitOffer,
    };
    use std::collections::BTreeSet;

    #[derive(Default)]
    struct RecordingSink {
        issued: Mutex<Vec<(PartnerId, PropertyId, Vec<InvoiceLine>)>>,
        voided: Mutex<Vec<InvoiceId>>,
    }

    impl InvoiceSink for RecordingSink {
        fn create_invoice(
            &self,
            buyer: PartnerId,
            property_id: PropertyId,
            lines: Vec<InvoiceLine>,
            _ctx: &ActionContext,
        ) -> Result<InvoiceId, DispatchError> {
            self.issued.lock().unwrap().push((buyer, property_id, lines));
            Ok(InvoiceId::generate())
        }

        fn void_invoice(
            &self,
            invoice_id: InvoiceId,
            _reason: &str,
            _ctx: &ActionContext,
        ) -> Result<(), DispatchError> {
            self.voided.lock().unwrap().push(invoice_id);
            Ok(())
        }
    }

    fn property(accepted: Option<PartnerId>) -> Property {
        let property_id = PropertyId::generate();
        let mut property = Property::empty(property_id);
        execute(
            &mut property,
            &PropertyCommand::CreateProperty(CreateProperty {
                property_id,
                details: PropertyDetails::named("Chalet"),
                expected_price: Money::from_units(200_000),
                garden: Garden::none(),
                property_type_id: None,
                tag_ids: BTreeSet::new(),
                salesperson_id: None,
                occurred_at: Utc::now(),
            }),
        )
        .unwrap();

        if let Some(partner_id) = accepted {
            let offer_id = OfferId::generate();
            for command in [
                PropertyCommand::SubmitOffer(SubmitOffer {
                    property_id,
                    offer_id,
                    partner_id,
                    price: Money::from_units(190_000),
                    validity_days: None,
                    occurred_at: Utc::now(),
                }),
                PropertyCommand::AcceptOffer(AcceptOffer {
                    property_id,
                    offer_id,
                    occurred_at: Utc::now(),
                }),
            ] {
                execute(&mut property, &command).unwrap();
            }
        }
        property
    }

    #[test]
    fn invoices_the_buyer_and_voids_on_abort() {
        let sink = Arc::new(RecordingSink::default());
        let hook = CommissionInvoiceHook::new(Arc::clone(&sink), CommissionTerms::default());
        let buyer = PartnerId::new();
        let property = property(Some(buyer));
        let ctx = ActionContext::now(UserId::new());
        let sale = SaleContext {
            property: &property,
            ctx: &ctx,
        };

        hook.before_sold(&sale).unwrap();
        let invoice_id = hook.invoice_for(property.id_typed()).unwrap();
        {
            let issued = sink.issued.lock().unwrap();
            assert_eq!(issued.len(), 1);
            assert_eq!(issued[0].0, buyer);
            assert_eq!(issued[0].2[0].unit_price, Money::from_units(11_400));
        }

        hook.abort(&sale).unwrap();
        assert_eq!(*sink.voided.lock().unwrap(), vec![invoice_id]);
        assert!(hook.invoice_for(property.id_typed()).is_none());

        // Nothing left to compensate.
        hook.abort(&sale).unwrap();
        assert_eq!(sink.voided.lock().unwrap().len(), 1);
    }

    #[test]
    fn no_buyer_means_nothing_to_invoice() {
        let sink = Arc::new(RecordingSink::default());
        let hook = CommissionInvoiceHook::new(Arc::clone(&sink), CommissionTerms::default());
        let property = property(None);
        let ctx = ActionContext::now(UserId::new());

        hook.before_sold(&SaleContext {
            property: &property,
            ctx: &ctx,
        })
        .unwrap();
        assert!(sink.issued.lock().unwrap().is_empty());
        assert!(hook.invoice_for(property.id_typed()).is_none());
    }

    #[test]
    fn zero_commission_bills_only_the_fee() {
        let sink = Arc::new(RecordingSink::default());
        let terms = CommissionTerms {
            rate_bps: 0,
            ..CommissionTerms::default()
        };
        let hook = CommissionInvoiceHook::new(Arc::clone(&sink), terms);
        let property = property(Some(PartnerId::new()));
        let ctx = ActionContext::now(UserId::new());

        hook.before_sold(&SaleContext {
            property: &property,
            ctx: &ctx,
        })
        .unwrap();
        let issued = sink.issued.lock().unwrap();
        assert_eq!(issued.len(), 1);
        assert_eq!(issued[0].2.len(), 1);
        assert_eq!(issued[0].2[0].unit_price, Money::from_units(100));
    }
}
