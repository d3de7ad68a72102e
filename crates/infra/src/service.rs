//! Action entry points of the estate application.
//!
//! ```text
//! EstateService action
//!   ↓  (actions lock held)
//! cross-aggregate checks against read models
//!   ↓
//! CommandDispatcher::dispatch  (sale hooks first for mark_sold)
//!   ↓
//! drain the bus feed into every projection
//! ```
//!
//! Actions are serialized by one lock, so catalog name uniqueness and the
//! read models seen by the next action are always consistent with the store.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use serde_json::Value as JsonValue;

use estate_catalog::{
    CreatePropertyType, CreateTag, PropertyType, PropertyTypeCommand, PropertyTypeId,
    RenamePropertyType, RenameTag, ResequencePropertyType, SetTagColor, Tag, TagCommand, TagId,
};
use estate_core::{ActionContext, Aggregate, DomainError, Money, PartnerId, UserId};
use estate_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription};
use estate_property::{
    AcceptOffer, AssignPropertyType, AssignSalesperson, CreateProperty, DeleteProperty, Garden,
    GardenOrientation, MarkCancelled, MarkSold, OfferId, Property, PropertyCommand,
    PropertyDetails, PropertyId, RefuseOffer, SetActive, SetExpectedPrice, SetGarden,
    SetOfferDeadline, SetOfferValidity, SetTags, SubmitOffer, UpdateDetails, UpdateGarden,
    default_availability,
};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::config::EstateConfig;
use crate::event_store::{EventStore, InMemoryEventStore};
use crate::hooks::{CommissionInvoiceHook, DispatchingInvoiceSink, SaleContext, SaleHook};
use crate::projections::{
    CatalogProjection, InvoiceReadModel, InvoicesProjection, ListingsProjection, Projection,
    PropertyListing, PropertyTypeReadModel, TagReadModel,
};
use crate::streams;

pub type InMemoryEstateService =
    EstateService<Arc<InMemoryEventStore>, Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>>;

/// Input of [`EstateService::create_property`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProperty {
    pub details: PropertyDetails,
    pub expected_price: Money,
    pub garden: Garden,
    pub property_type_id: Option<PropertyTypeId>,
    pub tag_ids: BTreeSet<TagId>,
    /// Defaults to the acting user.
    pub salesperson_id: Option<UserId>,
}

impl NewProperty {
    pub fn new(details: PropertyDetails, expected_price: Money) -> Self {
        Self {
            details,
            expected_price,
            garden: Garden::none(),
            property_type_id: None,
            tag_ids: BTreeSet::new(),
            salesperson_id: None,
        }
    }
}

/// A property type with the listings and offers attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTypeOverview {
    pub property_type: PropertyTypeReadModel,
    pub properties: Vec<PropertyListing>,
    pub offer_count: u32,
}

pub struct EstateService<S, B> {
    dispatcher: Arc<CommandDispatcher<S, B>>,
    config: EstateConfig,
    catalog: CatalogProjection,
    listings: ListingsProjection,
    invoices: InvoicesProjection,
    feed: Mutex<Subscription<EventEnvelope<JsonValue>>>,
    actions: Mutex<()>,
    sale_hooks: Vec<Box<dyn SaleHook>>,
}

impl InMemoryEstateService {
    /// Service over a fresh in-memory store and bus.
    pub fn in_memory(config: EstateConfig) -> Self {
        Self::new(
            Arc::new(InMemoryEventStore::new()),
            Arc::new(InMemoryEventBus::new()),
            config,
        )
    }
}

impl<S, B> EstateService<S, B>
where
    S: EventStore + 'static,
    B: EventBus<EventEnvelope<JsonValue>> + 'static,
{
    pub fn new(store: S, bus: B, config: EstateConfig) -> Self {
        let feed = bus.subscribe();
        Self {
            dispatcher: Arc::new(CommandDispatcher::new(store, bus)),
            config,
            catalog: CatalogProjection::new(),
            listings: ListingsProjection::new(),
            invoices: InvoicesProjection::new(),
            feed: Mutex::new(feed),
            actions: Mutex::new(()),
            sale_hooks: Vec::new(),
        }
    }

    /// Register a hook run by [`EstateService::mark_sold`], after those already registered.
    pub fn with_sale_hook(mut self, hook: impl SaleHook + 'static) -> Self {
        self.sale_hooks.push(Box::new(hook));
        self
    }

    /// Invoice the buyer on every sale, with the configured commission terms.
    pub fn with_commission_invoicing(self) -> Self {
        let sink = DispatchingInvoiceSink::new(Arc::clone(&self.dispatcher));
        let terms = self.config.commission_terms();
        self.with_sale_hook(CommissionInvoiceHook::new(sink, terms))
    }

    pub fn config(&self) -> &EstateConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &CommandDispatcher<S, B> {
        &self.dispatcher
    }

    // ---- catalog ----

    pub fn create_property_type(
        &self,
        ctx: &ActionContext,
        name: &str,
        sequence: Option<i32>,
    ) -> Result<PropertyTypeId, DispatchError> {
        self.run(|| {
            self.ensure_type_name_free(name, None)?;
            let type_id = PropertyTypeId::generate();
            self.dispatch_type(PropertyTypeCommand::CreatePropertyType(CreatePropertyType {
                type_id,
                name: name.to_string(),
                sequence,
                occurred_at: ctx.occurred_at,
            }))?;
            tracing::info!(%type_id, name = name.trim(), "property type created");
            Ok(type_id)
        })
    }

    pub fn rename_property_type(
        &self,
        ctx: &ActionContext,
        type_id: PropertyTypeId,
        name: &str,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            self.ensure_type_name_free(name, Some(type_id))?;
            self.dispatch_type(PropertyTypeCommand::RenamePropertyType(RenamePropertyType {
                type_id,
                name: name.to_string(),
                occurred_at: ctx.occurred_at,
            }))
        })
    }

    pub fn resequence_property_type(
        &self,
        ctx: &ActionContext,
        type_id: PropertyTypeId,
        sequence: i32,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            self.dispatch_type(PropertyTypeCommand::ResequencePropertyType(
                ResequencePropertyType {
                    type_id,
                    sequence,
                    occurred_at: ctx.occurred_at,
                },
            ))
        })
    }

    pub fn create_tag(
        &self,
        ctx: &ActionContext,
        name: &str,
        color: Option<u32>,
    ) -> Result<TagId, DispatchError> {
        self.run(|| {
            self.ensure_tag_name_free(name, None)?;
            let tag_id = TagId::generate();
            self.dispatch_tag(TagCommand::CreateTag(CreateTag {
                tag_id,
                name: name.to_string(),
                color,
                occurred_at: ctx.occurred_at,
            }))?;
            tracing::info!(%tag_id, name = name.trim(), "tag created");
            Ok(tag_id)
        })
    }

    pub fn rename_tag(
        &self,
        ctx: &ActionContext,
        tag_id: TagId,
        name: &str,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            self.ensure_tag_name_free(name, Some(tag_id))?;
            self.dispatch_tag(TagCommand::RenameTag(RenameTag {
                tag_id,
                name: name.to_string(),
                occurred_at: ctx.occurred_at,
            }))
        })
    }

    pub fn set_tag_color(
        &self,
        ctx: &ActionContext,
        tag_id: TagId,
        color: Option<u32>,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            self.dispatch_tag(TagCommand::SetTagColor(SetTagColor {
                tag_id,
                color,
                occurred_at: ctx.occurred_at,
            }))
        })
    }

    // ---- properties ----

    pub fn create_property(
        &self,
        ctx: &ActionContext,
        new: NewProperty,
    ) -> Result<PropertyId, DispatchError> {
        self.run(|| {
            if let Some(type_id) = new.property_type_id {
                self.ensure_type_exists(type_id)?;
            }
            self.ensure_tags_exist(&new.tag_ids)?;

            let mut details = new.details;
            if details.date_availability.is_none() {
                details.date_availability = Some(default_availability(
                    ctx.today(),
                    self.config.availability_months,
                ));
            }

            let property_id = PropertyId::generate();
            self.dispatch_property(PropertyCommand::CreateProperty(CreateProperty {
                property_id,
                details,
                expected_price: new.expected_price,
                garden: new.garden,
                property_type_id: new.property_type_id,
                tag_ids: new.tag_ids,
                salesperson_id: Some(new.salesperson_id.unwrap_or(ctx.actor)),
                occurred_at: ctx.occurred_at,
            }))?;
            tracing::info!(%property_id, actor = %ctx.actor, "property created");
            Ok(property_id)
        })
    }

    pub fn update_details(
        &self,
        ctx: &ActionContext,
        property_id: PropertyId,
        details: PropertyDetails,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            self.dispatch_property(PropertyCommand::UpdateDetails(UpdateDetails {
                property_id,
                details,
                occurred_at: ctx.occurred_at,
            }))
        })
    }

    pub fn set_expected_price(
        &self,
        ctx: &ActionContext,
        property_id: PropertyId,
        expected_price: Money,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            self.dispatch_property(PropertyCommand::SetExpectedPrice(SetExpectedPrice {
                property_id,
                expected_price,
                occurred_at: ctx.occurred_at,
            }))
        })
    }

    pub fn set_garden(
        &self,
        ctx: &ActionContext,
        property_id: PropertyId,
        enabled: bool,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            self.dispatch_property(PropertyCommand::SetGarden(SetGarden {
                property_id,
                enabled,
                occurred_at: ctx.occurred_at,
            }))
        })
    }

    pub fn update_garden(
        &self,
        ctx: &ActionContext,
        property_id: PropertyId,
        area: u32,
        orientation: Option<GardenOrientation>,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            self.dispatch_property(PropertyCommand::UpdateGarden(UpdateGarden {
                property_id,
                area,
                orientation,
                occurred_at: ctx.occurred_at,
            }))
        })
    }

    pub fn assign_property_type(
        &self,
        ctx: &ActionContext,
        property_id: PropertyId,
        property_type_id: Option<PropertyTypeId>,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            if let Some(type_id) = property_type_id {
                self.ensure_type_exists(type_id)?;
            }
            self.dispatch_property(PropertyCommand::AssignPropertyType(AssignPropertyType {
                property_id,
                property_type_id,
                occurred_at: ctx.occurred_at,
            }))
        })
    }

    pub fn set_tags(
        &self,
        ctx: &ActionContext,
        property_id: PropertyId,
        tag_ids: BTreeSet<TagId>,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            self.ensure_tags_exist(&tag_ids)?;
            self.dispatch_property(PropertyCommand::SetTags(SetTags {
                property_id,
                tag_ids,
                occurred_at: ctx.occurred_at,
            }))
        })
    }

    pub fn assign_salesperson(
        &self,
        ctx: &ActionContext,
        property_id: PropertyId,
        salesperson_id: Option<UserId>,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            self.dispatch_property(PropertyCommand::AssignSalesperson(AssignSalesperson {
                property_id,
                salesperson_id,
                occurred_at: ctx.occurred_at,
            }))
        })
    }

    /// Archive (`false`) or restore (`true`) a listing.
    pub fn set_active(
        &self,
        ctx: &ActionContext,
        property_id: PropertyId,
        active: bool,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            self.dispatch_property(PropertyCommand::SetActive(SetActive {
                property_id,
                active,
                occurred_at: ctx.occurred_at,
            }))
        })
    }

    /// Record an offer. Validity defaults to the configured number of days.
    pub fn submit_offer(
        &self,
        ctx: &ActionContext,
        property_id: PropertyId,
        partner_id: PartnerId,
        price: Money,
        validity_days: Option<u32>,
    ) -> Result<OfferId, DispatchError> {
        self.run(|| {
            let offer_id = OfferId::generate();
            self.dispatch_property(PropertyCommand::SubmitOffer(SubmitOffer {
                property_id,
                offer_id,
                partner_id,
                price,
                validity_days: Some(validity_days.unwrap_or(self.config.offer_validity_days)),
                occurred_at: ctx.occurred_at,
            }))?;
            tracing::info!(%property_id, %offer_id, %price, "offer submitted");
            Ok(offer_id)
        })
    }

    pub fn accept_offer(
        &self,
        ctx: &ActionContext,
        property_id: PropertyId,
        offer_id: OfferId,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            self.dispatch_property(PropertyCommand::AcceptOffer(AcceptOffer {
                property_id,
                offer_id,
                occurred_at: ctx.occurred_at,
            }))?;
            tracing::info!(%property_id, %offer_id, "offer accepted");
            Ok(())
        })
    }

    pub fn refuse_offer(
        &self,
        ctx: &ActionContext,
        property_id: PropertyId,
        offer_id: OfferId,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            self.dispatch_property(PropertyCommand::RefuseOffer(RefuseOffer {
                property_id,
                offer_id,
                occurred_at: ctx.occurred_at,
            }))
        })
    }

    pub fn set_offer_validity(
        &self,
        ctx: &ActionContext,
        property_id: PropertyId,
        offer_id: OfferId,
        validity_days: u32,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            self.dispatch_property(PropertyCommand::SetOfferValidity(SetOfferValidity {
                property_id,
                offer_id,
                validity_days,
                occurred_at: ctx.occurred_at,
            }))
        })
    }

    pub fn set_offer_deadline(
        &self,
        ctx: &ActionContext,
        property_id: PropertyId,
        offer_id: OfferId,
        deadline: NaiveDate,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            self.dispatch_property(PropertyCommand::SetOfferDeadline(SetOfferDeadline {
                property_id,
                offer_id,
                deadline,
                occurred_at: ctx.occurred_at,
            }))
        })
    }

    /// Sell the property, running every sale hook first.
    ///
    /// All-or-nothing: when a hook or the transition fails, the hooks that
    /// already ran are aborted in reverse order and the property stays unsold.
    /// Selling an already sold property is a no-op and runs no hook.
    pub fn mark_sold(&self, ctx: &ActionContext, property_id: PropertyId) -> Result<(), DispatchError> {
        self.run(|| {
            let command = PropertyCommand::MarkSold(MarkSold {
                property_id,
                occurred_at: ctx.occurred_at,
            });

            let property = self.load_property(property_id)?;
            let decided = property
                .handle(&command)
                .map_err(DispatchError::from)
                .inspect_err(|err| log_rejection("mark_sold", property_id, err))?;
            if decided.is_empty() {
                tracing::debug!(%property_id, "property already sold");
                return Ok(());
            }

            let sale = SaleContext {
                property: &property,
                ctx,
            };
            for (ran, hook) in self.sale_hooks.iter().enumerate() {
                tracing::debug!(hook = hook.name(), %property_id, "running sale hook");
                if let Err(err) = hook.before_sold(&sale) {
                    tracing::warn!(hook = hook.name(), %property_id, %err, "sale hook failed");
                    abort_hooks(&self.sale_hooks[..ran], &sale);
                    return Err(err);
                }
            }

            if let Err(err) = self.dispatch_property(command) {
                abort_hooks(&self.sale_hooks, &sale);
                return Err(err);
            }
            tracing::info!(%property_id, selling_price = %property.selling_price(), "property sold");
            Ok(())
        })
    }

    pub fn mark_cancelled(
        &self,
        ctx: &ActionContext,
        property_id: PropertyId,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            self.dispatch_property(PropertyCommand::MarkCancelled(MarkCancelled {
                property_id,
                occurred_at: ctx.occurred_at,
            }))?;
            tracing::info!(%property_id, "property cancelled");
            Ok(())
        })
    }

    pub fn delete_property(
        &self,
        ctx: &ActionContext,
        property_id: PropertyId,
    ) -> Result<(), DispatchError> {
        self.run(|| {
            self.dispatch_property(PropertyCommand::DeleteProperty(DeleteProperty {
                property_id,
                occurred_at: ctx.occurred_at,
            }))?;
            tracing::info!(%property_id, "property deleted");
            Ok(())
        })
    }

    // ---- queries ----

    /// Current state of a live property, rehydrated from its stream.
    pub fn property(&self, property_id: PropertyId) -> Result<Property, DispatchError> {
        let property = self.load_property(property_id)?;
        if !property.is_created() || property.is_deleted() {
            return Err(DispatchError::NotFound);
        }
        Ok(property)
    }

    /// Every listing, archived included, newest first.
    pub fn listings(&self) -> Vec<PropertyListing> {
        self.listings.all()
    }

    pub fn listings_for_salesperson(
        &self,
        salesperson_id: UserId,
        include_archived: bool,
    ) -> Vec<PropertyListing> {
        self.listings.by_salesperson(salesperson_id, include_archived)
    }

    pub fn property_type_overview(
        &self,
        type_id: PropertyTypeId,
    ) -> Result<PropertyTypeOverview, DispatchError> {
        let property_type = self.catalog.property_type(type_id).ok_or(DispatchError::NotFound)?;
        Ok(PropertyTypeOverview {
            property_type,
            properties: self.listings.properties_of_type(type_id),
            offer_count: self.listings.offer_count_for_type(type_id),
        })
    }

    pub fn property_types(&self) -> Vec<PropertyTypeReadModel> {
        self.catalog.property_types()
    }

    pub fn tags(&self) -> Vec<TagReadModel> {
        self.catalog.tags()
    }

    pub fn invoices_for_property(&self, property_id: PropertyId) -> Vec<InvoiceReadModel> {
        self.invoices.for_origin(property_id.0)
    }

    /// Rebuild every read model from the full event log.
    pub fn rebuild_read_models(&self) -> Result<(), DispatchError> {
        let _guard = self.actions.lock().unwrap_or_else(PoisonError::into_inner);

        // Everything queued is also in the log.
        self.feed.lock().unwrap_or_else(PoisonError::into_inner).drain();

        let envelopes: Vec<_> = self
            .dispatcher
            .store()
            .load_all()?
            .iter()
            .map(|stored| stored.to_envelope())
            .collect();
        for projection in self.projections() {
            projection
                .rebuild_from_scratch(&envelopes)
                .map_err(|e| DispatchError::Projection(format!("{}: {e}", projection.name())))?;
        }
        tracing::info!(events = envelopes.len(), "read models rebuilt");
        Ok(())
    }

    // ---- internals ----

    fn projections(&self) -> [&dyn Projection; 3] {
        [&self.catalog, &self.listings, &self.invoices]
    }

    /// Run one action under the actions lock, then bring the read models up to date.
    fn run<T>(&self, action: impl FnOnce() -> Result<T, DispatchError>) -> Result<T, DispatchError> {
        let _guard = self.actions.lock().unwrap_or_else(PoisonError::into_inner);
        let outcome = action();
        let synced = self.sync();
        let value = outcome?;
        synced?;
        Ok(value)
    }

    /// Feed published envelopes to the projections. Every envelope is
    /// offered to every projection; the first failure is reported.
    fn sync(&self) -> Result<(), DispatchError> {
        let feed = self.feed.lock().unwrap_or_else(PoisonError::into_inner);
        let mut first_error = None;
        for envelope in feed.drain() {
            for projection in self.projections() {
                if let Err(err) = projection.apply_envelope(&envelope) {
                    tracing::error!(projection = projection.name(), %err, "projection rejected event");
                    if first_error.is_none() {
                        first_error = Some(DispatchError::Projection(format!(
                            "{}: {err}",
                            projection.name()
                        )));
                    }
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn load_property(&self, property_id: PropertyId) -> Result<Property, DispatchError> {
        self.dispatcher
            .load(property_id.0, |id| Property::empty(PropertyId::new(id)))
    }

    fn dispatch_property(&self, command: PropertyCommand) -> Result<(), DispatchError> {
        let property_id = command.property_id();
        let action = command_name(&command);
        self.dispatcher
            .dispatch(streams::PROPERTY, command, |id| Property::empty(PropertyId::new(id)))
            .inspect_err(|err| log_rejection(action, property_id, err))?;
        Ok(())
    }

    fn dispatch_type(&self, command: PropertyTypeCommand) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(streams::PROPERTY_TYPE, command, |id| {
            PropertyType::empty(PropertyTypeId::new(id))
        })?;
        Ok(())
    }

    fn dispatch_tag(&self, command: TagCommand) -> Result<(), DispatchError> {
        self.dispatcher
            .dispatch(streams::TAG, command, |id| Tag::empty(TagId::new(id)))?;
        Ok(())
    }

    fn ensure_type_name_free(
        &self,
        name: &str,
        renamed: Option<PropertyTypeId>,
    ) -> Result<(), DispatchError> {
        let taken = self
            .catalog
            .property_type_named(name.trim())
            .filter(|existing| Some(existing.type_id) != renamed);
        match taken {
            Some(existing) => Err(DomainError::constraint(format!(
                "a property type named '{}' already exists",
                existing.name
            ))
            .into()),
            None => Ok(()),
        }
    }

    fn ensure_tag_name_free(&self, name: &str, renamed: Option<TagId>) -> Result<(), DispatchError> {
        let taken = self
            .catalog
            .tag_named(name.trim())
            .filter(|existing| Some(existing.tag_id) != renamed);
        match taken {
            Some(existing) => Err(DomainError::constraint(format!(
                "a tag named '{}' already exists",
                existing.name
            ))
            .into()),
            None => Ok(()),
        }
    }

    fn ensure_type_exists(&self, type_id: PropertyTypeId) -> Result<(), DispatchError> {
        if self.catalog.property_type(type_id).is_none() {
            tracing::warn!(%type_id, "unknown property type");
            return Err(DispatchError::NotFound);
        }
        Ok(())
    }

    fn ensure_tags_exist(&self, tag_ids: &BTreeSet<TagId>) -> Result<(), DispatchError> {
        if let Some(missing) = tag_ids.iter().find(|id| self.catalog.tag(**id).is_none()) {
            tracing::warn!(tag_id = %missing, "unknown tag");
            return Err(DispatchError::NotFound);
        }
        Ok(())
    }
}

/// Compensate hooks newest first. Failures are logged; the caller reports
/// the error that triggered the abort.
fn abort_hooks(hooks: &[Box<dyn SaleHook>], sale: &SaleContext<'_>) {
    let property_id = sale.property.id_typed();
    for hook in hooks.iter().rev() {
        tracing::warn!(hook = hook.name(), %property_id, "aborting sale hook");
        if let Err(err) = hook.abort(sale) {
            tracing::error!(hook = hook.name(), %property_id, %err, "sale hook abort failed");
        }
    }
}

fn log_rejection(action: &'static str, property_id: PropertyId, err: &DispatchError) {
    if err.is_guard() || err.is_constraint() {
        tracing::warn!(action, %property_id, %err, "action rejected");
    }
}

fn command_name(command: &PropertyCommand) -> &'static str {
    match command {
        PropertyCommand::CreateProperty(_) => "create_property",
        PropertyCommand::UpdateDetails(_) => "update_details",
        PropertyCommand::SetExpectedPrice(_) => "set_expected_price",
        PropertyCommand::SetGarden(_) => "set_garden",
        PropertyCommand::UpdateGarden(_) => "update_garden",
        PropertyCommand::AssignPropertyType(_) => "assign_property_type",
        PropertyCommand::SetTags(_) => "set_tags",
        PropertyCommand::AssignSalesperson(_) => "assign_salesperson",
        PropertyCommand::SetActive(_) => "set_active",
        PropertyCommand::SubmitOffer(_) => "submit_offer",
        PropertyCommand::AcceptOffer(_) => "accept_offer",
        PropertyCommand::RefuseOffer(_) => "refuse_offer",
        PropertyCommand::SetOfferValidity(_) => "set_offer_validity",
        PropertyCommand::SetOfferDeadline(_) => "set_offer_deadline",
        PropertyCommand::MarkSold(_) => "mark_sold",
        PropertyCommand::MarkCancelled(_) => "mark_cancelled",
        PropertyCommand::DeleteProperty(_) => "delete_property",
    }
}
