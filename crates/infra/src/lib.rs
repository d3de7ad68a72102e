//! Infrastructure layer: event store, command dispatch, read models,
//! sale hooks and the `EstateService` action entry points.

pub mod command_dispatcher;
pub mod config;
pub mod event_store;
pub mod hooks;
pub mod projections;
pub mod read_model;
pub mod service;

/// Aggregate type names used as stream kinds in the event store.
pub mod streams {
    pub const PROPERTY_TYPE: &str = "estate.property_type";
    pub const TAG: &str = "estate.tag";
    pub const PROPERTY: &str = "estate.property";
    pub const INVOICE: &str = "account.invoice";
}

pub use command_dispatcher::{CommandDispatcher, DispatchError};
pub use config::{ConfigError, EstateConfig};
pub use event_store::{EventStore, EventStoreError, InMemoryEventStore, StoredEvent};
pub use hooks::{CommissionInvoiceHook, DispatchingInvoiceSink, InvoiceSink, SaleContext, SaleHook};
pub use projections::{InvoiceReadModel, Projection, PropertyListing, PropertyTypeReadModel, TagReadModel};
pub use service::{EstateService, InMemoryEstateService, NewProperty, PropertyTypeOverview};
