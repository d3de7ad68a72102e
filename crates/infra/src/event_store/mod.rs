//! Append-only event store boundary.
//!
//! One stream per aggregate instance, keyed by `AggregateId`. The trait makes
//! no storage assumptions; the in-memory store backs tests and embedding.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
