//! Command execution pipeline for event-sourced aggregates.
//!
//! ```text
//! Command
//!   ↓
//! 1. Load the aggregate stream from the store
//!   ↓
//! 2. Rehydrate (apply history to a fresh instance)
//!   ↓
//! 3. Handle (pure decision, produces events)
//!   ↓
//! 4. Append with ExpectedVersion::Exact(loaded version)
//!   ↓
//! 5. Publish committed envelopes on the bus
//! ```
//!
//! A concurrent writer on the same stream makes step 4 fail with
//! [`DispatchError::Conflict`]; nothing is published for a failed append.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use estate_core::{Aggregate, AggregateId, DomainError, ExpectedVersion};
use estate_events::{Command, EventBus, EventEnvelope};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The action is not allowed in the current state.
    #[error("guard violation: {0}")]
    GuardViolation(String),
    /// Written data breaks an integrity rule.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("invalid identifier: {0}")]
    InvalidId(String),
    #[error("not found")]
    NotFound,
    /// Already exists, or a stale stream version on append.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Historical payloads could not be read back into the aggregate event type.
    #[error("failed to deserialize stored event: {0}")]
    Deserialize(String),
    #[error("event store failure: {0}")]
    Store(EventStoreError),
    /// Publication failed after a successful append; the events are persisted.
    #[error("event publication failed: {0}")]
    Publish(String),
    /// A read model rejected a committed event.
    #[error("projection failed: {0}")]
    Projection(String),
}

impl DispatchError {
    pub fn is_guard(&self) -> bool {
        matches!(self, DispatchError::GuardViolation(_))
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, DispatchError::ConstraintViolation(_))
    }
}

impl From<EventStoreError> for DispatchError {
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Concurrency(msg) => DispatchError::Conflict(msg),
            other => DispatchError::Store(other),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::GuardViolation(msg) => DispatchError::GuardViolation(msg),
            DomainError::ConstraintViolation(msg) => DispatchError::ConstraintViolation(msg),
            DomainError::InvalidId(msg) => DispatchError::InvalidId(msg),
            DomainError::NotFound => DispatchError::NotFound,
            DomainError::Conflict(msg) => DispatchError::Conflict(msg),
        }
    }
}

/// Reusable command execution engine.
///
/// Generic over the store and bus so tests and embedders can use the
/// in-memory implementations.
#[derive(Debug)]
pub struct CommandDispatcher<S, B> {
    store: S,
    bus: B,
}

impl<S, B> CommandDispatcher<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<S, B> CommandDispatcher<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Rehydrate an aggregate from its stream without changing anything.
    pub fn load<A>(
        &self,
        aggregate_id: AggregateId,
        make_aggregate: impl FnOnce(AggregateId) -> A,
    ) -> Result<A, DispatchError>
    where
        A: Aggregate,
        A::Event: DeserializeOwned,
    {
        let history = self.store.load_stream(aggregate_id)?;
        validate_loaded_stream(aggregate_id, &history)?;

        let mut aggregate = make_aggregate(aggregate_id);
        apply_history::<A>(&mut aggregate, &history)?;
        Ok(aggregate)
    }

    /// Run `command` through the full pipeline and return the committed events.
    ///
    /// A command that decides no events commits and publishes nothing.
    pub fn dispatch<A>(
        &self,
        aggregate_type: impl Into<String>,
        command: A::Command,
        make_aggregate: impl FnOnce(AggregateId) -> A,
    ) -> Result<Vec<StoredEvent>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Command: Command,
        A::Event: estate_events::Event + Serialize + DeserializeOwned,
    {
        let aggregate_id = command.target_aggregate_id();

        let history = self.store.load_stream(aggregate_id)?;
        validate_loaded_stream(aggregate_id, &history)?;
        let expected = ExpectedVersion::Exact(stream_version(&history));

        let mut aggregate = make_aggregate(aggregate_id);
        apply_history::<A>(&mut aggregate, &history)?;

        let decided = aggregate.handle(&command)?;
        if decided.is_empty() {
            return Ok(vec![]);
        }

        let aggregate_type = aggregate_type.into();
        let uncommitted = decided
            .iter()
            .map(|ev| {
                UncommittedEvent::from_typed(aggregate_id, aggregate_type.clone(), Uuid::now_v7(), ev)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let committed = self.store.append(uncommitted, expected)?;

        for stored in &committed {
            self.bus
                .publish(stored.to_envelope())
                .map_err(|e| DispatchError::Publish(format!("{e:?}")))?;
        }

        Ok(committed)
    }
}

fn stream_version(stream: &[StoredEvent]) -> u64 {
    stream.last().map(|e| e.sequence_number).unwrap_or(0)
}

fn validate_loaded_stream(
    aggregate_id: AggregateId,
    stream: &[StoredEvent],
) -> Result<(), DispatchError> {
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.aggregate_id != aggregate_id {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "loaded stream contains wrong aggregate_id at index {idx}"
            ))));
        }
        if e.sequence_number <= last {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "non-monotonic sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            ))));
        }
        last = e.sequence_number;
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> Result<(), DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    for stored in history {
        let ev: A::Event = serde_json::from_value(stored.payload.clone())
            .map_err(|e| DispatchError::Deserialize(e.to_string()))?;
        aggregate.apply(&ev);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use estate_catalog::{CreateTag, RenameTag, Tag, TagCommand, TagId};
    use estate_core::AggregateRoot;
    use estate_events::InMemoryEventBus;

    use crate::event_store::InMemoryEventStore;

    type Dispatcher = CommandDispatcher<Arc<InMemoryEventStore>, Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>>;

    fn dispatcher() -> Dispatcher {
        CommandDispatcher::new(Arc::new(InMemoryEventStore::new()), Arc::new(InMemoryEventBus::new()))
    }

    fn create(tag_id: TagId, name: &str) -> TagCommand {
        TagCommand::CreateTag(CreateTag {
            tag_id,
            name: name.to_string(),
            color: None,
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn dispatch_appends_then_publishes() {
        let d = dispatcher();
        let sub = d.bus().subscribe();
        let tag_id = TagId::generate();

        let committed = d.dispatch("estate.tag", create(tag_id, "cozy"), |id| Tag::empty(TagId::new(id))).unwrap();

        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].sequence_number, 1);
        let published = sub.drain();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event_type(), "estate.tag.created");

        let tag: Tag = d.load(tag_id.0, |id| Tag::empty(TagId::new(id))).unwrap();
        assert_eq!(tag.name(), "cozy");
        assert_eq!(tag.version(), 1);
    }

    #[test]
    fn domain_errors_keep_their_kind_and_publish_nothing() {
        let d = dispatcher();
        let sub = d.bus().subscribe();
        let tag_id = TagId::generate();

        let err = d
            .dispatch(
                "estate.tag",
                TagCommand::RenameTag(RenameTag {
                    tag_id,
                    name: "renamed".to_string(),
                    occurred_at: Utc::now(),
                }),
                |id| Tag::empty(TagId::new(id)),
            )
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound));

        let err = d
            .dispatch("estate.tag", create(tag_id, "   "), |id| Tag::empty(TagId::new(id)))
            .unwrap_err();
        assert!(err.is_constraint());
        assert!(sub.drain().is_empty());
    }

    #[test]
    fn no_op_commands_commit_nothing() {
        let d = dispatcher();
        let tag_id = TagId::generate();
        d.dispatch("estate.tag", create(tag_id, "cozy"), |id| Tag::empty(TagId::new(id))).unwrap();

        let committed = d
            .dispatch(
                "estate.tag",
                TagCommand::RenameTag(RenameTag {
                    tag_id,
                    name: "cozy".to_string(),
                    occurred_at: Utc::now(),
                }),
                |id| Tag::empty(TagId::new(id)),
            )
            .unwrap();
        assert!(committed.is_empty());
        assert_eq!(d.store().load_stream(tag_id.0).unwrap().len(), 1);
    }
}
