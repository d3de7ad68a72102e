use serde_json::Value as JsonValue;

use estate_catalog::{PropertyTypeEvent, PropertyTypeId, TagEvent, TagId};
use estate_core::AggregateId;
use estate_events::EventEnvelope;

use crate::projections::Projection;
use crate::projections::cursor::{CursorCheck, ProjectionError, StreamCursors};
use crate::read_model::{InMemoryReadStore, ReadStore};
use crate::streams;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTypeReadModel {
    pub type_id: PropertyTypeId,
    pub name: String,
    pub sequence: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagReadModel {
    pub tag_id: TagId,
    pub name: String,
    pub color: Option<u32>,
}

/// Property types and tags, with name lookups for uniqueness checks.
#[derive(Debug, Default)]
pub struct CatalogProjection {
    types: InMemoryReadStore<PropertyTypeId, PropertyTypeReadModel>,
    tags: InMemoryReadStore<TagId, TagReadModel>,
    cursors: StreamCursors,
}

impl CatalogProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property_type(&self, type_id: PropertyTypeId) -> Option<PropertyTypeReadModel> {
        self.types.get(&type_id)
    }

    pub fn tag(&self, tag_id: TagId) -> Option<TagReadModel> {
        self.tags.get(&tag_id)
    }

    /// Types ordered by sequence, then name.
    pub fn property_types(&self) -> Vec<PropertyTypeReadModel> {
        let mut types = self.types.list();
        types.sort_by(|a, b| a.sequence.cmp(&b.sequence).then_with(|| a.name.cmp(&b.name)));
        types
    }

    /// Tags ordered by name.
    pub fn tags(&self) -> Vec<TagReadModel> {
        let mut tags = self.tags.list();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        tags
    }

    pub fn property_type_named(&self, name: &str) -> Option<PropertyTypeReadModel> {
        self.types.list().into_iter().find(|t| t.name == name)
    }

    pub fn tag_named(&self, name: &str) -> Option<TagReadModel> {
        self.tags.list().into_iter().find(|t| t.name == name)
    }

    fn apply_type_event(
        &self,
        aggregate_id: AggregateId,
        payload: &JsonValue,
    ) -> Result<(), ProjectionError> {
        let ev: PropertyTypeEvent =
            serde_json::from_value(payload.clone()).map_err(|e| ProjectionError::Deserialize {
                aggregate_type: streams::PROPERTY_TYPE,
                reason: e.to_string(),
            })?;

        let type_id = match &ev {
            PropertyTypeEvent::PropertyTypeCreated(e) => e.type_id,
            PropertyTypeEvent::PropertyTypeRenamed(e) => e.type_id,
            PropertyTypeEvent::PropertyTypeResequenced(e) => e.type_id,
        };
        if type_id.0 != aggregate_id {
            return Err(ProjectionError::StreamMismatch(aggregate_id));
        }

        match ev {
            PropertyTypeEvent::PropertyTypeCreated(e) => {
                self.types.upsert(
                    e.type_id,
                    PropertyTypeReadModel {
                        type_id: e.type_id,
                        name: e.name,
                        sequence: e.sequence,
                    },
                );
            }
            PropertyTypeEvent::PropertyTypeRenamed(e) => {
                if let Some(mut rm) = self.types.get(&e.type_id) {
                    rm.name = e.name;
                    self.types.upsert(e.type_id, rm);
                }
            }
            PropertyTypeEvent::PropertyTypeResequenced(e) => {
                if let Some(mut rm) = self.types.get(&e.type_id) {
                    rm.sequence = e.sequence;
                    self.types.upsert(e.type_id, rm);
                }
            }
        }

        Ok(())
    }

    fn apply_tag_event(
        &self,
        aggregate_id: AggregateId,
        payload: &JsonValue,
    ) -> Result<(), ProjectionError> {
        let ev: TagEvent =
            serde_json::from_value(payload.clone()).map_err(|e| ProjectionError::Deserialize {
                aggregate_type: streams::TAG,
                reason: e.to_string(),
            })?;

        let tag_id = match &ev {
            TagEvent::TagCreated(e) => e.tag_id,
            TagEvent::TagRenamed(e) => e.tag_id,
            TagEvent::TagColorChanged(e) => e.tag_id,
        };
        if tag_id.0 != aggregate_id {
            return Err(ProjectionError::StreamMismatch(aggregate_id));
        }

        match ev {
            TagEvent::TagCreated(e) => {
                self.tags.upsert(
                    e.tag_id,
                    TagReadModel {
                        tag_id: e.tag_id,
                        name: e.name,
                        color: e.color,
                    },
                );
            }
            TagEvent::TagRenamed(e) => {
                if let Some(mut rm) = self.tags.get(&e.tag_id) {
                    rm.name = e.name;
                    self.tags.upsert(e.tag_id, rm);
                }
            }
            TagEvent::TagColorChanged(e) => {
                if let Some(mut rm) = self.tags.get(&e.tag_id) {
                    rm.color = e.color;
                    self.tags.upsert(e.tag_id, rm);
                }
            }
        }

        Ok(())
    }
}

impl Projection for CatalogProjection {
    fn name(&self) -> &'static str {
        "estate.catalog"
    }

    fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        let aggregate_type = envelope.aggregate_type();
        if aggregate_type != streams::PROPERTY_TYPE && aggregate_type != streams::TAG {
            return Ok(());
        }

        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();
        if self.cursors.check(aggregate_id, seq)? == CursorCheck::Skip {
            tracing::debug!(projection = self.name(), %aggregate_id, seq, "skipping replayed event");
            return Ok(());
        }

        if aggregate_type == streams::PROPERTY_TYPE {
            self.apply_type_event(aggregate_id, envelope.payload())?;
        } else {
            self.apply_tag_event(aggregate_id, envelope.payload())?;
        }

        self.cursors.advance(aggregate_id, seq);
        Ok(())
    }

    fn reset(&self) {
        self.types.clear();
        self.tags.clear();
        self.cursors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use estate_catalog::{PropertyTypeCreated, PropertyTypeResequenced, TagCreated};
    use uuid::Uuid;

    fn envelope<E: serde::Serialize>(
        aggregate_id: AggregateId,
        aggregate_type: &str,
        seq: u64,
        event: &E,
    ) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            Uuid::now_v7(),
            aggregate_id,
            aggregate_type,
            seq,
            "test",
            serde_json::to_value(event).unwrap(),
        )
    }

    fn type_created(type_id: PropertyTypeId, name: &str, sequence: i32) -> PropertyTypeEvent {
        PropertyTypeEvent::PropertyTypeCreated(PropertyTypeCreated {
            type_id,
            name: name.to_string(),
            sequence,
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn types_are_ordered_by_sequence_then_name() {
        let projection = CatalogProjection::new();
        for (name, sequence) in [("Land", 1), ("Apartment", 2), ("House", 1)] {
            let id = PropertyTypeId::generate();
            projection
                .apply_envelope(&envelope(id.0, streams::PROPERTY_TYPE, 1, &type_created(id, name, sequence)))
                .unwrap();
        }

        let names: Vec<_> = projection.property_types().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["House", "Land", "Apartment"]);
        assert!(projection.property_type_named("House").is_some());
        assert!(projection.property_type_named("house").is_none());
    }

    #[test]
    fn redelivery_is_idempotent() {
        let projection = CatalogProjection::new();
        let id = PropertyTypeId::generate();
        let created = envelope(id.0, streams::PROPERTY_TYPE, 1, &type_created(id, "House", 1));
        let resequenced = envelope(
            id.0,
            streams::PROPERTY_TYPE,
            2,
            &PropertyTypeEvent::PropertyTypeResequenced(PropertyTypeResequenced {
                type_id: id,
                sequence: 9,
                occurred_at: Utc::now(),
            }),
        );

        projection.apply_envelope(&created).unwrap();
        projection.apply_envelope(&resequenced).unwrap();
        projection.apply_envelope(&created).unwrap();

        assert_eq!(projection.property_type(id).unwrap().sequence, 9);
    }

    #[test]
    fn tags_are_listed_by_name_and_rebuildable() {
        let projection = CatalogProjection::new();
        let mut envelopes = Vec::new();
        for name in ["renovated", "cozy"] {
            let id = TagId::generate();
            envelopes.push(envelope(
                id.0,
                streams::TAG,
                1,
                &TagEvent::TagCreated(TagCreated {
                    tag_id: id,
                    name: name.to_string(),
                    color: None,
                    occurred_at: Utc::now(),
                }),
            ));
        }

        projection.rebuild_from_scratch(&envelopes).unwrap();
        projection.rebuild_from_scratch(&envelopes).unwrap();

        let names: Vec<_> = projection.tags().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["cozy", "renovated"]);
    }
}
