use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estate_core::{Aggregate, AggregateId, AggregateRoot, DomainError, validate};
use estate_events::{Command, Event};

estate_core::aggregate_id!(
    /// Property type identifier.
    PropertyTypeId
);

/// Ordering sequence given to a type when none is supplied.
pub const DEFAULT_SEQUENCE: i32 = 1;

/// Aggregate root: PropertyType (e.g. "House", "Apartment").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyType {
    id: PropertyTypeId,
    name: String,
    sequence: i32,
    version: u64,
    created: bool,
}

impl PropertyType {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: PropertyTypeId) -> Self {
        Self {
            id,
            name: String::new(),
            sequence: DEFAULT_SEQUENCE,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> PropertyTypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sequence(&self) -> i32 {
        self.sequence
    }

    pub fn is_created(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for PropertyType {
    type Id = PropertyTypeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreatePropertyType.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePropertyType {
    pub type_id: PropertyTypeId,
    pub name: String,
    pub sequence: Option<i32>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RenamePropertyType.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePropertyType {
    pub type_id: PropertyTypeId,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ResequencePropertyType.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResequencePropertyType {
    pub type_id: PropertyTypeId,
    pub sequence: i32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyTypeCommand {
    CreatePropertyType(CreatePropertyType),
    RenamePropertyType(RenamePropertyType),
    ResequencePropertyType(ResequencePropertyType),
}

impl Command for PropertyTypeCommand {
    fn target_aggregate_id(&self) -> AggregateId {
        match self {
            PropertyTypeCommand::CreatePropertyType(c) => c.type_id.0,
            PropertyTypeCommand::RenamePropertyType(c) => c.type_id.0,
            PropertyTypeCommand::ResequencePropertyType(c) => c.type_id.0,
        }
    }
}

/// Event: PropertyTypeCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTypeCreated {
    pub type_id: PropertyTypeId,
    pub name: String,
    pub sequence: i32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PropertyTypeRenamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTypeRenamed {
    pub type_id: PropertyTypeId,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PropertyTypeResequenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTypeResequenced {
    pub type_id: PropertyTypeId,
    pub sequence: i32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyTypeEvent {
    PropertyTypeCreated(PropertyTypeCreated),
    PropertyTypeRenamed(PropertyTypeRenamed),
    PropertyTypeResequenced(PropertyTypeResequenced),
}

impl Event for PropertyTypeEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PropertyTypeEvent::PropertyTypeCreated(_) => "estate.property_type.created",
            PropertyTypeEvent::PropertyTypeRenamed(_) => "estate.property_type.renamed",
            PropertyTypeEvent::PropertyTypeResequenced(_) => "estate.property_type.resequenced",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PropertyTypeEvent::PropertyTypeCreated(e) => e.occurred_at,
            PropertyTypeEvent::PropertyTypeRenamed(e) => e.occurred_at,
            PropertyTypeEvent::PropertyTypeResequenced(e) => e.occurred_at,
        }
    }
}

impl Aggregate for PropertyType {
    type Command = PropertyTypeCommand;
    type Event = PropertyTypeEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PropertyTypeEvent::PropertyTypeCreated(e) => {
                self.id = e.type_id;
                self.name = e.name.clone();
                self.sequence = e.sequence;
                self.created = true;
            }
            PropertyTypeEvent::PropertyTypeRenamed(e) => {
                self.name = e.name.clone();
            }
            PropertyTypeEvent::PropertyTypeResequenced(e) => {
                self.sequence = e.sequence;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PropertyTypeCommand::CreatePropertyType(cmd) => self.handle_create(cmd),
            PropertyTypeCommand::RenamePropertyType(cmd) => self.handle_rename(cmd),
            PropertyTypeCommand::ResequencePropertyType(cmd) => self.handle_resequence(cmd),
        }
    }
}

impl PropertyType {
    fn ensure_exists(&self, type_id: PropertyTypeId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != type_id {
            return Err(DomainError::invalid_id("type_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(
        &self,
        cmd: &CreatePropertyType,
    ) -> Result<Vec<PropertyTypeEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("property type already exists"));
        }
        let name = validate::required_text("property type name", &cmd.name)?;

        Ok(vec![PropertyTypeEvent::PropertyTypeCreated(PropertyTypeCreated {
            type_id: cmd.type_id,
            name,
            sequence: cmd.sequence.unwrap_or(DEFAULT_SEQUENCE),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_rename(
        &self,
        cmd: &RenamePropertyType,
    ) -> Result<Vec<PropertyTypeEvent>, DomainError> {
        self.ensure_exists(cmd.type_id)?;
        let name = validate::required_text("property type name", &cmd.name)?;
        if name == self.name {
            return Ok(vec![]);
        }

        Ok(vec![PropertyTypeEvent::PropertyTypeRenamed(PropertyTypeRenamed {
            type_id: cmd.type_id,
            name,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_resequence(
        &self,
        cmd: &ResequencePropertyType,
    ) -> Result<Vec<PropertyTypeEvent>, DomainError> {
        self.ensure_exists(cmd.type_id)?;
        if cmd.sequence == self.sequence {
            return Ok(vec![]);
        }

        Ok(vec![PropertyTypeEvent::PropertyTypeResequenced(
            PropertyTypeResequenced {
                type_id: cmd.type_id,
                sequence: cmd.sequence,
                occurred_at: cmd.occurred_at,
            },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_events::execute;

    fn created(name: &str) -> PropertyType {
        let type_id = PropertyTypeId::generate();
        let mut pt = PropertyType::empty(type_id);
        execute(
            &mut pt,
            &PropertyTypeCommand::CreatePropertyType(CreatePropertyType {
                type_id,
                name: name.to_string(),
                sequence: None,
                occurred_at: Utc::now(),
            }),
        )
        .unwrap();
        pt
    }

    #[test]
    fn create_defaults_sequence_and_trims_name() {
        let pt = created("  House ");
        assert_eq!(pt.name(), "House");
        assert_eq!(pt.sequence(), DEFAULT_SEQUENCE);
        assert_eq!(pt.version(), 1);
    }

    #[test]
    fn blank_name_is_rejected() {
        let type_id = PropertyTypeId::generate();
        let err = PropertyType::empty(type_id)
            .handle(&PropertyTypeCommand::CreatePropertyType(CreatePropertyType {
                type_id,
                name: " ".to_string(),
                sequence: Some(3),
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(err.is_constraint());
    }

    #[test]
    fn create_twice_conflicts() {
        let pt = created("House");
        let err = pt
            .handle(&PropertyTypeCommand::CreatePropertyType(CreatePropertyType {
                type_id: pt.id_typed(),
                name: "House".to_string(),
                sequence: None,
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn renaming_to_same_name_emits_nothing() {
        let pt = created("House");
        let events = pt
            .handle(&PropertyTypeCommand::RenamePropertyType(RenamePropertyType {
                type_id: pt.id_typed(),
                name: "House".to_string(),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn resequence_missing_type_is_not_found() {
        let type_id = PropertyTypeId::generate();
        let err = PropertyType::empty(type_id)
            .handle(&PropertyTypeCommand::ResequencePropertyType(
                ResequencePropertyType {
                    type_id,
                    sequence: 5,
                    occurred_at: Utc::now(),
                },
            ))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }
}
