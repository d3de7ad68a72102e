use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estate_core::{Aggregate, AggregateId, AggregateRoot, DomainError, validate};
use estate_events::{Command, Event};

estate_core::aggregate_id!(
    /// Property tag identifier.
    TagId
);

/// Aggregate root: Tag (e.g. "cozy", "renovated").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    id: TagId,
    name: String,
    /// Optional color index used by list/kanban views.
    color: Option<u32>,
    version: u64,
    created: bool,
}

impl Tag {
    pub fn empty(id: TagId) -> Self {
        Self {
            id,
            name: String::new(),
            color: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> TagId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Option<u32> {
        self.color
    }
}

impl AggregateRoot for Tag {
    type Id = TagId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateTag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTag {
    pub tag_id: TagId,
    pub name: String,
    pub color: Option<u32>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RenameTag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameTag {
    pub tag_id: TagId,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetTagColor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTagColor {
    pub tag_id: TagId,
    pub color: Option<u32>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagCommand {
    CreateTag(CreateTag),
    RenameTag(RenameTag),
    SetTagColor(SetTagColor),
}

impl Command for TagCommand {
    fn target_aggregate_id(&self) -> AggregateId {
        match self {
            TagCommand::CreateTag(c) => c.tag_id.0,
            TagCommand::RenameTag(c) => c.tag_id.0,
            TagCommand::SetTagColor(c) => c.tag_id.0,
        }
    }
}

/// Event: TagCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCreated {
    pub tag_id: TagId,
    pub name: String,
    pub color: Option<u32>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TagRenamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRenamed {
    pub tag_id: TagId,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TagColorChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagColorChanged {
    pub tag_id: TagId,
    pub color: Option<u32>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagEvent {
    TagCreated(TagCreated),
    TagRenamed(TagRenamed),
    TagColorChanged(TagColorChanged),
}

impl Event for TagEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TagEvent::TagCreated(_) => "estate.tag.created",
            TagEvent::TagRenamed(_) => "estate.tag.renamed",
            TagEvent::TagColorChanged(_) => "estate.tag.color_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            TagEvent::TagCreated(e) => e.occurred_at,
            TagEvent::TagRenamed(e) => e.occurred_at,
            TagEvent::TagColorChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Tag {
    type Command = TagCommand;
    type Event = TagEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            TagEvent::TagCreated(e) => {
                self.id = e.tag_id;
                self.name = e.name.clone();
                self.color = e.color;
                self.created = true;
            }
            TagEvent::TagRenamed(e) => {
                self.name = e.name.clone();
            }
            TagEvent::TagColorChanged(e) => {
                self.color = e.color;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            TagCommand::CreateTag(cmd) => {
                if self.created {
                    return Err(DomainError::conflict("tag already exists"));
                }
                let name = validate::required_text("tag name", &cmd.name)?;
                Ok(vec![TagEvent::TagCreated(TagCreated {
                    tag_id: cmd.tag_id,
                    name,
                    color: cmd.color,
                    occurred_at: cmd.occurred_at,
                })])
            }
            TagCommand::RenameTag(cmd) => {
                self.ensure_exists(cmd.tag_id)?;
                let name = validate::required_text("tag name", &cmd.name)?;
                if name == self.name {
                    return Ok(vec![]);
                }
                Ok(vec![TagEvent::TagRenamed(TagRenamed {
                    tag_id: cmd.tag_id,
                    name,
                    occurred_at: cmd.occurred_at,
                })])
            }
            TagCommand::SetTagColor(cmd) => {
                self.ensure_exists(cmd.tag_id)?;
                if cmd.color == self.color {
                    return Ok(vec![]);
                }
                Ok(vec![TagEvent::TagColorChanged(TagColorChanged {
                    tag_id: cmd.tag_id,
                    color: cmd.color,
                    occurred_at: cmd.occurred_at,
                })])
            }
        }
    }
}

impl Tag {
    fn ensure_exists(&self, tag_id: TagId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != tag_id {
            return Err(DomainError::invalid_id("tag_id mismatch"));
        }
        Ok(())
    }
}
