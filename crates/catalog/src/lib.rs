//! Listing catalog: property types and tags (event-sourced reference data).
//!
//! Pure domain logic only. Name uniqueness spans aggregates and is enforced by
//! the infrastructure layer against the catalog read model.

pub mod property_type;
pub mod tag;

pub use property_type::{
    CreatePropertyType, DEFAULT_SEQUENCE, PropertyType, PropertyTypeCommand, PropertyTypeCreated,
    PropertyTypeEvent, PropertyTypeId, PropertyTypeRenamed, PropertyTypeResequenced,
    RenamePropertyType, ResequencePropertyType,
};
pub use tag::{
    CreateTag, RenameTag, SetTagColor, Tag, TagColorChanged, TagCommand, TagCreated, TagEvent,
    TagId, TagRenamed,
};
