//! `estate-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, money, the acting-user context and the aggregate contracts every
//! listing module builds on.

pub mod aggregate;
pub mod context;
pub mod entity;
pub mod error;
pub mod id;
pub mod validate;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use context::ActionContext;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, PartnerId, UserId};
pub use value_object::{Money, ValueObject};
