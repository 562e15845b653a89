//! Record shapes for the catalog: entities, relations, persons.

mod entity;
mod person;
mod relation;

pub use entity::{EntityKind, FunctionalEntity};
pub use person::Person;
pub use relation::{Relation, RelationKind};
