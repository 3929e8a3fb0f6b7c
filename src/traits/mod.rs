mod driver;
mod entity;

pub use driver::DatabaseDriver;
pub use entity::{Entity, EntityType, Field, FieldKind, Relation};
