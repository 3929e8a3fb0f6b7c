use std::any::TypeId;
use std::fmt;

use crate::error::Result;
use crate::types::{Row, SqlValue};

/// Trait for types persisted as table rows.
///
/// The implementation declares the persisted fields explicitly, in
/// declaration order, together with their key roles.
///
/// # Example
/// ```
/// use pgrepo::{Entity, Field, Row, SqlValue};
///
/// struct User {
///     id: i64,
///     username: String,
/// }
///
/// impl Entity for User {
///     const NAME: &'static str = "User";
///
///     fn fields() -> Vec<Field> {
///         vec![
///             Field::new("id", "id").primary_key(),
///             Field::new("username", "username"),
///         ]
///     }
///
///     fn bind(&self, column: &str) -> Option<SqlValue> {
///         match column {
///             "id" => Some(self.id.into()),
///             "username" => Some(self.username.as_str().into()),
///             _ => None,
///         }
///     }
///
///     fn from_row(row: &Row) -> pgrepo::Result<Self> {
///         Ok(Self {
///             id: row.get("id")?,
///             username: row.get("username")?,
///         })
///     }
/// }
/// ```
pub trait Entity: Sized + Send + Sync + 'static {
    /// Name used in logs and schema errors.
    const NAME: &'static str;

    /// Field declarations in declaration order.
    fn fields() -> Vec<Field>;

    /// Returns the value bound to `column` when inserting this entity.
    fn bind(&self, column: &str) -> Option<SqlValue>;

    /// Decodes one result row.
    fn from_row(row: &Row) -> Result<Self>;
}

/// Key role of a persisted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    None,
    PrimaryKey,
    /// References `column` of the row stored in `table`.
    ForeignKey {
        table: &'static str,
        column: &'static str,
    },
}

/// Shape of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain column value.
    Value,
    /// Another entity, held by value (`optional == false`) or as `Option<_>`.
    Entity { optional: bool, target: EntityType },
}

/// Declaration of one struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Name of the struct field.
    pub name: &'static str,
    /// Column name; empty when the field is not persisted.
    pub column: &'static str,
    pub relation: Relation,
    pub kind: FieldKind,
}

impl Field {
    /// A field stored in `column`.
    pub const fn new(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            relation: Relation::None,
            kind: FieldKind::Value,
        }
    }

    /// A field that is not persisted.
    pub const fn transient(name: &'static str) -> Self {
        Self::new(name, "")
    }

    pub const fn primary_key(mut self) -> Self {
        self.relation = Relation::PrimaryKey;
        self
    }

    pub const fn foreign_key(mut self, table: &'static str, column: &'static str) -> Self {
        self.relation = Relation::ForeignKey { table, column };
        self
    }

    /// The field holds a `T` by value.
    pub fn entity<T: Entity>(mut self) -> Self {
        self.kind = FieldKind::Entity {
            optional: false,
            target: EntityType::of::<T>(),
        };
        self
    }

    /// The field holds an `Option<T>`.
    pub fn optional_entity<T: Entity>(mut self) -> Self {
        self.kind = FieldKind::Entity {
            optional: true,
            target: EntityType::of::<T>(),
        };
        self
    }

    pub fn is_persisted(&self) -> bool {
        !self.column.is_empty()
    }
}

/// Type-erased handle on an [`Entity`] implementation.
#[derive(Clone, Copy)]
pub struct EntityType {
    id: TypeId,
    name: &'static str,
    fields: fn() -> Vec<Field>,
}

impl EntityType {
    pub fn of<T: Entity>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: T::NAME,
            fields: T::fields,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Calls the entity's field declarations.
    pub fn fields(&self) -> Vec<Field> {
        (self.fields)()
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityType {}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityType").field(&self.name).finish()
    }
}
