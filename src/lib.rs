//! pgrepo - A typed, driver-agnostic PostgreSQL data mapper
//!
//! Entity types declare their columns and key roles through [`Entity`];
//! the declarations are compiled once per type into a [`Table`] with
//! pre-rendered statements, and a [`Repository`] combines those statements
//! with [`Condition`] filters into parameterized SQL.
//!
//! # Example
//! ```ignore
//! use pgrepo::{clauses, PgRepoClient};
//!
//! // Connect to database
//! let client = PgRepoClient::connect("postgres://localhost/mydb").await?;
//! let users = client.repository::<User>("app", "user").await?;
//!
//! users.create(&[alice, bob]).await?;
//!
//! let regulars = users
//!     .read(&clauses::and(clauses::greater("logins", 20), clauses::eq("username", "bob")), 0)
//!     .await?;
//!
//! users.update([("logins", 0)], &clauses::eq("username", "alice")).await?;
//! users.delete(&clauses::all()).await?;
//! ```

pub mod clauses;
pub mod drivers;
pub mod error;
pub mod repository;
pub mod schema;
pub mod traits;
pub mod types;

mod client;

// Re-export main types for convenient access
pub use clauses::Condition;
pub use client::PgRepoClient;
pub use error::{PgRepoError, Result};
pub use repository::Repository;
pub use schema::{Column, Table, TableRegistry};
pub use traits::{DatabaseDriver, Entity, EntityType, Field, FieldKind, Relation};
pub use types::{FromSqlValue, NamedParams, RawQueryResult, Row, SqlValue};
