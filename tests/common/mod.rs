#![allow(dead_code)]

use chrono::{DateTime, Utc};
use pgrepo::{Entity, Field, Result, Row, SqlValue};
use uuid::Uuid;

pub const USER_COLUMNS: [&str; 4] = ["id", "username", "logins", "last_seen"];

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub logins: i32,
    pub last_seen: Option<DateTime<Utc>>,
    pub session_token: Option<String>,
}

impl User {
    pub fn new(username: &str, logins: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            logins,
            last_seen: None,
            session_token: None,
        }
    }

    /// The row the database would return for this user.
    pub fn row(&self) -> Vec<SqlValue> {
        vec![
            self.id.into(),
            self.username.as_str().into(),
            self.logins.into(),
            self.last_seen.into(),
        ]
    }
}

impl Entity for User {
    const NAME: &'static str = "User";

    fn fields() -> Vec<Field> {
        vec![
            Field::new("id", "id").primary_key(),
            Field::new("username", "username"),
            Field::new("logins", "logins"),
            Field::new("last_seen", "last_seen"),
            Field::transient("session_token"),
        ]
    }

    fn bind(&self, column: &str) -> Option<SqlValue> {
        match column {
            "id" => Some(self.id.into()),
            "username" => Some(self.username.as_str().into()),
            "logins" => Some(self.logins.into()),
            "last_seen" => Some(self.last_seen.into()),
            _ => None,
        }
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            logins: row.get("logins")?,
            last_seen: row.get("last_seen")?,
            session_token: None,
        })
    }
}

/// A login session referencing the user it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: i64,
    pub user: Option<User>,
}

impl Entity for Session {
    const NAME: &'static str = "Session";

    fn fields() -> Vec<Field> {
        vec![
            Field::new("id", "id").primary_key(),
            Field::new("user", "user_id")
                .foreign_key("app_user", "id")
                .optional_entity::<User>(),
        ]
    }

    fn bind(&self, column: &str) -> Option<SqlValue> {
        match column {
            "id" => Some(self.id.into()),
            "user_id" => Some(self.user.as_ref().map(|u| u.id).into()),
            _ => None,
        }
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user: None,
        })
    }
}

pub fn sample_users() -> Vec<User> {
    vec![User::new("A", 18), User::new("B", 25), User::new("C", 40)]
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
