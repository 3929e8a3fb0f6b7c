use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

/// Represents a SQL parameter value in a driver-agnostic way.
/// Drivers are responsible for converting these to their native types.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
}

impl SqlValue {
    /// Short name of the variant, used in decode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Text(_) => "text",
            SqlValue::Int32(_) => "int4",
            SqlValue::Int64(_) => "int8",
            SqlValue::Float64(_) => "float8",
            SqlValue::Bool(_) => "bool",
            SqlValue::Bytes(_) => "bytea",
            SqlValue::Uuid(_) => "uuid",
            SqlValue::Timestamp(_) => "timestamp",
            SqlValue::TimestampTz(_) => "timestamptz",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i16> for SqlValue {
    fn from(value: i16) -> Self {
        SqlValue::Int32(i32::from(value))
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int32(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int64(value)
    }
}

// PostgreSQL has no unsigned types; widen so the value always fits.
impl From<u32> for SqlValue {
    fn from(value: u32) -> Self {
        SqlValue::Int64(i64::from(value))
    }
}

impl From<f32> for SqlValue {
    fn from(value: f32) -> Self {
        SqlValue::Float64(f64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float64(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Bytes(value)
    }
}

impl From<&[u8]> for SqlValue {
    fn from(value: &[u8]) -> Self {
        SqlValue::Bytes(value.to_vec())
    }
}

impl From<Uuid> for SqlValue {
    fn from(value: Uuid) -> Self {
        SqlValue::Uuid(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::TimestampTz(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// Conversion from a decoded column value back into a Rust type.
pub trait FromSqlValue: Sized {
    /// Name of the accepted value kind, reported on mismatch.
    const EXPECTED: &'static str;

    /// Returns `None` when the value has an incompatible kind.
    fn from_sql_value(value: &SqlValue) -> Option<Self>;
}

impl FromSqlValue for String {
    const EXPECTED: &'static str = "text";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromSqlValue for i32 {
    const EXPECTED: &'static str = "int4";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Int32(i) => Some(*i),
            SqlValue::Int64(i) => i32::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl FromSqlValue for i64 {
    const EXPECTED: &'static str = "int8";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Int32(i) => Some(i64::from(*i)),
            SqlValue::Int64(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromSqlValue for f64 {
    const EXPECTED: &'static str = "float8";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Float64(f) => Some(*f),
            _ => None,
        }
    }
}

impl FromSqlValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromSqlValue for Vec<u8> {
    const EXPECTED: &'static str = "bytea";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Bytes(b) => Some(b.clone()),
            _ => None,
        }
    }
}

impl FromSqlValue for Uuid {
    const EXPECTED: &'static str = "uuid";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Uuid(u) => Some(*u),
            SqlValue::Text(s) => Uuid::parse_str(s).ok(),
            _ => None,
        }
    }
}

impl FromSqlValue for NaiveDateTime {
    const EXPECTED: &'static str = "timestamp";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl FromSqlValue for DateTime<Utc> {
    const EXPECTED: &'static str = "timestamptz";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::TimestampTz(t) => Some(*t),
            _ => None,
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        if value.is_null() {
            return Some(None);
        }
        T::from_sql_value(value).map(Some)
    }
}
