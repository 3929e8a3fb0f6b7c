mod named_params;
mod row;
mod sql_value;

pub use named_params::NamedParams;
pub use row::{RawQueryResult, Row};
pub use sql_value::{FromSqlValue, SqlValue};
