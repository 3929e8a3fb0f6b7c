use std::error::Error as StdError;

use async_trait::async_trait;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDateTime, Utc};
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use tokio_postgres::{Client, NoTls};
use tracing::warn;
use uuid::Uuid;

use crate::drivers::named;
use crate::error::{PgRepoError, Result};
use crate::traits::DatabaseDriver;
use crate::types::{NamedParams, RawQueryResult, SqlValue};

/// PostgreSQL driver implementation using tokio-postgres.
pub struct TokioPostgresDriver {
    client: Client,
}

impl TokioPostgresDriver {
    /// Connect to a PostgreSQL database.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
            .await
            .map_err(|e| PgRepoError::ConnectionFailed(e.to_string()))?;

        // Spawn the connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(Self { client })
    }
}

#[async_trait]
impl DatabaseDriver for TokioPostgresDriver {
    async fn ping(&self) -> Result<()> {
        if self.client.is_closed() {
            return Err(PgRepoError::ConnectionFailed(
                "connection is closed".to_string(),
            ));
        }

        self.client
            .simple_query("SELECT 1")
            .await
            .map(|_| ())
            .map_err(|e| PgRepoError::ConnectionFailed(e.to_string()))
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<RawQueryResult> {
        let rows = self
            .client
            .query(sql, &param_refs(params))
            .await
            .map_err(query_failed)?;

        // Extract column names
        let columns: Vec<String> = match rows.first() {
            Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
            None => Vec::new(),
        };

        let result_rows = rows
            .iter()
            .map(|row| {
                row.columns()
                    .iter()
                    .enumerate()
                    .map(|(i, col)| row_value(row, i, col.type_()))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RawQueryResult::new(columns, result_rows))
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        self.client
            .execute(sql, &param_refs(params))
            .await
            .map_err(query_failed)
    }

    async fn execute_named(&self, template: &str, rows: &[NamedParams]) -> Result<u64> {
        let (sql, params) = named::expand(template, rows)?;
        self.execute(&sql, &params).await
    }
}

/// Keep the server's SQLSTATE and message when the database rejected the statement.
fn query_failed(e: tokio_postgres::Error) -> PgRepoError {
    match e.as_db_error() {
        Some(db) => PgRepoError::QueryFailed(format!("{}: {}", db.code().code(), db.message())),
        None => PgRepoError::QueryFailed(e.to_string()),
    }
}

fn param_refs(params: &[SqlValue]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

/// Decode the value at `index` according to its PostgreSQL type.
fn row_value(row: &tokio_postgres::Row, index: usize, type_: &Type) -> Result<SqlValue> {
    let value = match *type_ {
        Type::BOOL => row.try_get::<_, Option<bool>>(index).map(SqlValue::from),
        Type::INT2 => row.try_get::<_, Option<i16>>(index).map(SqlValue::from),
        Type::INT4 => row.try_get::<_, Option<i32>>(index).map(SqlValue::from),
        Type::INT8 => row.try_get::<_, Option<i64>>(index).map(SqlValue::from),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(index).map(SqlValue::from),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(index).map(SqlValue::from),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            row.try_get::<_, Option<String>>(index).map(SqlValue::from)
        }
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(index).map(SqlValue::from),
        Type::UUID => row.try_get::<_, Option<Uuid>>(index).map(SqlValue::from),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(index)
            .map(SqlValue::from),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(index)
            .map(SqlValue::from),
        _ => {
            return Err(PgRepoError::TypeMismatch {
                column: row.columns()[index].name().to_string(),
                expected: "a supported column type",
                found: type_.name().to_string(),
            })
        }
    };

    value.map_err(query_failed)
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> std::result::Result<IsNull, Box<dyn StdError + Sync + Send>> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Text(s) => match *ty {
                Type::UUID => Uuid::parse_str(s)?.to_sql_checked(ty, out),
                _ => s.to_sql_checked(ty, out),
            },
            SqlValue::Int32(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql_checked(ty, out),
                Type::INT8 => i64::from(*i).to_sql_checked(ty, out),
                _ => i.to_sql_checked(ty, out),
            },
            SqlValue::Int64(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql_checked(ty, out),
                _ => i.to_sql_checked(ty, out),
            },
            SqlValue::Float64(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql_checked(ty, out),
                _ => f.to_sql_checked(ty, out),
            },
            SqlValue::Bool(b) => b.to_sql_checked(ty, out),
            SqlValue::Bytes(b) => b.to_sql_checked(ty, out),
            SqlValue::Uuid(u) => u.to_sql_checked(ty, out),
            SqlValue::Timestamp(t) => t.to_sql_checked(ty, out),
            SqlValue::TimestampTz(t) => t.to_sql_checked(ty, out),
        }
    }

    // Each variant delegates to the checked conversion of its native type.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}
