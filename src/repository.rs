use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, info};

use crate::clauses::{placeholders, Condition};
use crate::error::{PgRepoError, Result};
use crate::schema::{Table, TableRegistry};
use crate::traits::{DatabaseDriver, Entity};
use crate::types::{NamedParams, SqlValue};

/// CRUD access to the table holding entities of type `T`.
///
/// Statements are assembled from the table's pre-rendered templates and the
/// rendered [`Condition`]; every operand travels as a bound parameter.
pub struct Repository<T: Entity> {
    driver: Arc<dyn DatabaseDriver>,
    table: Arc<Table>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Repository<T> {
    /// Create a repository for `schema.table`.
    ///
    /// Fails with `ConnectionFailed` when the driver's liveness probe fails,
    /// and with `Schema` when `T` declares an invalid mapping.
    pub async fn new(
        driver: Arc<dyn DatabaseDriver>,
        registry: &TableRegistry,
        schema: &str,
        table: &str,
    ) -> Result<Self> {
        info!("creating Repository[{}]", T::NAME);

        driver.ping().await.map_err(|e| {
            PgRepoError::ConnectionFailed(format!(
                "invalid connection supplied to Repository[{}]: {}",
                T::NAME,
                e
            ))
        })?;

        info!("verified Repository[{}] connection", T::NAME);

        let table = registry.table_for::<T>(schema, table)?;

        Ok(Self {
            driver,
            table,
            _entity: PhantomData,
        })
    }

    /// Compiled metadata of the backing table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Insert all `entities` in a single statement.
    pub async fn create(&self, entities: &[T]) -> Result<()> {
        if entities.is_empty() {
            return Ok(());
        }

        let rows = entities
            .iter()
            .map(|entity| self.bind(entity))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "executing: {} for {} {}(s)",
            self.table.insert_template(),
            rows.len(),
            T::NAME
        );

        self.driver
            .execute_named(self.table.insert_template(), &rows)
            .await?;
        Ok(())
    }

    /// Read entities matching `filter`. A `limit` of 0 reads every match.
    ///
    /// A row that fails to decode fails the whole read.
    pub async fn read(&self, filter: &Condition, limit: u64) -> Result<Vec<T>> {
        let (sql, params) = self.build_read(filter, limit);
        debug!("executing: {}", sql);

        let result = self.driver.query(&sql, &params).await?;
        result
            .into_rows()
            .iter()
            .map(T::from_row)
            .collect()
    }

    /// Set `assignments` on every row matching `filter`.
    pub async fn update<I, K, V>(&self, assignments: I, filter: &Condition) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        let assignments: Vec<(String, SqlValue)> = assignments
            .into_iter()
            .map(|(column, value)| (column.into(), value.into()))
            .collect();

        let (sql, params) = self.build_update(&assignments, filter)?;
        debug!("executing: {}", sql);

        self.driver.execute(&sql, &params).await?;
        Ok(())
    }

    /// Delete every row matching `filter`. `Condition::All` empties the table.
    pub async fn delete(&self, filter: &Condition) -> Result<()> {
        let (sql, params) = self.build_delete(filter);
        debug!("executing: {}", sql);

        self.driver.execute(&sql, &params).await?;
        Ok(())
    }

    fn bind(&self, entity: &T) -> Result<NamedParams> {
        let mut params = NamedParams::new();
        for column in self.table.columns() {
            let value = entity.bind(&column.name).ok_or_else(|| {
                PgRepoError::MissingParameter(format!("{}.{}", T::NAME, column.name))
            })?;
            params.push(column.name.as_str(), value);
        }
        Ok(params)
    }

    fn build_read(&self, filter: &Condition, limit: u64) -> (String, Vec<SqlValue>) {
        let mut sql = String::from(self.table.select_template());
        let (fragment, params) = filter.build();

        if !fragment.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&fragment);
        }

        if limit > 0 {
            sql.push_str(" LIMIT ");
            sql.push_str(&limit.to_string());
        }

        (sql, params)
    }

    fn build_update(
        &self,
        assignments: &[(String, SqlValue)],
        filter: &Condition,
    ) -> Result<(String, Vec<SqlValue>)> {
        if assignments.is_empty() {
            return Err(PgRepoError::InvalidQuery(format!(
                "update of {} needs at least one assignment",
                self.table.qualified_name()
            )));
        }

        let set = assignments
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ${}", column, i + 1))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("{}{}", self.table.update_prefix(), set);
        let mut params: Vec<SqlValue> = assignments.iter().map(|(_, v)| v.clone()).collect();

        let (fragment, filter_params) = filter.build();
        if !fragment.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&fragment);
            sql = placeholders::renumber(&sql);
            params.extend(filter_params);
        }

        Ok((sql, params))
    }

    fn build_delete(&self, filter: &Condition) -> (String, Vec<SqlValue>) {
        let mut sql = String::from(self.table.delete_prefix());
        let (fragment, params) = filter.build();

        if !fragment.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&fragment);
            sql = placeholders::renumber(&sql);
        }

        (sql, params)
    }
}

impl<T: Entity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            table: Arc::clone(&self.table),
            _entity: PhantomData,
        }
    }
}
