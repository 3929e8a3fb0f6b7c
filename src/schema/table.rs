use std::sync::{Arc, OnceLock, Weak};

use crate::error::{PgRepoError, Result};
use crate::traits::{EntityType, FieldKind, Relation};

/// Cache cell holding a compiled table. Empty while the table is being compiled.
pub(crate) type TableSlot = OnceLock<Arc<Table>>;

/// Mapping between one entity field and one table column.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub source_field: String,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub foreign_column_name: Option<String>,
    foreign_table: Option<ForeignTable>,
}

#[derive(Debug, Clone)]
struct ForeignTable {
    name: String,
    slot: Weak<TableSlot>,
}

impl Column {
    fn new(name: &str, source_field: &str) -> Self {
        Self {
            name: name.to_string(),
            source_field: source_field.to_string(),
            is_primary_key: false,
            is_foreign_key: false,
            foreign_column_name: None,
            foreign_table: None,
        }
    }

    /// Name of the referenced table, for foreign keys.
    pub fn foreign_table_name(&self) -> Option<&str> {
        self.foreign_table.as_ref().map(|t| t.name.as_str())
    }

    /// Compiled metadata of the referenced table.
    ///
    /// Returns `None` for plain columns, and when the registry that compiled
    /// the table has been dropped.
    pub fn foreign_table(&self) -> Option<Arc<Table>> {
        self.foreign_table
            .as_ref()
            .and_then(|t| t.slot.upgrade())
            .and_then(|slot| slot.get().cloned())
    }
}

/// Compiled persistence mapping of one entity type, with its base statements.
#[derive(Debug)]
pub struct Table {
    schema_name: String,
    table_name: String,
    primary_key: Option<usize>,
    columns: Vec<Column>,
    insert: String,
    select: String,
    update_prefix: String,
    delete_prefix: String,
}

impl Table {
    fn new(schema: &str, name: &str, primary_key: Option<usize>, columns: Vec<Column>) -> Self {
        let qualified = format!("{}.{}", schema, name);
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let placeholders: Vec<String> = names.iter().map(|n| format!(":{}", n)).collect();

        Self {
            insert: format!(
                "INSERT INTO {} ({}) VALUES ({})",
                qualified,
                names.join(", "),
                placeholders.join(", ")
            ),
            select: format!("SELECT {} FROM {}", names.join(", "), qualified),
            update_prefix: format!("UPDATE {} SET ", qualified),
            delete_prefix: format!("DELETE FROM {}", qualified),
            schema_name: schema.to_string(),
            table_name: name.to_string(),
            primary_key,
            columns,
        }
    }

    /// Walks the declared fields of `entity` and renders its statements.
    ///
    /// `resolve` returns the cache slot for a referenced entity, compiling
    /// it first when needed.
    pub(crate) fn compile(
        entity: EntityType,
        schema: &str,
        name: &str,
        resolve: &mut dyn FnMut(EntityType, &str) -> Result<Arc<TableSlot>>,
    ) -> Result<Self> {
        let mut columns: Vec<Column> = Vec::new();
        let mut primary_key: Option<usize> = None;

        for field in entity.fields() {
            if !field.is_persisted() {
                continue;
            }

            let mut column = Column::new(field.column, field.name);

            match field.relation {
                Relation::None => {}
                Relation::PrimaryKey => {
                    if let Some(existing) = primary_key {
                        return Err(PgRepoError::Schema(format!(
                            "multiple primary keys for {}: {}, {}",
                            entity.name(),
                            columns[existing].name,
                            field.column
                        )));
                    }
                    column.is_primary_key = true;
                    primary_key = Some(columns.len());
                }
                Relation::ForeignKey {
                    table,
                    column: target_column,
                } => {
                    if table.is_empty() {
                        return Err(PgRepoError::Schema(format!(
                            "foreign key {}.{} has no target table",
                            entity.name(),
                            field.name
                        )));
                    }
                    if target_column.is_empty() {
                        return Err(PgRepoError::Schema(format!(
                            "foreign key {}.{} has no target column",
                            entity.name(),
                            field.name
                        )));
                    }

                    let target = match field.kind {
                        FieldKind::Entity {
                            optional: true,
                            target,
                        } => target,
                        _ => {
                            return Err(PgRepoError::Schema(format!(
                                "foreign key {}.{} must hold an optional entity",
                                entity.name(),
                                field.name
                            )))
                        }
                    };

                    let slot = resolve(target, table)?;
                    column.is_foreign_key = true;
                    column.foreign_column_name = Some(target_column.to_string());
                    column.foreign_table = Some(ForeignTable {
                        name: table.to_string(),
                        slot: Arc::downgrade(&slot),
                    });
                }
            }

            columns.push(column);
        }

        Ok(Self::new(schema, name, primary_key, columns))
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// `schema.table`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema_name, self.table_name)
    }

    pub fn primary_key(&self) -> Option<&Column> {
        self.primary_key.map(|i| &self.columns[i])
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// `INSERT INTO schema.table (c1, ...) VALUES (:c1, ...)`
    pub fn insert_template(&self) -> &str {
        &self.insert
    }

    /// `SELECT c1, ... FROM schema.table`
    pub fn select_template(&self) -> &str {
        &self.select
    }

    /// `UPDATE schema.table SET `
    pub fn update_prefix(&self) -> &str {
        &self.update_prefix
    }

    /// `DELETE FROM schema.table`
    pub fn delete_prefix(&self) -> &str {
        &self.delete_prefix
    }
}
