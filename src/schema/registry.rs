use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{PgRepoError, Result};
use crate::schema::table::{Table, TableSlot};
use crate::traits::{Entity, EntityType};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TableKey {
    entity: TypeId,
    schema: String,
    table: String,
}

impl TableKey {
    fn new(entity: EntityType, schema: &str, table: &str) -> Self {
        Self {
            entity: entity.id(),
            schema: schema.to_string(),
            table: table.to_string(),
        }
    }
}

/// Registry of compiled table metadata, shared by every repository built from it.
///
/// Each (entity type, schema, table) is compiled once; later lookups return
/// the same `Arc<Table>`.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: RwLock<HashMap<TableKey, Arc<TableSlot>>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compiled table for `T`, compiling it on first use.
    pub fn table_for<T: Entity>(&self, schema: &str, table: &str) -> Result<Arc<Table>> {
        self.resolve(EntityType::of::<T>(), schema, table)
    }

    pub fn resolve(&self, entity: EntityType, schema: &str, table: &str) -> Result<Arc<Table>> {
        let key = TableKey::new(entity, schema, table);

        if let Some(table) = self.cached(&key) {
            return Ok(table);
        }

        // Compilation runs entirely under the write lock, so concurrent
        // callers cannot compile the same type twice.
        let mut tables = self.tables.write();
        let mut reserved = Vec::new();

        match compile(&mut tables, &mut reserved, entity, key) {
            Ok(slot) => slot.get().cloned().ok_or_else(|| {
                PgRepoError::Schema(format!("table for {} was not compiled", entity.name()))
            }),
            Err(err) => {
                for key in reserved {
                    tables.remove(&key);
                }
                Err(err)
            }
        }
    }

    fn cached(&self, key: &TableKey) -> Option<Arc<Table>> {
        self.tables.read().get(key).and_then(|slot| slot.get().cloned())
    }

    /// Number of compiled tables.
    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }
}

fn compile(
    tables: &mut HashMap<TableKey, Arc<TableSlot>>,
    reserved: &mut Vec<TableKey>,
    entity: EntityType,
    key: TableKey,
) -> Result<Arc<TableSlot>> {
    // An empty slot means the type is being compiled further up the stack.
    if let Some(slot) = tables.get(&key) {
        return Ok(Arc::clone(slot));
    }

    debug!(
        entity = entity.name(),
        schema = %key.schema,
        table = %key.table,
        "compiling table metadata"
    );

    let slot = Arc::new(TableSlot::new());
    tables.insert(key.clone(), Arc::clone(&slot));
    reserved.push(key.clone());

    let mut resolve = |target: EntityType, table: &str| {
        let target_key = TableKey::new(target, &key.schema, table);
        compile(tables, reserved, target, target_key)
    };
    let compiled = Table::compile(entity, &key.schema, &key.table, &mut resolve)?;

    debug!(
        "found {} columns for entity type {}",
        compiled.columns().len(),
        entity.name()
    );

    let _ = slot.set(Arc::new(compiled));
    Ok(slot)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::traits::Field;
    use crate::types::{Row, SqlValue};

    macro_rules! entity {
        ($name:ident, [$($field:expr),* $(,)?]) => {
            struct $name;

            impl Entity for $name {
                const NAME: &'static str = stringify!($name);

                fn fields() -> Vec<Field> {
                    vec![$($field),*]
                }

                fn bind(&self, _column: &str) -> Option<SqlValue> {
                    None
                }

                fn from_row(_row: &Row) -> Result<Self> {
                    Ok($name)
                }
            }
        };
    }

    entity!(
        User,
        [
            Field::new("id", "id").primary_key(),
            Field::new("username", "username"),
            Field::transient("session"),
            Field::new("logins", "logins"),
        ]
    );

    entity!(
        Post,
        [
            Field::new("id", "id").primary_key(),
            Field::new("author", "author_id")
                .foreign_key("user", "id")
                .optional_entity::<User>(),
            Field::new("title", "title"),
        ]
    );

    entity!(
        TwoKeys,
        [
            Field::new("id", "id").primary_key(),
            Field::new("uuid", "uuid").primary_key(),
        ]
    );

    entity!(Empty, [Field::transient("scratch")]);

    entity!(
        MissingTable,
        [Field::new("owner", "owner_id")
            .foreign_key("", "id")
            .optional_entity::<User>()]
    );

    entity!(
        MissingColumn,
        [Field::new("owner", "owner_id")
            .foreign_key("user", "")
            .optional_entity::<User>()]
    );

    entity!(
        MandatoryReference,
        [Field::new("owner", "owner_id")
            .foreign_key("user", "id")
            .entity::<User>()]
    );

    entity!(
        ScalarReference,
        [Field::new("owner", "owner_id").foreign_key("user", "id")]
    );

    entity!(
        Employee,
        [
            Field::new("id", "id").primary_key(),
            Field::new("department", "department_id")
                .foreign_key("department", "id")
                .optional_entity::<Department>(),
        ]
    );

    entity!(
        Department,
        [
            Field::new("id", "id").primary_key(),
            Field::new("manager", "manager_id")
                .foreign_key("employee", "id")
                .optional_entity::<Employee>(),
        ]
    );

    entity!(
        BrokenParent,
        [
            Field::new("id", "id").primary_key(),
            Field::new("child", "child_id")
                .foreign_key("two_keys", "id")
                .optional_entity::<TwoKeys>(),
        ]
    );

    static COUNTED_REFLECTIONS: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl Entity for Counted {
        const NAME: &'static str = "Counted";

        fn fields() -> Vec<Field> {
            COUNTED_REFLECTIONS.fetch_add(1, Ordering::SeqCst);
            vec![Field::new("id", "id").primary_key()]
        }

        fn bind(&self, _column: &str) -> Option<SqlValue> {
            None
        }

        fn from_row(_row: &Row) -> Result<Self> {
            Ok(Counted)
        }
    }

    fn assert_schema_error<T: std::fmt::Debug>(result: Result<T>, fragment: &str) {
        match result {
            Err(PgRepoError::Schema(message)) => assert!(
                message.contains(fragment),
                "'{}' does not mention '{}'",
                message,
                fragment
            ),
            other => panic!("Expected Schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_compiles_columns_in_declaration_order() {
        let registry = TableRegistry::new();
        let table = registry.table_for::<User>("app", "user").unwrap();

        let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "username", "logins"]);
        assert_eq!(table.primary_key().unwrap().name, "id");
        assert_eq!(table.column("logins").unwrap().source_field, "logins");
        assert_eq!(table.qualified_name(), "app.user");
    }

    #[test]
    fn test_renders_templates() {
        let registry = TableRegistry::new();
        let table = registry.table_for::<User>("app", "user").unwrap();

        assert_eq!(
            table.insert_template(),
            "INSERT INTO app.user (id, username, logins) VALUES (:id, :username, :logins)"
        );
        assert_eq!(
            table.select_template(),
            "SELECT id, username, logins FROM app.user"
        );
        assert_eq!(table.update_prefix(), "UPDATE app.user SET ");
        assert_eq!(table.delete_prefix(), "DELETE FROM app.user");
    }

    #[test]
    fn test_table_without_columns() {
        let registry = TableRegistry::new();
        let table = registry.table_for::<Empty>("app", "empty").unwrap();

        assert!(table.columns().is_empty());
        assert!(table.primary_key().is_none());
        assert_eq!(table.insert_template(), "INSERT INTO app.empty () VALUES ()");
        assert_eq!(table.select_template(), "SELECT  FROM app.empty");
    }

    #[test]
    fn test_duplicate_primary_key_is_rejected() {
        let registry = TableRegistry::new();
        assert_schema_error(
            registry.table_for::<TwoKeys>("app", "two_keys"),
            "multiple primary keys for TwoKeys: id, uuid",
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_foreign_key_requires_target() {
        let registry = TableRegistry::new();
        assert_schema_error(
            registry.table_for::<MissingTable>("app", "t"),
            "no target table",
        );
        assert_schema_error(
            registry.table_for::<MissingColumn>("app", "t"),
            "no target column",
        );
    }

    #[test]
    fn test_foreign_key_requires_optional_entity() {
        let registry = TableRegistry::new();
        assert_schema_error(
            registry.table_for::<MandatoryReference>("app", "t"),
            "must hold an optional entity",
        );
        assert_schema_error(
            registry.table_for::<ScalarReference>("app", "t"),
            "must hold an optional entity",
        );
    }

    #[test]
    fn test_foreign_key_compiles_referenced_table() {
        let registry = TableRegistry::new();
        let post = registry.table_for::<Post>("app", "post").unwrap();

        let author = post.column("author_id").unwrap();
        assert!(author.is_foreign_key);
        assert!(!author.is_primary_key);
        assert_eq!(author.foreign_column_name.as_deref(), Some("id"));
        assert_eq!(author.foreign_table_name(), Some("user"));

        let user = registry.table_for::<User>("app", "user").unwrap();
        assert!(Arc::ptr_eq(&author.foreign_table().unwrap(), &user));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_mutual_foreign_keys_terminate() {
        let registry = TableRegistry::new();
        let employee = registry.table_for::<Employee>("hr", "employee").unwrap();
        let department = registry.table_for::<Department>("hr", "department").unwrap();

        let to_department = employee.column("department_id").unwrap();
        let to_employee = department.column("manager_id").unwrap();

        assert!(Arc::ptr_eq(&to_department.foreign_table().unwrap(), &department));
        assert!(Arc::ptr_eq(&to_employee.foreign_table().unwrap(), &employee));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_failed_compilation_releases_reserved_slots() {
        let registry = TableRegistry::new();
        assert_schema_error(
            registry.table_for::<BrokenParent>("app", "parent"),
            "multiple primary keys",
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_cached_table_is_shared() {
        let registry = TableRegistry::new();
        let first = registry.table_for::<Counted>("app", "counted").unwrap();
        let reflections = COUNTED_REFLECTIONS.load(Ordering::SeqCst);
        let second = registry.table_for::<Counted>("app", "counted").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(COUNTED_REFLECTIONS.load(Ordering::SeqCst), reflections);
    }

    #[test]
    fn test_registries_are_isolated() {
        let a = TableRegistry::new();
        let b = TableRegistry::new();
        let from_a = a.table_for::<User>("app", "user").unwrap();
        let from_b = b.table_for::<User>("app", "user").unwrap();

        assert!(!Arc::ptr_eq(&from_a, &from_b));
    }

    #[test]
    fn test_table_name_is_part_of_the_key() {
        let registry = TableRegistry::new();
        let live = registry.table_for::<User>("app", "user").unwrap();
        let archive = registry.table_for::<User>("archive", "user_2023").unwrap();

        assert_eq!(
            archive.select_template(),
            "SELECT id, username, logins FROM archive.user_2023"
        );
        assert!(!Arc::ptr_eq(&live, &archive));
    }

    #[test]
    fn test_concurrent_first_use_compiles_once() {
        let registry = Arc::new(TableRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.table_for::<Post>("app", "post").unwrap())
            })
            .collect();

        let tables: Vec<Arc<Table>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(tables.iter().all(|t| Arc::ptr_eq(t, &tables[0])));
        assert_eq!(registry.len(), 2);
    }
}
