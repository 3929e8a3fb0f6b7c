//! Expansion of `:name` insert templates into positional multi-row statements.

use crate::error::{PgRepoError, Result};
use crate::types::{NamedParams, SqlValue};

const VALUES: &str = " VALUES ";

/// Expands `INSERT ... VALUES (:a, :b)` for every row into
/// `INSERT ... VALUES ($1, $2), ($3, $4), ...` plus the flattened values.
///
/// Each `:name` is looked up by name in the row. `::` casts are left alone.
pub fn expand(template: &str, rows: &[NamedParams]) -> Result<(String, Vec<SqlValue>)> {
    if rows.is_empty() {
        return Err(PgRepoError::InvalidQuery(
            "named statement needs at least one row".to_string(),
        ));
    }

    let split = template
        .rfind(VALUES)
        .ok_or_else(|| PgRepoError::InvalidQuery(format!("no VALUES tuple in: {}", template)))?;
    let (head, tuple) = (&template[..split], &template[split + VALUES.len()..]);

    let mut sql = String::with_capacity(template.len() * rows.len());
    sql.push_str(head);
    sql.push_str(VALUES);

    let mut params = Vec::with_capacity(rows.len() * rows[0].len());
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        bind_tuple(tuple, row, &mut sql, &mut params)?;
    }

    Ok((sql, params))
}

fn bind_tuple(
    tuple: &str,
    row: &NamedParams,
    sql: &mut String,
    params: &mut Vec<SqlValue>,
) -> Result<()> {
    let bytes = tuple.as_bytes();
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b':' {
            i += 1;
            continue;
        }

        if bytes.get(i + 1) == Some(&b':') {
            i += 2;
            continue;
        }

        let start = i + 1;
        let mut end = start;
        while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
            end += 1;
        }

        if end == start {
            i += 1;
            continue;
        }

        let name = &tuple[start..end];
        let value = row
            .get(name)
            .ok_or_else(|| PgRepoError::MissingParameter(name.to_string()))?;
        params.push(value.clone());

        sql.push_str(&tuple[copied..i]);
        sql.push('$');
        sql.push_str(&params.len().to_string());
        copied = end;
        i = end;
    }

    sql.push_str(&tuple[copied..]);
    Ok(())
}
