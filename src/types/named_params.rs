use crate::types::SqlValue;

/// Values for one row of a named-parameter statement, looked up by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedParams {
    values: Vec<(String, SqlValue)>,
}

impl NamedParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value bound to `:name`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        self.values.push((name.into(), value.into()));
    }

    /// Returns the value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
