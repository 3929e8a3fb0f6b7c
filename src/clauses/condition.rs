use std::fmt;

use crate::clauses::placeholders;
use crate::types::SqlValue;

/// Comparison operators supported in a [`Condition::Comparison`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

impl ComparisonOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::NotEq => "<>",
            ComparisonOp::Less => "<",
            ComparisonOp::LessEq => "<=",
            ComparisonOp::Greater => ">",
            ComparisonOp::GreaterEq => ">=",
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A filter expression rendered into a WHERE clause.
///
/// Operands are never written into the SQL text; they are returned as bound
/// values next to `$n` placeholders. Column names are not checked here; an
/// unknown column fails when the statement reaches the database.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// column <op> value
    Comparison {
        op: ComparisonOp,
        column: String,
        operand: SqlValue,
    },
    /// (left) <op> (right)
    Logical {
        op: LogicalOp,
        left: Box<Condition>,
        right: Box<Condition>,
    },
    /// Matches every row. Renders to an empty fragment.
    All,
}

impl Condition {
    fn comparison(
        op: ComparisonOp,
        column: impl Into<String>,
        operand: impl Into<SqlValue>,
    ) -> Self {
        Condition::Comparison {
            op,
            column: column.into(),
            operand: operand.into(),
        }
    }

    fn logical(op: LogicalOp, left: Condition, right: Condition) -> Self {
        Condition::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Creates an equality condition: column = value
    pub fn eq(column: impl Into<String>, operand: impl Into<SqlValue>) -> Self {
        Self::comparison(ComparisonOp::Eq, column, operand)
    }

    /// column <> value
    pub fn not_eq(column: impl Into<String>, operand: impl Into<SqlValue>) -> Self {
        Self::comparison(ComparisonOp::NotEq, column, operand)
    }

    /// column < value
    pub fn less(column: impl Into<String>, operand: impl Into<SqlValue>) -> Self {
        Self::comparison(ComparisonOp::Less, column, operand)
    }

    /// column <= value
    pub fn less_eq(column: impl Into<String>, operand: impl Into<SqlValue>) -> Self {
        Self::comparison(ComparisonOp::LessEq, column, operand)
    }

    /// column > value
    pub fn greater(column: impl Into<String>, operand: impl Into<SqlValue>) -> Self {
        Self::comparison(ComparisonOp::Greater, column, operand)
    }

    /// column >= value
    pub fn greater_eq(column: impl Into<String>, operand: impl Into<SqlValue>) -> Self {
        Self::comparison(ComparisonOp::GreaterEq, column, operand)
    }

    /// Matches every row.
    pub fn all() -> Self {
        Condition::All
    }

    /// Combines this condition with another using AND
    pub fn and(self, other: Condition) -> Self {
        Self::logical(LogicalOp::And, self, other)
    }

    /// Combines this condition with another using OR
    pub fn or(self, other: Condition) -> Self {
        Self::logical(LogicalOp::Or, self, other)
    }

    /// Returns true when the condition renders no WHERE clause.
    pub fn is_all(&self) -> bool {
        match self {
            Condition::Comparison { .. } => false,
            Condition::Logical {
                op: LogicalOp::And,
                left,
                right,
            } => left.is_all() && right.is_all(),
            Condition::Logical {
                op: LogicalOp::Or,
                left,
                right,
            } => left.is_all() || right.is_all(),
            Condition::All => true,
        }
    }

    /// Renders the SQL fragment and the values bound to its placeholders.
    ///
    /// The fragment of every node is numbered from `$1`, so it can be
    /// embedded anywhere as long as the enclosing text is renumbered.
    pub fn build(&self) -> (String, Vec<SqlValue>) {
        match self {
            Condition::Comparison {
                op,
                column,
                operand,
            } => (format!("{} {} $1", column, op), vec![operand.clone()]),
            Condition::Logical { op, left, right } => {
                let (left_sql, mut params) = left.build();
                let (right_sql, right_params) = right.build();

                // An empty side matches every row and must not render as "()".
                match (*op, left_sql.is_empty(), right_sql.is_empty()) {
                    (LogicalOp::And, true, _) => return (right_sql, right_params),
                    (LogicalOp::And, false, true) => return (left_sql, params),
                    (LogicalOp::Or, true, _) | (LogicalOp::Or, _, true) => {
                        return (String::new(), Vec::new())
                    }
                    _ => {}
                }

                params.extend(right_params);

                let sql = format!("({}) {} ({})", left_sql, op, right_sql);
                (placeholders::renumber(&sql), params)
            }
            Condition::All => (String::new(), Vec::new()),
        }
    }
}

pub fn eq(column: impl Into<String>, operand: impl Into<SqlValue>) -> Condition {
    Condition::eq(column, operand)
}

pub fn not_eq(column: impl Into<String>, operand: impl Into<SqlValue>) -> Condition {
    Condition::not_eq(column, operand)
}

pub fn less(column: impl Into<String>, operand: impl Into<SqlValue>) -> Condition {
    Condition::less(column, operand)
}

pub fn less_eq(column: impl Into<String>, operand: impl Into<SqlValue>) -> Condition {
    Condition::less_eq(column, operand)
}

pub fn greater(column: impl Into<String>, operand: impl Into<SqlValue>) -> Condition {
    Condition::greater(column, operand)
}

pub fn greater_eq(column: impl Into<String>, operand: impl Into<SqlValue>) -> Condition {
    Condition::greater_eq(column, operand)
}

pub fn and(left: Condition, right: Condition) -> Condition {
    left.and(right)
}

pub fn or(left: Condition, right: Condition) -> Condition {
    left.or(right)
}

pub fn all() -> Condition {
    Condition::All
}
