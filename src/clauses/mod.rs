mod condition;
pub mod placeholders;

pub use condition::{
    all, and, eq, greater, greater_eq, less, less_eq, not_eq, or, ComparisonOp, Condition,
    LogicalOp,
};
