mod registry;
mod table;

pub use registry::TableRegistry;
pub use table::{Column, Table};
