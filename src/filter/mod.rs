pub mod types;
pub mod filter_where;

pub use filter_where::{FilterWhere, SqlParam};
pub use types::SessionFilter;
