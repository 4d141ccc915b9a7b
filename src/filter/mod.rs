pub mod types;
pub mod filter;
pub mod filter_where;
pub mod filter_order;
pub mod fields;
pub mod error;

pub use types::*;
pub use filter::Filter;
pub use fields::{column_for_field, Projection};
