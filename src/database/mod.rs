pub mod manager;
pub mod query_builder;
pub mod repository;
pub mod pagination;
pub mod models;

pub use manager::{DatabaseError, DatabaseManager};
pub use pagination::{Paged, PageQuery};
pub use repository::{Document, Repository};
