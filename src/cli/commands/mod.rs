pub mod migrate;
pub mod setup;
