pub mod manager;
pub mod models;
pub mod query_builder;
pub mod repository;
pub mod schema;

pub use manager::{DatabaseError, Store};
pub use repository::{Entity, Fields, Repository};
