pub mod postgres;
pub mod repo;
pub mod schema;
