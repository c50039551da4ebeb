pub mod affiliate_repository;
pub mod category_repository;
pub mod connection;
pub mod job_repository;
#[cfg(test)]
pub mod memory;
pub mod migrations;
pub mod models;
pub mod store;

pub use store::{EntityStore, PgStore};
