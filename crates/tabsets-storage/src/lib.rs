//! Tabsets Storage Layer
//!
//! A single string slot per key is all the tabset manager needs.
//! `Database` keeps those slots in SQLite; `MemoryStore` keeps them in memory.

mod database;
mod error;
mod migrations;
mod store;

pub use database::Database;
pub use error::StorageError;
pub use store::{KeyValueStore, MemoryStore};

pub type Result<T> = std::result::Result<T, StorageError>;
