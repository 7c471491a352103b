//! Database layer: pool, schema, and the entry repository

pub mod entries;
pub mod migrations;
pub mod pool;

pub use entries::{DbError, EntryRepo};
pub use pool::{create_memory_pool, create_pool};
