//! Sqlite-backed history store for clipd.
//!
//! The database file is the sole shared mutable state between the daemon and
//! short-lived CLI invocations; all mutations run inside an immediate
//! transaction so dedup-check-then-insert and capacity eviction stay atomic
//! across processes.

pub mod image_cache;
pub mod models;
pub mod pool;
pub mod schema;
pub mod store;

pub use image_cache::ImageCache;
pub use pool::{init_db_pool, DbPool};
pub use store::HistoryStore;
