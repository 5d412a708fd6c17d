//! SQLite backend for laneboard client storage.
//!
//! Clients live in a single `clients` table keyed by id. All writes that
//! touch priorities run inside one transaction so lanes stay densely ranked
//! for every reader.

pub mod config;
pub mod error;
pub mod store;

pub use config::BoardConfig;
pub use error::{Result, StoreError};
pub use store::{ClientStore, SqlLanes};
