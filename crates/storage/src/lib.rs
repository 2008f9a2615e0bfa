//! Storage layer for radmin
//!
//! Durable key-value backends and the two persisted session stores built on them. The admin
//! and portal-user stores use separate keys and never touch each other's state.

mod backend;
mod error;
mod token_store;

pub use backend::{FileStore, KeyValueStore, MemoryStore, StorageBackend};
pub use error::StorageError;
pub use token_store::{AdminStore, PortalStore, StoreSnapshot, TokenStore};
