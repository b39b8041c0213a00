//! Key-value store backends and the shared connection

mod connection;
mod factory;
mod in_memory;
mod redis;

pub use connection::{ConnectionManager, StoreConnector};
pub use factory::{StoreConfig, StoreFactory, StoreType};
pub use in_memory::{InMemoryConnector, InMemoryStore};
pub use redis::{RedisConnector, RedisStore, RedisStoreConfig};

#[cfg(test)]
pub use connection::mock::MockConnector;
