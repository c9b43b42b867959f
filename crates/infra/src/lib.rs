//! Infrastructure layer: record storage and configuration.

pub mod config;
pub mod store;

pub use config::{AdminBootstrap, AppConfig, ConfigError};
pub use store::{InMemoryRepository, PostgresRepository, Record, Repository, StoreError, Stores};
