//! Typed Connection Factory Library
//!
//! This library creates SQL database connections (SQLite, PostgreSQL, MySQL)
//! with application-defined logical column types registered once and applied
//! to each connection's dialect platform.

pub mod config;
pub mod db;
pub mod error;
pub mod factory;
pub mod models;
pub mod platform;
pub mod types;

pub use config::Config;
pub use db::{Connection, EventHooks};
pub use error::{DbError, DbResult};
pub use factory::{ConnectionFactory, TypeConfig, TypesConfig};
pub use platform::Platform;
pub use types::{LogicalType, TypeRegistry};
