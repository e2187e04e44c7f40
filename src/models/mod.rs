//! Data models for the connection factory.

pub mod connection;

pub use connection::{Configuration, ConnectionParams, DatabaseType};
