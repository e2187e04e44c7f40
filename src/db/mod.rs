//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Database-specific connection pools and server version queries
//! - Database dispatch macros for reducing code duplication
//! - Connection lifecycle event hooks
//! - The driver manager seam and its sqlx-backed connection

pub mod connection;
pub mod driver;
pub mod events;
#[macro_use]
pub mod macros;
pub mod pool;

pub use connection::Connection;
pub use driver::{DriverManager, PlatformSource, SqlxDriverManager};
pub use events::{ConnectEvent, ConnectListener, EventHooks};
pub use pool::{DbPool, create_pool};
