//! Error types for the connection factory.
//!
//! All fallible operations return [`DbError`]. Driver-level failures carry a
//! [`DriverErrorKind`] tag so callers can decide how to react by matching on
//! the kind instead of inspecting messages.

use thiserror::Error;

/// Remediation hint attached when the server version cannot be detected.
pub const SERVER_VERSION_HINT: &str = "An exception occurred while establishing a connection to figure out your platform version. \
You can circumvent this by setting a 'server_version' configuration value";

/// Classification of driver-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// Socket-level failure (refused, reset, unreachable host).
    Io,
    Tls,
    Protocol,
    /// Error reported by the database server itself.
    Database,
    PoolTimedOut,
    PoolClosed,
}

impl std::fmt::Display for DriverErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Io => "io",
            Self::Tls => "tls",
            Self::Protocol => "protocol",
            Self::Database => "database",
            Self::PoolTimedOut => "pool timed out",
            Self::PoolClosed => "pool closed",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Driver error ({kind}): {message}")]
    Driver {
        kind: DriverErrorKind,
        message: String,
    },

    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<Box<DbError>>,
    },

    #[error("Unknown logical type '{name}'")]
    TypeNotFound { name: String },

    #[error("Logical type '{name}' is already registered")]
    TypeExists { name: String },

    #[error("No type handler '{handler}' is available for type '{name}'")]
    UnknownHandler { name: String, handler: String },

    #[error("Unknown database type '{db_type}' requested for {platform}")]
    UnknownColumnType { db_type: String, platform: String },

    #[error("Could not convert value to '{type_name}': {message}")]
    Conversion { type_name: String, message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a driver-level error.
    pub fn driver(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self::Driver {
            kind,
            message: message.into(),
        }
    }

    /// Create a configuration error, optionally wrapping the error that caused it.
    pub fn configuration(message: impl Into<String>, source: Option<DbError>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: source.map(Box::new),
        }
    }

    /// Wrap a failed server version query with the remediation hint.
    pub fn server_version_unknown(source: DbError) -> Self {
        Self::configuration(SERVER_VERSION_HINT, Some(source))
    }

    pub fn type_not_found(name: impl Into<String>) -> Self {
        Self::TypeNotFound { name: name.into() }
    }

    pub fn type_exists(name: impl Into<String>) -> Self {
        Self::TypeExists { name: name.into() }
    }

    pub fn unknown_handler(name: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::UnknownHandler {
            name: name.into(),
            handler: handler.into(),
        }
    }

    pub fn unknown_column_type(db_type: impl Into<String>, platform: impl Into<String>) -> Self {
        Self::UnknownColumnType {
            db_type: db_type.into(),
            platform: platform.into(),
        }
    }

    /// Create a value conversion error.
    pub fn conversion(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check whether this error originated in the database driver.
    pub fn is_driver_error(&self) -> bool {
        matches!(self, Self::Driver { .. })
    }

    /// Driver error kind, if this is a driver-level error.
    pub fn driver_kind(&self) -> Option<DriverErrorKind> {
        match self {
            Self::Driver { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Configuration { source: Some(_), .. } => {
                Some("Set 'server_version' in the connection parameters")
            }
            Self::Driver {
                kind: DriverErrorKind::Io | DriverErrorKind::PoolTimedOut,
                ..
            } => Some("Check network connectivity and database server status"),
            Self::Driver {
                kind: DriverErrorKind::Tls,
                ..
            } => Some("Verify TLS configuration and certificates"),
            Self::TypeNotFound { .. } | Self::UnknownHandler { .. } => {
                Some("Register the type in the types configuration before mapping it")
            }
            _ => None,
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => {
                DbError::invalid_input(format!("Invalid connection options: {}", msg))
            }
            sqlx::Error::Database(db_err) => {
                let message = match db_err.code() {
                    Some(code) => format!("{} (SQLSTATE: {})", db_err.message(), code),
                    None => db_err.message().to_string(),
                };
                DbError::driver(DriverErrorKind::Database, message)
            }
            sqlx::Error::Io(io_err) => {
                DbError::driver(DriverErrorKind::Io, format!("I/O error: {}", io_err))
            }
            sqlx::Error::Tls(tls_err) => {
                DbError::driver(DriverErrorKind::Tls, format!("TLS error: {}", tls_err))
            }
            sqlx::Error::Protocol(msg) => {
                DbError::driver(DriverErrorKind::Protocol, format!("Protocol error: {}", msg))
            }
            sqlx::Error::PoolTimedOut => DbError::driver(
                DriverErrorKind::PoolTimedOut,
                "Timed out acquiring a connection from the pool",
            ),
            sqlx::Error::PoolClosed => {
                DbError::driver(DriverErrorKind::PoolClosed, "Connection pool is closed")
            }
            sqlx::Error::RowNotFound => DbError::internal("No rows returned"),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
