//! Configuration handling.
//!
//! Pool options parsed from connection URLs, and the CLI/environment
//! configuration of the `typed-conn-factory` binary.

use crate::error::{DbError, DbResult};
use crate::factory::TypesConfig;
use clap::Parser;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use url::Url;

// Pool configuration defaults
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_MAX_CONNECTIONS_SQLITE: u32 = 1;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 0;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Connection pool configuration options parsed from database URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PoolOptions {
    /// Maximum connections in pool (default: 10 for MySQL/PostgreSQL, 1 for SQLite)
    pub max_connections: Option<u32>,
    /// Minimum connections in pool (default: 0)
    pub min_connections: Option<u32>,
    /// Idle timeout in seconds (default: 600)
    pub idle_timeout_secs: Option<u64>,
    /// Connection acquire timeout in seconds (default: 30)
    pub acquire_timeout_secs: Option<u64>,
    /// Whether to test connections before use (default: true)
    pub test_before_acquire: Option<bool>,
}

impl PoolOptions {
    /// Get max_connections with default value based on database type.
    pub fn max_connections_or_default(&self, is_sqlite: bool) -> u32 {
        self.max_connections.unwrap_or(if is_sqlite {
            DEFAULT_MAX_CONNECTIONS_SQLITE
        } else {
            DEFAULT_MAX_CONNECTIONS
        })
    }

    /// Get min_connections with default value.
    pub fn min_connections_or_default(&self) -> u32 {
        self.min_connections.unwrap_or(DEFAULT_MIN_CONNECTIONS)
    }

    /// Get idle_timeout with default value.
    pub fn idle_timeout_or_default(&self) -> u64 {
        self.idle_timeout_secs.unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS)
    }

    /// Get acquire_timeout with default value.
    pub fn acquire_timeout_or_default(&self) -> u64 {
        self.acquire_timeout_secs
            .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS)
    }

    /// Get test_before_acquire with default value.
    pub fn test_before_acquire_or_default(&self) -> bool {
        self.test_before_acquire.unwrap_or(true)
    }

    /// Validate pool options and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(max) = self.max_connections {
            if max == 0 {
                return Err("max_connections must be greater than 0".to_string());
            }
            if let Some(min) = self.min_connections {
                if min > max {
                    return Err(format!(
                        "min_connections ({}) cannot exceed max_connections ({})",
                        min, max
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Parse pool options from extracted URL query parameters.
pub(crate) fn parse_pool_options(opts: &mut HashMap<String, String>) -> PoolOptions {
    PoolOptions {
        max_connections: opts.remove("max_connections").and_then(|v| v.parse().ok()),
        min_connections: opts.remove("min_connections").and_then(|v| v.parse().ok()),
        idle_timeout_secs: opts.remove("idle_timeout").and_then(|v| v.parse().ok()),
        acquire_timeout_secs: opts.remove("acquire_timeout").and_then(|v| v.parse().ok()),
        test_before_acquire: opts.remove("test_before_acquire").and_then(|v| {
            if v.eq_ignore_ascii_case("true") {
                Some(true)
            } else if v.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                None // Invalid value ignored
            }
        }),
    }
}

/// Extract factory options from URL query params, keeping others for the driver.
/// Uses proper URL encoding to preserve special characters in remaining params.
pub(crate) fn extract_options(url: &mut Url, keys: &[&str]) -> HashMap<String, String> {
    let mut opts = HashMap::new();
    let remaining: Vec<(String, String)> = url
        .query_pairs()
        .filter_map(|(k, v)| {
            let key_lower = k.to_ascii_lowercase();
            if keys.contains(&key_lower.as_str()) {
                opts.insert(key_lower, v.into_owned());
                None
            } else {
                Some((k.into_owned(), v.into_owned()))
            }
        })
        .collect();

    if remaining.is_empty() {
        url.set_query(None);
    } else {
        // Use query_pairs_mut for proper URL encoding
        url.query_pairs_mut().clear().extend_pairs(remaining);
    }
    opts
}

/// Load the logical types configuration from a JSON file.
///
/// ```text
/// {
///     "money": { "class": "decimal", "commented": true },
///     "payload": { "class": "json" }
/// }
/// ```
pub fn load_types_config(path: &Path) -> DbResult<TypesConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DbError::configuration(
            format!("Cannot read types config '{}': {}", path.display(), e),
            None,
        )
    })?;
    serde_json::from_str(&content).map_err(|e| {
        DbError::configuration(
            format!("Invalid types config '{}': {}", path.display(), e),
            None,
        )
    })
}

/// Parse `db_type=logical_type` pairs into a mapping table.
pub fn parse_mapping_types(pairs: &[String]) -> Result<BTreeMap<String, String>, String> {
    pairs
        .iter()
        .map(|pair| {
            let (db_type, logical) = pair
                .split_once('=')
                .ok_or_else(|| format!("Invalid mapping '{}': expected db_type=logical_type", pair))?;
            let (db_type, logical) = (db_type.trim(), logical.trim());
            if db_type.is_empty() || logical.is_empty() {
                return Err(format!(
                    "Invalid mapping '{}': both sides must be non-empty",
                    pair
                ));
            }
            Ok((db_type.to_string(), logical.to_string()))
        })
        .collect()
}

/// Configuration for the `typed-conn-factory` binary.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "typed-conn-factory",
    about = "Open database connections through the typed connection factory and report their platforms",
    version,
    author
)]
pub struct Config {
    /// Database connection URLs.
    /// Add ?server_version=X to skip the version query.
    /// Can be specified multiple times or as comma-separated values.
    #[arg(
        short = 'd',
        long = "database",
        value_name = "URL",
        env = "TCF_DATABASE",
        value_delimiter = ','
    )]
    pub databases: Vec<String>,

    /// JSON file with logical type definitions
    #[arg(long, value_name = "PATH", env = "TCF_TYPES_CONFIG")]
    pub types_config: Option<std::path::PathBuf>,

    /// Dialect type mappings in db_type=logical_type form
    #[arg(
        short = 'm',
        long = "mapping-type",
        value_name = "DB=LOGICAL",
        env = "TCF_MAPPING_TYPES",
        value_delimiter = ','
    )]
    pub mapping_types: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "TCF_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "TCF_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            databases: Vec::new(),
            types_config: None,
            mapping_types: Vec::new(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Load the configured types, or an empty table when no file is given.
    pub fn load_types(&self) -> DbResult<TypesConfig> {
        match &self.types_config {
            Some(path) => load_types_config(path),
            None => Ok(TypesConfig::new()),
        }
    }

    /// Parse the configured mapping types.
    pub fn parse_mapping_types(&self) -> Result<BTreeMap<String, String>, String> {
        parse_mapping_types(&self.mapping_types)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.databases.is_empty());
        assert_eq!(config.log_level, "info");
        assert!(config.load_types().unwrap().is_empty());
    }

    #[test]
    fn test_cli_parses_repeated_and_delimited_values() {
        let config = Config::parse_from([
            "typed-conn-factory",
            "--database",
            "sqlite:a.db,sqlite:b.db",
            "-m",
            "enum=string",
            "--mapping-type",
            "bit=boolean",
        ]);
        assert_eq!(config.databases, vec!["sqlite:a.db", "sqlite:b.db"]);
        let mappings = config.parse_mapping_types().unwrap();
        assert_eq!(mappings.get("enum").map(String::as_str), Some("string"));
        assert_eq!(mappings.get("bit").map(String::as_str), Some("boolean"));
    }

    #[test]
    fn test_parse_mapping_types_rejects_missing_separator() {
        let result = parse_mapping_types(&["enum".to_string()]);
        assert!(result.unwrap_err().contains("expected db_type=logical_type"));
    }

    #[test]
    fn test_parse_mapping_types_rejects_empty_side() {
        let result = parse_mapping_types(&["=string".to_string()]);
        assert!(result.unwrap_err().contains("non-empty"));
    }

    #[test]
    fn test_load_types_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"money": {{"class": "decimal", "commented": true}}, "payload": {{"handler": "json"}}}}"#
        )
        .unwrap();

        let types = load_types_config(file.path()).unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types["money"].class, "decimal");
        assert!(types["money"].commented);
        assert_eq!(types["payload"].class, "json");
        assert!(!types["payload"].commented);
    }

    #[test]
    fn test_load_types_config_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let result = load_types_config(file.path());
        assert!(matches!(result, Err(DbError::Configuration { .. })));
    }

    // =========================================================================
    // Pool Options Tests
    // =========================================================================

    #[test]
    fn test_pool_options_defaults() {
        let opts = PoolOptions::default();
        assert_eq!(opts.max_connections_or_default(false), 10);
        assert_eq!(opts.max_connections_or_default(true), 1);
        assert_eq!(opts.min_connections_or_default(), 0);
        assert_eq!(opts.idle_timeout_or_default(), 600);
        assert_eq!(opts.acquire_timeout_or_default(), 30);
        assert!(opts.test_before_acquire_or_default());
    }

    #[test]
    fn test_parse_pool_options_invalid_values_ignored() {
        let mut opts = HashMap::from([
            ("max_connections".to_string(), "invalid".to_string()),
            ("test_before_acquire".to_string(), "yes".to_string()),
        ]);
        let pool = parse_pool_options(&mut opts);
        assert!(pool.max_connections.is_none());
        assert!(pool.test_before_acquire.is_none());
        assert!(opts.is_empty());
    }

    #[test]
    fn test_pool_options_validation_min_exceeds_max() {
        let opts = PoolOptions {
            max_connections: Some(5),
            min_connections: Some(10),
            ..Default::default()
        };
        let err = opts.validate().unwrap_err();
        assert!(err.contains("cannot exceed"));
    }

    #[test]
    fn test_extract_options_preserves_other_params() {
        let mut url =
            Url::parse("postgres://host/db?sslmode=require&max_connections=3&connect_timeout=10")
                .unwrap();
        let opts = extract_options(&mut url, &["max_connections"]);
        assert_eq!(opts.get("max_connections").map(String::as_str), Some("3"));
        assert_eq!(
            url.as_str(),
            "postgres://host/db?sslmode=require&connect_timeout=10"
        );
    }

    #[test]
    fn test_extract_options_clears_empty_query() {
        let mut url = Url::parse("mysql://host/db?max_connections=3").unwrap();
        extract_options(&mut url, &["max_connections"]);
        assert_eq!(url.as_str(), "mysql://host/db");
    }
}
