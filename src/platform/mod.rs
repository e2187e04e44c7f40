//! SQL dialect platforms.
//!
//! A [`Platform`] carries everything dialect-specific a connection needs for
//! type handling: which native types map to which logical types, which logical
//! types are flagged with a column comment, identifier quoting, and the
//! feature flags that depend on the server version.
//!
//! Platforms are shared behind an `Arc`, so their mutable tables use interior
//! locking.

pub mod mappings;
pub mod version;

use crate::error::{DbError, DbResult};
use crate::models::DatabaseType;
use crate::types::{LogicalType, TypeRegistry};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

pub use mappings::default_type_mappings;
pub use version::ServerVersion;

const TYPE_COMMENT_PREFIX: &str = "(Type:";

/// Column attributes consulted when rendering declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub nullable: bool,
    pub comment: Option<String>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            length: None,
            precision: None,
            scale: None,
            nullable: true,
            comment: None,
        }
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Dialect-specific behaviour for one connection.
#[derive(Debug)]
pub struct Platform {
    db_type: DatabaseType,
    version: Option<ServerVersion>,
    registry: Arc<TypeRegistry>,
    type_mappings: RwLock<HashMap<String, String>>,
    commented_types: RwLock<BTreeSet<String>>,
}

impl Platform {
    /// Create a platform for `db_type`.
    ///
    /// Without a server version the newest feature set is assumed. A version
    /// string that contains no version number is rejected.
    pub fn new(
        db_type: DatabaseType,
        server_version: Option<&str>,
        registry: Arc<TypeRegistry>,
    ) -> DbResult<Self> {
        let version = server_version
            .map(|raw| {
                ServerVersion::parse(raw).ok_or_else(|| {
                    DbError::invalid_input(format!(
                        "Invalid platform version '{}' specified. Expected a version like '15.3' or '8.0.33'",
                        raw
                    ))
                })
            })
            .transpose()?;

        let type_mappings = default_type_mappings(db_type)
            .iter()
            .map(|(native, logical)| (native.to_string(), logical.to_string()))
            .collect();

        Ok(Self {
            db_type,
            version,
            registry,
            type_mappings: RwLock::new(type_mappings),
            commented_types: RwLock::new(BTreeSet::new()),
        })
    }

    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    pub fn server_version(&self) -> Option<&ServerVersion> {
        self.version.as_ref()
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Short platform name, distinguishing MariaDB from MySQL.
    pub fn name(&self) -> &'static str {
        match self.db_type {
            DatabaseType::PostgreSQL => "postgresql",
            DatabaseType::MySQL if self.is_mariadb() => "mariadb",
            DatabaseType::MySQL => "mysql",
            DatabaseType::SQLite => "sqlite",
        }
    }

    fn is_mariadb(&self) -> bool {
        self.version.as_ref().is_some_and(|v| v.mariadb)
    }

    /// JSON is a real column type (not an alias for text).
    pub fn has_native_json_type(&self) -> bool {
        match self.db_type {
            DatabaseType::PostgreSQL => self.version.as_ref().is_none_or(|v| v.at_least(9, 2, 0)),
            DatabaseType::MySQL => self
                .version
                .as_ref()
                .is_none_or(|v| !v.mariadb && v.at_least(5, 7, 8)),
            DatabaseType::SQLite => false,
        }
    }

    pub fn has_native_guid_type(&self) -> bool {
        self.db_type == DatabaseType::PostgreSQL
    }

    /// Quote an identifier; dotted names are quoted per segment.
    pub fn quote_identifier(&self, identifier: &str) -> String {
        let quote = match self.db_type {
            DatabaseType::MySQL => '`',
            _ => '"',
        };
        identifier
            .split('.')
            .map(|part| {
                let escaped = part.replace(quote, &format!("{quote}{quote}"));
                format!("{quote}{escaped}{quote}")
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quote a string literal.
    pub fn quote_string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    // =========================================================================
    // Type mappings
    // =========================================================================

    /// Map a native database type to a registered logical type.
    pub fn register_type_mapping(&self, db_type: &str, logical_type: &str) -> DbResult<()> {
        if !self.registry.has_type(logical_type) {
            return Err(DbError::type_not_found(logical_type));
        }
        let db_type = db_type.to_lowercase();
        debug!(
            platform = self.name(),
            db_type = %db_type,
            logical_type = %logical_type,
            "Registering type mapping"
        );
        self.write_mappings()
            .insert(db_type, logical_type.to_string());
        Ok(())
    }

    pub fn has_type_mapping(&self, db_type: &str) -> bool {
        self.read_mappings().contains_key(&db_type.to_lowercase())
    }

    /// Logical type name a native type maps to.
    pub fn type_mapping(&self, db_type: &str) -> DbResult<String> {
        self.read_mappings()
            .get(&db_type.to_lowercase())
            .cloned()
            .ok_or_else(|| DbError::unknown_column_type(db_type, self.name()))
    }

    /// Snapshot of all mappings, sorted by native type.
    pub fn type_mappings(&self) -> BTreeMap<String, String> {
        self.read_mappings()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    // =========================================================================
    // Commented types
    // =========================================================================

    /// Flag a logical type so its columns carry a type comment.
    pub fn mark_type_commented(&self, ty: &dyn LogicalType) {
        debug!(platform = self.name(), type_name = %ty.name(), "Marking type commented");
        self.write_commented().insert(ty.name().to_string());
    }

    /// Whether columns of this type carry a type comment.
    pub fn is_commented_type(&self, ty: &dyn LogicalType) -> bool {
        self.read_commented().contains(ty.name()) || ty.requires_sql_comment_hint(self)
    }

    /// Names of explicitly marked types.
    pub fn commented_type_names(&self) -> Vec<String> {
        self.read_commented().iter().cloned().collect()
    }

    /// Comment identifying the logical type, for commented types only.
    pub fn type_comment(&self, ty: &dyn LogicalType) -> Option<String> {
        self.is_commented_type(ty)
            .then(|| format!("{}{})", TYPE_COMMENT_PREFIX, ty.name()))
    }

    /// Full column comment: the user comment followed by the type comment.
    pub fn column_comment(&self, column: &ColumnSpec, ty: &dyn LogicalType) -> Option<String> {
        let user = column.comment.as_deref().unwrap_or_default();
        match self.type_comment(ty) {
            Some(type_comment) => Some(format!("{}{}", user, type_comment)),
            None if !user.is_empty() => Some(user.to_string()),
            None => None,
        }
    }

    /// Recover a logical type name from a column comment.
    pub fn extract_type_from_comment(comment: &str) -> Option<&str> {
        let start = comment.find(TYPE_COMMENT_PREFIX)? + TYPE_COMMENT_PREFIX.len();
        let len = comment[start..].find(')')?;
        let name = comment[start..start + len].trim();
        (!name.is_empty()).then_some(name)
    }

    /// Resolve the logical type of an introspected column. A type comment
    /// takes precedence over the native type mapping.
    pub fn resolve_column_type(
        &self,
        db_type: &str,
        comment: Option<&str>,
    ) -> DbResult<Arc<dyn LogicalType>> {
        if let Some(name) = comment.and_then(Self::extract_type_from_comment) {
            return self.registry.get_type(name);
        }
        let name = self.type_mapping(db_type)?;
        self.registry.get_type(&name)
    }

    // =========================================================================
    // Column DDL
    // =========================================================================

    /// Render a column definition for `CREATE TABLE`.
    ///
    /// MySQL carries the comment inline, SQLite as a trailing SQL comment
    /// line; PostgreSQL needs [`Platform::column_comment_statement`].
    pub fn column_declaration(&self, column: &ColumnSpec, ty: &dyn LogicalType) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            ty.sql_declaration(column, self)
        );
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(comment) = self.column_comment(column, ty) {
            match self.db_type {
                DatabaseType::MySQL => {
                    sql.push_str(" COMMENT ");
                    sql.push_str(&self.quote_string_literal(&comment));
                }
                DatabaseType::SQLite => {
                    sql.push_str(" --");
                    sql.push_str(&comment.replace('\n', " "));
                    sql.push('\n');
                }
                DatabaseType::PostgreSQL => {}
            }
        }
        sql
    }

    /// `COMMENT ON COLUMN` statement for dialects without inline comments.
    pub fn column_comment_statement(
        &self,
        table: &str,
        column: &ColumnSpec,
        ty: &dyn LogicalType,
    ) -> Option<String> {
        if self.db_type != DatabaseType::PostgreSQL {
            return None;
        }
        let comment = self.column_comment(column, ty)?;
        Some(format!(
            "COMMENT ON COLUMN {}.{} IS {}",
            self.quote_identifier(table),
            self.quote_identifier(&column.name),
            self.quote_string_literal(&comment)
        ))
    }

    // Writes are single map operations; poisoned locks are recovered.

    fn read_mappings(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.type_mappings.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_mappings(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.type_mappings.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read_commented(&self) -> RwLockReadGuard<'_, BTreeSet<String>> {
        self.commented_types.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_commented(&self) -> RwLockWriteGuard<'_, BTreeSet<String>> {
        self.commented_types.write().unwrap_or_else(|e| e.into_inner())
    }
}
