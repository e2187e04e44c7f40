//! Default native type → logical type mappings per dialect.
//!
//! Keys are lowercase native type names as reported by schema introspection.

use crate::models::DatabaseType;

const MYSQL: &[(&str, &str)] = &[
    ("bigint", "bigint"),
    ("binary", "binary"),
    ("blob", "blob"),
    ("char", "string"),
    ("date", "date"),
    ("datetime", "datetime"),
    ("decimal", "decimal"),
    ("double", "float"),
    ("float", "float"),
    ("int", "integer"),
    ("integer", "integer"),
    ("json", "json"),
    ("longblob", "blob"),
    ("longtext", "text"),
    ("mediumblob", "blob"),
    ("mediumint", "integer"),
    ("mediumtext", "text"),
    ("numeric", "decimal"),
    ("real", "float"),
    ("smallint", "smallint"),
    ("text", "text"),
    ("time", "time"),
    ("timestamp", "datetime"),
    ("tinyblob", "blob"),
    ("tinyint", "boolean"),
    ("tinytext", "text"),
    ("varbinary", "binary"),
    ("varchar", "string"),
    ("year", "date"),
];

const POSTGRES: &[(&str, &str)] = &[
    ("bigint", "bigint"),
    ("bigserial", "bigint"),
    ("bool", "boolean"),
    ("boolean", "boolean"),
    ("bpchar", "string"),
    ("bytea", "blob"),
    ("char", "string"),
    ("character", "string"),
    ("character varying", "string"),
    ("date", "date"),
    ("decimal", "decimal"),
    ("double precision", "float"),
    ("float", "float"),
    ("float4", "float"),
    ("float8", "float"),
    ("int", "integer"),
    ("int2", "smallint"),
    ("int4", "integer"),
    ("int8", "bigint"),
    ("integer", "integer"),
    ("json", "json"),
    ("jsonb", "json"),
    ("money", "decimal"),
    ("numeric", "decimal"),
    ("real", "float"),
    ("serial", "integer"),
    ("serial4", "integer"),
    ("serial8", "bigint"),
    ("smallint", "smallint"),
    ("text", "text"),
    ("time", "time"),
    ("timestamp", "datetime"),
    ("timestamptz", "datetime"),
    ("timetz", "time"),
    ("uuid", "guid"),
    ("varchar", "string"),
];

const SQLITE: &[(&str, &str)] = &[
    ("bigint", "bigint"),
    ("bigserial", "bigint"),
    ("blob", "blob"),
    ("boolean", "boolean"),
    ("char", "string"),
    ("clob", "text"),
    ("date", "date"),
    ("datetime", "datetime"),
    ("decimal", "decimal"),
    ("double", "float"),
    ("double precision", "float"),
    ("float", "float"),
    ("int", "integer"),
    ("integer", "integer"),
    ("longtext", "text"),
    ("mediumint", "integer"),
    ("mediumtext", "text"),
    ("numeric", "decimal"),
    ("nvarchar", "string"),
    ("real", "float"),
    ("serial", "integer"),
    ("smallint", "smallint"),
    ("string", "string"),
    ("text", "text"),
    ("time", "time"),
    ("timestamp", "datetime"),
    ("tinyint", "boolean"),
    ("tinytext", "text"),
    ("varchar", "string"),
];

/// Default mappings for a dialect.
pub fn default_type_mappings(db_type: DatabaseType) -> &'static [(&'static str, &'static str)] {
    match db_type {
        DatabaseType::MySQL => MYSQL,
        DatabaseType::PostgreSQL => POSTGRES,
        DatabaseType::SQLite => SQLITE,
    }
}
