//! Built-in logical types.
//!
//! Every built-in type is a [`BuiltinType`] tagged with a [`BuiltinKind`]; the
//! kind decides the per-dialect declaration and how values are converted.
//! Values travel as `serde_json::Value`.

use super::LogicalType;
use crate::error::{DbError, DbResult};
use crate::models::DatabaseType;
use crate::platform::{ColumnSpec, Platform};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as JsonValue;

pub const DEFAULT_STRING_LENGTH: u32 = 255;
pub const DEFAULT_DECIMAL_PRECISION: u32 = 10;
pub const DEFAULT_DECIMAL_SCALE: u32 = 0;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Kind of a built-in logical type. The id doubles as the handler id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    String,
    Text,
    Integer,
    BigInt,
    SmallInt,
    Boolean,
    Float,
    Decimal,
    Json,
    Guid,
    Binary,
    Blob,
    DateTime,
    Date,
    Time,
}

impl BuiltinKind {
    pub const ALL: &'static [BuiltinKind] = &[
        Self::String,
        Self::Text,
        Self::Integer,
        Self::BigInt,
        Self::SmallInt,
        Self::Boolean,
        Self::Float,
        Self::Decimal,
        Self::Json,
        Self::Guid,
        Self::Binary,
        Self::Blob,
        Self::DateTime,
        Self::Date,
        Self::Time,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::BigInt => "bigint",
            Self::SmallInt => "smallint",
            Self::Boolean => "boolean",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Json => "json",
            Self::Guid => "guid",
            Self::Binary => "binary",
            Self::Blob => "blob",
            Self::DateTime => "datetime",
            Self::Date => "date",
            Self::Time => "time",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.id() == id)
    }
}

/// A built-in logical type registered under `name`.
#[derive(Debug, Clone)]
pub struct BuiltinType {
    name: String,
    kind: BuiltinKind,
}

impl BuiltinType {
    pub fn new(name: &str, kind: BuiltinKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }

    pub fn kind(&self) -> BuiltinKind {
        self.kind
    }

    fn conversion_error(&self, value: &JsonValue, expected: &str) -> DbError {
        DbError::conversion(
            &self.name,
            format!("expected {}, got {}", expected, value),
        )
    }
}

impl LogicalType for BuiltinType {
    fn name(&self) -> &str {
        &self.name
    }

    fn sql_declaration(&self, column: &ColumnSpec, platform: &Platform) -> String {
        let db = platform.db_type();
        match self.kind {
            BuiltinKind::String => format!(
                "VARCHAR({})",
                column.length.unwrap_or(DEFAULT_STRING_LENGTH)
            ),
            BuiltinKind::Text => match db {
                DatabaseType::MySQL => "LONGTEXT".to_string(),
                DatabaseType::PostgreSQL => "TEXT".to_string(),
                DatabaseType::SQLite => "CLOB".to_string(),
            },
            BuiltinKind::Integer => match db {
                DatabaseType::MySQL => "INT".to_string(),
                _ => "INTEGER".to_string(),
            },
            BuiltinKind::BigInt => "BIGINT".to_string(),
            BuiltinKind::SmallInt => "SMALLINT".to_string(),
            BuiltinKind::Boolean => match db {
                DatabaseType::MySQL => "TINYINT(1)".to_string(),
                _ => "BOOLEAN".to_string(),
            },
            BuiltinKind::Float => "DOUBLE PRECISION".to_string(),
            BuiltinKind::Decimal => format!(
                "NUMERIC({}, {})",
                column.precision.unwrap_or(DEFAULT_DECIMAL_PRECISION),
                column.scale.unwrap_or(DEFAULT_DECIMAL_SCALE)
            ),
            BuiltinKind::Json => match (db, platform.has_native_json_type()) {
                (_, true) => "JSON".to_string(),
                (DatabaseType::MySQL, false) => "LONGTEXT".to_string(),
                (DatabaseType::PostgreSQL, false) => "TEXT".to_string(),
                (DatabaseType::SQLite, false) => "CLOB".to_string(),
            },
            BuiltinKind::Guid => {
                if platform.has_native_guid_type() {
                    "UUID".to_string()
                } else {
                    "CHAR(36)".to_string()
                }
            }
            BuiltinKind::Binary => match db {
                DatabaseType::MySQL => format!(
                    "VARBINARY({})",
                    column.length.unwrap_or(DEFAULT_STRING_LENGTH)
                ),
                DatabaseType::PostgreSQL => "BYTEA".to_string(),
                DatabaseType::SQLite => "BLOB".to_string(),
            },
            BuiltinKind::Blob => match db {
                DatabaseType::MySQL => "LONGBLOB".to_string(),
                DatabaseType::PostgreSQL => "BYTEA".to_string(),
                DatabaseType::SQLite => "BLOB".to_string(),
            },
            BuiltinKind::DateTime => match db {
                DatabaseType::PostgreSQL => "TIMESTAMP(0) WITHOUT TIME ZONE".to_string(),
                _ => "DATETIME".to_string(),
            },
            BuiltinKind::Date => "DATE".to_string(),
            BuiltinKind::Time => match db {
                DatabaseType::PostgreSQL => "TIME(0) WITHOUT TIME ZONE".to_string(),
                _ => "TIME".to_string(),
            },
        }
    }

    fn requires_sql_comment_hint(&self, platform: &Platform) -> bool {
        match self.kind {
            BuiltinKind::Json => !platform.has_native_json_type(),
            BuiltinKind::Guid => !platform.has_native_guid_type(),
            _ => false,
        }
    }

    fn to_database_value(&self, value: &JsonValue, platform: &Platform) -> DbResult<JsonValue> {
        if value.is_null() {
            return Ok(JsonValue::Null);
        }
        match self.kind {
            BuiltinKind::String | BuiltinKind::Text => match value {
                JsonValue::String(_) => Ok(value.clone()),
                JsonValue::Number(n) => Ok(JsonValue::String(n.to_string())),
                JsonValue::Bool(b) => Ok(JsonValue::String(b.to_string())),
                _ => Err(self.conversion_error(value, "a scalar")),
            },
            BuiltinKind::Integer | BuiltinKind::BigInt | BuiltinKind::SmallInt => {
                parse_integer(value)
                    .map(JsonValue::from)
                    .ok_or_else(|| self.conversion_error(value, "an integer"))
            }
            BuiltinKind::Float => parse_float(value)
                .and_then(serde_json::Number::from_f64)
                .map(JsonValue::Number)
                .ok_or_else(|| self.conversion_error(value, "a finite number")),
            BuiltinKind::Decimal => match value {
                JsonValue::Number(n) => Ok(JsonValue::String(n.to_string())),
                JsonValue::String(s) if is_decimal_literal(s) => Ok(value.clone()),
                _ => Err(self.conversion_error(value, "a decimal")),
            },
            BuiltinKind::Boolean => {
                let b = parse_bool(value).ok_or_else(|| self.conversion_error(value, "a boolean"))?;
                match platform.db_type() {
                    DatabaseType::PostgreSQL => Ok(JsonValue::Bool(b)),
                    _ => Ok(JsonValue::from(i64::from(b))),
                }
            }
            BuiltinKind::Json => serde_json::to_string(value)
                .map(JsonValue::String)
                .map_err(|e| DbError::conversion(&self.name, e.to_string())),
            BuiltinKind::Guid => parse_guid(value)
                .ok_or_else(|| self.conversion_error(value, "a UUID string")),
            BuiltinKind::Binary | BuiltinKind::Blob => match value {
                JsonValue::String(s) => STANDARD
                    .decode(s)
                    .map(JsonValue::from)
                    .map_err(|e| DbError::conversion(&self.name, format!("invalid base64: {}", e))),
                _ => Err(self.conversion_error(value, "a base64 string")),
            },
            BuiltinKind::DateTime => value
                .as_str()
                .and_then(parse_datetime)
                .map(|dt| JsonValue::String(dt.format(DATETIME_FORMAT).to_string()))
                .ok_or_else(|| self.conversion_error(value, "a datetime")),
            BuiltinKind::Date => value
                .as_str()
                .and_then(parse_date)
                .map(|d| JsonValue::String(d.format(DATE_FORMAT).to_string()))
                .ok_or_else(|| self.conversion_error(value, "a date")),
            BuiltinKind::Time => value
                .as_str()
                .and_then(parse_time)
                .map(|t| JsonValue::String(t.format(TIME_FORMAT).to_string()))
                .ok_or_else(|| self.conversion_error(value, "a time")),
        }
    }

    fn from_database_value(&self, value: &JsonValue, _platform: &Platform) -> DbResult<JsonValue> {
        if value.is_null() {
            return Ok(JsonValue::Null);
        }
        match self.kind {
            BuiltinKind::Boolean => parse_bool(value)
                .map(JsonValue::Bool)
                .ok_or_else(|| self.conversion_error(value, "a boolean")),
            BuiltinKind::Integer | BuiltinKind::BigInt | BuiltinKind::SmallInt => {
                parse_integer(value)
                    .map(JsonValue::from)
                    .ok_or_else(|| self.conversion_error(value, "an integer"))
            }
            BuiltinKind::Decimal => match value {
                JsonValue::Number(n) => Ok(JsonValue::String(n.to_string())),
                _ => Ok(value.clone()),
            },
            BuiltinKind::Json => match value {
                JsonValue::String(s) => serde_json::from_str(s)
                    .map_err(|e| DbError::conversion(&self.name, format!("invalid JSON: {}", e))),
                _ => Ok(value.clone()),
            },
            BuiltinKind::Guid => parse_guid(value)
                .ok_or_else(|| self.conversion_error(value, "a UUID string")),
            BuiltinKind::Binary | BuiltinKind::Blob => match value {
                JsonValue::Array(items) => {
                    let bytes = items
                        .iter()
                        .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                        .collect::<Option<Vec<u8>>>()
                        .ok_or_else(|| self.conversion_error(value, "a byte array"))?;
                    Ok(JsonValue::String(STANDARD.encode(bytes)))
                }
                _ => Ok(value.clone()),
            },
            BuiltinKind::DateTime => value
                .as_str()
                .and_then(parse_datetime)
                .map(|dt| JsonValue::String(dt.format(DATETIME_FORMAT).to_string()))
                .ok_or_else(|| self.conversion_error(value, "a datetime")),
            _ => Ok(value.clone()),
        }
    }
}

fn parse_integer(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_float(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_bool(value: &JsonValue) -> Option<bool> {
    match value {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        JsonValue::String(s) => match s.to_ascii_lowercase().as_str() {
            "1" | "t" | "true" => Some(true),
            "0" | "f" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn parse_guid(value: &JsonValue) -> Option<JsonValue> {
    let s = value.as_str()?;
    let uuid = uuid::Uuid::parse_str(s).ok()?;
    Some(JsonValue::String(uuid.hyphenated().to_string()))
}

fn is_decimal_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    !(int_part.is_empty() && frac_part.is_empty())
        && int_part.chars().all(|c| c.is_ascii_digit())
        && frac_part.chars().all(|c| c.is_ascii_digit())
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .or_else(|| parse_datetime(s).map(|dt| dt.date()))
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}
