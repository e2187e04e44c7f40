//! Black-box fuzzing of the parsers and conversions exposed to user input.
//!
//! Random and edge-case inputs must produce errors, never panics.

use rand::Rng;
use rand::distributions::Alphanumeric;
use std::collections::BTreeMap;
use std::sync::Arc;
use typed_conn_factory::config::parse_mapping_types;
use typed_conn_factory::models::{ConnectionParams, DatabaseType};
use typed_conn_factory::platform::{Platform, ServerVersion};
use typed_conn_factory::types::BuiltinKind;
use typed_conn_factory::{ConnectionFactory, DbError, TypeRegistry, TypesConfig};

/// Generate random string of given length
fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generate various edge-case strings
fn edge_case_strings() -> Vec<String> {
    vec![
        String::new(),
        " ".to_string(),
        "\n\r\t".to_string(),
        "\0".to_string(),
        "🚀".repeat(100),
        "(Type:".to_string(),
        "(Type:)".to_string(),
        "(Type:🚀)".to_string(),
        "'; DROP TABLE users--".to_string(),
        "postgres://".to_string(),
        "mysql://:@:/".to_string(),
        "sqlite:".to_string(),
        "pgsql://u:p@h:99999/db".to_string(),
        "postgres://h/db?max_connections=abc&server_version=".to_string(),
        "99999999999999.1.1".to_string(),
        "1.2.3.4.5".to_string(),
        "...".to_string(),
        "=".to_string(),
        "a=b=c".to_string(),
        "a".repeat(10000),
        random_string(100),
        random_string(1000),
        "\u{0000}\u{FFFF}".to_string(),
        "{{7*7}}".to_string(),
    ]
}

fn platforms() -> Vec<Platform> {
    let registry = TypeRegistry::shared();
    [
        DatabaseType::PostgreSQL,
        DatabaseType::MySQL,
        DatabaseType::SQLite,
    ]
    .into_iter()
    .map(|db| Platform::new(db, None, registry.clone()).unwrap())
    .collect()
}

#[test]
fn fuzz_server_version_parse() {
    for input in edge_case_strings() {
        if let Some(version) = ServerVersion::parse(&input) {
            assert_eq!(version.raw(), input);
        }
    }
    assert!(ServerVersion::parse("99999999999999.1.1").is_none());
}

#[test]
fn fuzz_extract_type_from_comment() {
    for input in edge_case_strings() {
        if let Some(name) = Platform::extract_type_from_comment(&input) {
            assert!(input.contains(name));
        }
    }
}

#[test]
fn fuzz_connection_params_from_url() {
    for input in edge_case_strings() {
        match ConnectionParams::from_url(&input) {
            Ok((params, _)) => {
                assert!(params.driver.is_some());
                assert!(!params.masked_url().contains("secret"));
            }
            Err(e) => assert!(matches!(e, DbError::InvalidInput { .. }), "{e:?}"),
        }
    }
}

#[test]
fn fuzz_parse_mapping_types() {
    for input in edge_case_strings() {
        if let Ok(mappings) = parse_mapping_types(std::slice::from_ref(&input)) {
            assert_eq!(mappings.len(), 1);
        }
    }
}

#[test]
fn fuzz_quote_identifier_always_quotes() {
    for platform in platforms() {
        for input in edge_case_strings() {
            let quoted = platform.quote_identifier(&input);
            assert!(quoted.len() >= input.len() + 2);
        }
    }
}

#[test]
fn fuzz_builtin_conversions() {
    let registry = TypeRegistry::shared();
    for platform in platforms() {
        for kind in BuiltinKind::ALL {
            let ty = registry.get_type(kind.id()).unwrap();
            for input in edge_case_strings() {
                let value = serde_json::Value::String(input);
                let _ = ty.to_database_value(&value, &platform);
                let _ = ty.from_database_value(&value, &platform);
            }
        }
    }
}

#[test]
fn fuzz_mapping_types_through_factory() {
    let factory = ConnectionFactory::new(TypesConfig::new(), Arc::new(TypeRegistry::default()));
    let params = ConnectionParams {
        driver: Some(DatabaseType::SQLite),
        path: Some("fuzz.db".to_string()),
        server_version: Some("3.45.0".to_string()),
        ..Default::default()
    };

    for input in edge_case_strings() {
        let mut mapping_types = BTreeMap::new();
        mapping_types.insert(input.clone(), input.clone());

        let result = tokio_test::block_on(factory.create_connection(
            &params,
            None,
            None,
            &mapping_types,
        ));
        match result {
            Ok(conn) => {
                let platform = tokio_test::block_on(conn.database_platform()).unwrap();
                assert_eq!(platform.type_mapping(&input).unwrap(), input);
            }
            Err(e) => assert!(matches!(e, DbError::TypeNotFound { .. }), "{e:?}"),
        }
    }
}
