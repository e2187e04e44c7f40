use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;
use typed_conn_factory::db::{DbPool, EventHooks};
use typed_conn_factory::models::{Configuration, ConnectionParams};
use typed_conn_factory::platform::ColumnSpec;
use typed_conn_factory::{ConnectionFactory, TypeConfig, TypeRegistry, TypesConfig};

fn sqlite_url(file: &NamedTempFile) -> String {
    format!("sqlite:{}?mode=rwc", file.path().to_str().unwrap())
}

#[tokio::test]
async fn test_sqlite_platform_read_from_server() {
    let temp_file = NamedTempFile::new().unwrap();
    let (params, pool_options) = ConnectionParams::from_url(&sqlite_url(&temp_file)).unwrap();

    let mut types = TypesConfig::new();
    types.insert("json".to_string(), TypeConfig::new("json").commented());
    let factory = ConnectionFactory::new(types, TypeRegistry::shared());

    let connects = Arc::new(AtomicUsize::new(0));
    let mut hooks = EventHooks::new();
    let counter = connects.clone();
    hooks.on_post_connect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let mut mapping_types = BTreeMap::new();
    mapping_types.insert("ENUM".to_string(), "string".to_string());

    let conn = factory
        .create_connection(
            &params,
            Some(Configuration::with_pool_options(pool_options)),
            Some(hooks),
            &mapping_types,
        )
        .await
        .expect("SQLite connection should be created");

    // Resolving the platform required a real connection.
    assert!(conn.is_connected());
    assert_eq!(connects.load(Ordering::SeqCst), 1);

    let platform = conn.database_platform().await.unwrap();
    assert_eq!(platform.name(), "sqlite");
    assert_eq!(platform.server_version().map(|v| v.major), Some(3));
    assert_eq!(platform.type_mapping("enum").unwrap(), "string");

    let json = factory.registry().get_type("json").unwrap();
    let column = ColumnSpec::new("payload").comment("raw event");
    assert_eq!(
        platform.column_declaration(&column, json.as_ref()),
        "\"payload\" CLOB --raw event(Type:json)\n"
    );

    conn.close().await;
    assert!(!conn.is_connected());
}

#[tokio::test]
async fn test_sqlite_converted_values_round_trip_through_table() {
    let temp_file = NamedTempFile::new().unwrap();
    let (params, _) = ConnectionParams::from_url(&sqlite_url(&temp_file)).unwrap();
    let factory = ConnectionFactory::new(TypesConfig::new(), TypeRegistry::shared());

    let conn = factory
        .create_connection(&params, None, None, &BTreeMap::new())
        .await
        .unwrap();
    assert!(!conn.is_connected());

    let stored = conn
        .convert_to_database_value(&serde_json::json!({"a": [1, 2]}), "json")
        .await
        .unwrap();

    let DbPool::SQLite(pool) = conn.pool().await.unwrap() else {
        panic!("Expected SQLite pool");
    };
    sqlx::query("CREATE TABLE events (payload TEXT)")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO events (payload) VALUES (?)")
        .bind(stored.as_str().unwrap())
        .execute(pool)
        .await
        .unwrap();
    let raw: String = sqlx::query_scalar("SELECT payload FROM events")
        .fetch_one(pool)
        .await
        .unwrap();

    let restored = conn
        .convert_to_logical_value(&serde_json::Value::String(raw), "json")
        .await
        .unwrap();
    assert_eq!(restored, serde_json::json!({"a": [1, 2]}));

    conn.close().await;
}
