//! sqlx-backed connection handed out by [`SqlxDriverManager`](super::SqlxDriverManager).
//!
//! Nothing touches the network until the pool or the platform is first
//! needed. Both are built at most once per connection.

use super::events::{ConnectEvent, EventHooks};
use super::pool::{DbPool, create_pool};
use crate::error::{DbError, DbResult};
use crate::models::{Configuration, ConnectionParams, DatabaseType};
use crate::platform::Platform;
use crate::types::TypeRegistry;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Connection {
    db_type: DatabaseType,
    connection_string: String,
    params: ConnectionParams,
    config: Configuration,
    hooks: EventHooks,
    registry: Arc<TypeRegistry>,
    pool: OnceCell<DbPool>,
    platform: OnceCell<Arc<Platform>>,
}

impl Connection {
    /// Resolve the driver and connection string without connecting.
    pub fn new(
        params: ConnectionParams,
        config: Option<Configuration>,
        hooks: Option<EventHooks>,
        registry: Arc<TypeRegistry>,
    ) -> DbResult<Self> {
        let db_type = params.database_type()?;
        let connection_string = params.connection_string()?;

        Ok(Self {
            db_type,
            connection_string,
            params,
            config: config.unwrap_or_default(),
            hooks: hooks.unwrap_or_default(),
            registry,
            pool: OnceCell::new(),
            platform: OnceCell::new(),
        })
    }

    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn event_hooks(&self) -> &EventHooks {
        &self.hooks
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Connection URL with the password masked.
    pub fn masked_url(&self) -> String {
        self.params.masked_url()
    }

    /// The connection pool, connecting on first use.
    ///
    /// `post_connect` listeners run once, after the pool is established.
    pub async fn pool(&self) -> DbResult<&DbPool> {
        self.pool
            .get_or_try_init(|| async {
                let pool =
                    create_pool(self.db_type, &self.connection_string, &self.config).await?;
                let event = ConnectEvent {
                    db_type: self.db_type,
                    url: self.masked_url(),
                };
                info!(
                    db_type = %event.db_type,
                    url = %event.url,
                    "Connected to database"
                );
                self.hooks.dispatch_post_connect(&event);
                Ok::<_, DbError>(pool)
            })
            .await
    }

    /// The dialect platform of this connection.
    ///
    /// With a configured `server_version` no connection is made. Otherwise
    /// the server is asked for its version, and failures come back as driver
    /// errors.
    pub async fn database_platform(&self) -> DbResult<Arc<Platform>> {
        let platform = self
            .platform
            .get_or_try_init(|| async {
                let version = match &self.params.server_version {
                    Some(version) => version.clone(),
                    None => self.pool().await?.server_version().await?,
                };
                let platform =
                    Platform::new(self.db_type, Some(version.as_str()), self.registry.clone())?;
                debug!(
                    platform = platform.name(),
                    version = %version,
                    "Resolved database platform"
                );
                Ok::<_, DbError>(Arc::new(platform))
            })
            .await?;
        Ok(Arc::clone(platform))
    }

    /// Convert an application value to its database form using a registered type.
    pub async fn convert_to_database_value(
        &self,
        value: &JsonValue,
        type_name: &str,
    ) -> DbResult<JsonValue> {
        let ty = self.registry.get_type(type_name)?;
        let platform = self.database_platform().await?;
        ty.to_database_value(value, &platform)
    }

    /// Convert a database value to its application form using a registered type.
    pub async fn convert_to_logical_value(
        &self,
        value: &JsonValue,
        type_name: &str,
    ) -> DbResult<JsonValue> {
        let ty = self.registry.get_type(type_name)?;
        let platform = self.database_platform().await?;
        ty.from_database_value(value, &platform)
    }

    /// Whether the pool has been established and not closed.
    pub fn is_connected(&self) -> bool {
        self.pool.get().is_some_and(|pool| !pool.is_closed())
    }

    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            info!(db_type = %self.db_type, "Connection closed");
        }
    }
}
