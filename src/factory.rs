//! Connection factory with custom logical type registration.
//!
//! [`ConnectionFactory`] wraps a [`DriverManager`]. Before handing out its
//! first connection it registers the configured logical types in the shared
//! [`TypeRegistry`]; every connection it creates then gets the requested
//! type mappings and commented types applied to its platform.

use crate::db::{DriverManager, EventHooks, PlatformSource, SqlxDriverManager};
use crate::error::{DbError, DbResult};
use crate::models::{Configuration, ConnectionParams};
use crate::platform::Platform;
use crate::types::TypeRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Configuration of one logical type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeConfig {
    /// Handler id in the registry's handler catalog.
    #[serde(alias = "handler")]
    pub class: String,
    /// Flag columns of this type with a `(Type:name)` comment.
    #[serde(default)]
    pub commented: bool,
}

impl TypeConfig {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            commented: false,
        }
    }

    pub fn commented(mut self) -> Self {
        self.commented = true;
        self
    }
}

/// Logical type name to its configuration.
pub type TypesConfig = BTreeMap<String, TypeConfig>;

/// Creates connections with custom logical types applied.
#[derive(Debug)]
pub struct ConnectionFactory<M = SqlxDriverManager> {
    types_config: TypesConfig,
    registry: Arc<TypeRegistry>,
    driver_manager: M,
    /// Names of the commented types, set once the types are registered.
    commented_types: OnceCell<Vec<String>>,
}

impl ConnectionFactory<SqlxDriverManager> {
    /// Create a factory that connects through sqlx.
    pub fn new(types_config: TypesConfig, registry: Arc<TypeRegistry>) -> Self {
        let driver_manager = SqlxDriverManager::new(registry.clone());
        Self::with_driver_manager(types_config, registry, driver_manager)
    }
}

impl<M: DriverManager> ConnectionFactory<M> {
    pub fn with_driver_manager(
        types_config: TypesConfig,
        registry: Arc<TypeRegistry>,
        driver_manager: M,
    ) -> Self {
        Self {
            types_config,
            registry,
            driver_manager,
            commented_types: OnceCell::new(),
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn driver_manager(&self) -> &M {
        &self.driver_manager
    }

    pub fn types_config(&self) -> &TypesConfig {
        &self.types_config
    }

    /// Commented type names, or `None` before the first connection.
    pub fn commented_types(&self) -> Option<&[String]> {
        self.commented_types.get().map(Vec::as_slice)
    }

    /// Create a connection.
    ///
    /// The first call registers the configured types. `mapping_types` maps
    /// native database type names to logical type names on the new
    /// connection's platform.
    ///
    /// When the platform has to be resolved and the server version query
    /// fails with a driver error, the error is returned as a
    /// [`DbError::Configuration`] that suggests setting `server_version`.
    pub async fn create_connection(
        &self,
        params: &ConnectionParams,
        config: Option<Configuration>,
        event_hooks: Option<EventHooks>,
        mapping_types: &BTreeMap<String, String>,
    ) -> DbResult<M::Connection> {
        let commented_types = self
            .commented_types
            .get_or_try_init(|| async { self.initialize_types() })
            .await?;

        let conn = self
            .driver_manager
            .get_connection(params, config, event_hooks)?;

        if !mapping_types.is_empty() {
            let platform = self.database_platform(&conn).await?;
            for (db_type, logical_type) in mapping_types {
                platform.register_type_mapping(db_type, logical_type)?;
            }
        }

        if !commented_types.is_empty() {
            let platform = self.database_platform(&conn).await?;
            for name in commented_types {
                let ty = self.registry.get_type(name)?;
                platform.mark_type_commented(ty.as_ref());
            }
        }

        Ok(conn)
    }

    fn initialize_types(&self) -> DbResult<Vec<String>> {
        let mut commented = Vec::new();
        for (name, type_config) in &self.types_config {
            if self.registry.has_type(name) {
                self.registry.override_type(name, &type_config.class)?;
            } else {
                self.registry.add_type(name, &type_config.class)?;
            }
            if type_config.commented {
                commented.push(name.clone());
            }
        }

        info!(
            types = self.types_config.len(),
            commented = commented.len(),
            "Registered custom logical types"
        );
        Ok(commented)
    }

    /// The platform of a connection made by this factory.
    ///
    /// Driver errors while resolving it come back as the same
    /// [`DbError::Configuration`] that `create_connection` returns.
    pub async fn database_platform(&self, conn: &M::Connection) -> DbResult<Arc<Platform>> {
        conn.database_platform().await.map_err(|e| {
            if e.is_driver_error() {
                debug!(error = %e, "Platform detection failed");
                DbError::server_version_unknown(e)
            } else {
                e
            }
        })
    }
}
