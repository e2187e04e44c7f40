//! Logical column types and the registry that resolves them by name.
//!
//! A logical type is an application-level column type with its own SQL
//! declaration and value conversion, independent of the native type the
//! database stores. Types are registered by name against a handler
//! identifier; the registry's handler catalog turns the identifier into a
//! [`LogicalType`] instance.
//!
//! The registry is shared through an `Arc` instead of living in a process
//! global, so every factory, platform and test decides which registry it sees.

pub mod builtin;

use crate::error::{DbError, DbResult};
use crate::platform::{ColumnSpec, Platform};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

pub use builtin::{BuiltinKind, BuiltinType};

/// Application-defined column type.
pub trait LogicalType: fmt::Debug + Send + Sync {
    /// Name the type is registered under.
    fn name(&self) -> &str;

    /// SQL declaration of a column of this type on the given platform.
    fn sql_declaration(&self, column: &ColumnSpec, platform: &Platform) -> String;

    /// Whether schema introspection needs a column comment to recover this type.
    fn requires_sql_comment_hint(&self, _platform: &Platform) -> bool {
        false
    }

    /// Convert an application value to its database representation.
    fn to_database_value(&self, value: &JsonValue, _platform: &Platform) -> DbResult<JsonValue> {
        Ok(value.clone())
    }

    /// Convert a database value to its application representation.
    fn from_database_value(&self, value: &JsonValue, _platform: &Platform) -> DbResult<JsonValue> {
        Ok(value.clone())
    }
}

/// Builds a handler instance for the logical type name it is registered under.
pub type HandlerConstructor = Arc<dyn Fn(&str) -> Arc<dyn LogicalType> + Send + Sync>;

/// Registered type: the handler id it was built from and the live instance.
#[derive(Debug, Clone)]
struct TypeEntry {
    handler: String,
    instance: Arc<dyn LogicalType>,
}

/// Shared registry of logical types.
pub struct TypeRegistry {
    handlers: RwLock<HashMap<String, HandlerConstructor>>,
    types: RwLock<BTreeMap<String, TypeEntry>>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("handlers", &self.handler_ids())
            .field("types", &self.type_names())
            .finish()
    }
}

impl TypeRegistry {
    /// Create an empty registry without handlers or types.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            types: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a registry with every built-in handler available and every
    /// built-in type registered under its own name.
    pub fn with_builtin_types() -> Self {
        let registry = Self::new();
        for kind in BuiltinKind::ALL {
            let kind = *kind;
            registry.register_handler(kind.id(), move |name: &str| -> Arc<dyn LogicalType> {
                Arc::new(BuiltinType::new(name, kind))
            });
            let instance: Arc<dyn LogicalType> = Arc::new(BuiltinType::new(kind.id(), kind));
            registry.write_types().insert(
                kind.id().to_string(),
                TypeEntry {
                    handler: kind.id().to_string(),
                    instance,
                },
            );
        }
        registry
    }

    /// Create a shared registry with the built-in types.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::with_builtin_types())
    }

    /// Make a handler available under `id` for `add_type` / `override_type`.
    pub fn register_handler<F>(&self, id: impl Into<String>, constructor: F)
    where
        F: Fn(&str) -> Arc<dyn LogicalType> + Send + Sync + 'static,
    {
        let id = id.into();
        debug!(handler = %id, "Registering type handler");
        self.write_handlers().insert(id, Arc::new(constructor));
    }

    pub fn has_handler(&self, id: &str) -> bool {
        self.read_handlers().contains_key(id)
    }

    /// Check whether a logical type is registered.
    pub fn has_type(&self, name: &str) -> bool {
        self.read_types().contains_key(name)
    }

    /// Register a new logical type. Fails if the name is already taken.
    pub fn add_type(&self, name: &str, handler: &str) -> DbResult<()> {
        let instance = self.build(name, handler)?;
        let mut types = self.write_types();
        if types.contains_key(name) {
            return Err(DbError::type_exists(name));
        }
        debug!(type_name = %name, handler = %handler, "Adding logical type");
        types.insert(
            name.to_string(),
            TypeEntry {
                handler: handler.to_string(),
                instance,
            },
        );
        Ok(())
    }

    /// Replace the handler of an existing logical type. Fails if the name is unknown.
    pub fn override_type(&self, name: &str, handler: &str) -> DbResult<()> {
        let instance = self.build(name, handler)?;
        let mut types = self.write_types();
        let entry = types
            .get_mut(name)
            .ok_or_else(|| DbError::type_not_found(name))?;
        debug!(
            type_name = %name,
            previous = %entry.handler,
            handler = %handler,
            "Overriding logical type"
        );
        *entry = TypeEntry {
            handler: handler.to_string(),
            instance,
        };
        Ok(())
    }

    /// Look up a logical type by name.
    pub fn get_type(&self, name: &str) -> DbResult<Arc<dyn LogicalType>> {
        self.read_types()
            .get(name)
            .map(|entry| Arc::clone(&entry.instance))
            .ok_or_else(|| DbError::type_not_found(name))
    }

    /// Handler id a type is currently registered with.
    pub fn handler_of(&self, name: &str) -> Option<String> {
        self.read_types().get(name).map(|entry| entry.handler.clone())
    }

    /// Find the name a type instance is registered under.
    pub fn lookup_name(&self, ty: &dyn LogicalType) -> DbResult<String> {
        self.read_types()
            .iter()
            .find(|(_, entry)| std::ptr::addr_eq(Arc::as_ptr(&entry.instance), ty))
            .map(|(name, _)| name.clone())
            .ok_or_else(|| DbError::type_not_found(ty.name()))
    }

    /// Names of all registered types, sorted.
    pub fn type_names(&self) -> Vec<String> {
        self.read_types().keys().cloned().collect()
    }

    fn handler_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read_handlers().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn build(&self, name: &str, handler: &str) -> DbResult<Arc<dyn LogicalType>> {
        let constructor = self
            .read_handlers()
            .get(handler)
            .cloned()
            .ok_or_else(|| DbError::unknown_handler(name, handler))?;
        Ok(constructor(name))
    }

    // Map writes are single inserts, so a poisoned lock still guards consistent data.

    fn read_handlers(&self) -> RwLockReadGuard<'_, HashMap<String, HandlerConstructor>> {
        self.handlers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_handlers(&self) -> RwLockWriteGuard<'_, HashMap<String, HandlerConstructor>> {
        self.handlers.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read_types(&self) -> RwLockReadGuard<'_, BTreeMap<String, TypeEntry>> {
        self.types.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_types(&self) -> RwLockWriteGuard<'_, BTreeMap<String, TypeEntry>> {
        self.types.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtin_types()
    }
}
