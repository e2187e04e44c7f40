//! Connection lifecycle listeners.

use crate::models::DatabaseType;
use std::fmt;
use std::sync::Arc;

/// Payload passed to `post_connect` listeners.
#[derive(Debug, Clone)]
pub struct ConnectEvent {
    pub db_type: DatabaseType,
    /// Connection URL with the password masked.
    pub url: String,
}

pub type ConnectListener = Arc<dyn Fn(&ConnectEvent) + Send + Sync>;

/// Listeners attached to a connection.
#[derive(Clone, Default)]
pub struct EventHooks {
    post_connect: Vec<ConnectListener>,
}

impl fmt::Debug for EventHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHooks")
            .field("post_connect", &self.post_connect.len())
            .finish()
    }
}

impl EventHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener run once the connection's pool is established.
    pub fn on_post_connect<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&ConnectEvent) + Send + Sync + 'static,
    {
        self.post_connect.push(Arc::new(listener));
        self
    }

    pub(crate) fn dispatch_post_connect(&self, event: &ConnectEvent) {
        for listener in &self.post_connect {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.post_connect.len()
    }

    pub fn is_empty(&self) -> bool {
        self.post_connect.is_empty()
    }
}
