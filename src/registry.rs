//! Online user registry
//!
//! Maps each current display name to its session. Reads (`snapshot`,
//! `lookup`, `sessions`) share the lock; `insert`, `remove` and `rename`
//! take it exclusively and never release it midway, so no reader can see
//! a name in transit.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::RegistryError;
use crate::session::UserSession;

/// One `who` entry: (name, address)
pub type DirectoryEntry = (String, String);

/// Name → session mapping for currently online users
///
/// Owned by the `ChatServer` root context and shared by reference with
/// every connection and the broadcaster.
#[derive(Debug, Default)]
pub struct Registry {
    sessions: RwLock<HashMap<String, Arc<UserSession>>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its current name
    ///
    /// Fails without touching the mapping if the name is already taken.
    pub async fn insert(&self, session: Arc<UserSession>) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.write().await;
        let name = session.name();
        if sessions.contains_key(&name) {
            return Err(RegistryError::NameTaken(name));
        }
        sessions.insert(name, session);
        debug!("Registry size: {}", sessions.len());
        Ok(())
    }

    /// Remove whatever session is registered under `name`
    pub async fn remove(&self, name: &str) -> Option<Arc<UserSession>> {
        self.sessions.write().await.remove(name)
    }

    /// Remove `session` under its current name, if it is still the one
    /// registered there
    ///
    /// Returns true if an entry was removed.
    pub async fn remove_session(&self, session: &UserSession) -> bool {
        let mut sessions = self.sessions.write().await;
        let name = session.name();
        let owned = sessions
            .get(&name)
            .map_or(false, |registered| registered.id == session.id);
        if owned {
            sessions.remove(&name);
            debug!("Registry size: {}", sessions.len());
        }
        owned
    }

    /// Move `session` from `old_name` to `new_name` in one step
    ///
    /// On `NameTaken` nothing changes, including the session's own name.
    pub async fn rename(
        &self,
        old_name: &str,
        new_name: &str,
        session: &Arc<UserSession>,
    ) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(new_name) {
            return Err(RegistryError::NameTaken(new_name.to_string()));
        }

        if sessions
            .get(old_name)
            .map_or(false, |registered| registered.id == session.id)
        {
            sessions.remove(old_name);
        }
        sessions.insert(new_name.to_string(), Arc::clone(session));
        session.set_name(new_name.to_string());
        Ok(())
    }

    /// All (name, address) pairs, in no particular order
    pub async fn snapshot(&self) -> Vec<DirectoryEntry> {
        self.sessions
            .read()
            .await
            .iter()
            .map(|(name, session)| (name.clone(), session.address.clone()))
            .collect()
    }

    /// All registered sessions, in no particular order
    pub async fn sessions(&self) -> Vec<Arc<UserSession>> {
        self.sessions.read().await.values().cloned().collect()
    }

    /// Find the session registered under `name`
    pub async fn lookup(&self, name: &str) -> Option<Arc<UserSession>> {
        self.sessions.read().await.get(name).cloned()
    }

    /// Number of online users
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Check whether nobody is online
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
