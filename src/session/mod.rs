//! Client session context.
//!
//! The bearer token, user id and current workspace id live in an explicit
//! [`Session`] backed by an injectable [`SessionStore`]. The SQLite store
//! keeps them across runs; [`MemoryStore`] serves tests and one-off use.

mod sqlite;

pub use sqlite::SqliteSessionStore;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::SessionResult;

/// Storage key for the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key for the authenticated user id.
pub const USER_ID_KEY: &str = "userId";
/// Storage key for the last visited workspace.
pub const CURRENT_WORKSPACE_KEY: &str = "currentWorkspaceId";

/// Key-value backing store for session values.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> SessionResult<Option<String>>;
    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> SessionResult<()>;
    /// Delete a value. Missing keys are not an error.
    async fn remove(&self, key: &str) -> SessionResult<()>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: &str) -> SessionResult<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> SessionResult<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }
}

/// Snapshot of the values a session holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub token: Option<String>,
    pub user_id: Option<String>,
    pub current_workspace_id: Option<String>,
}

/// Shared session context. Cloning shares the same state.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
    state: Arc<RwLock<SessionState>>,
}

impl Session {
    /// Load a session from the given store.
    pub async fn load(store: Arc<dyn SessionStore>) -> SessionResult<Self> {
        let token = store.get(TOKEN_KEY).await?.filter(|t| !t.is_empty());
        let user_id = store.get(USER_ID_KEY).await?.filter(|u| !u.is_empty());
        let current_workspace_id = store
            .get(CURRENT_WORKSPACE_KEY)
            .await?
            .filter(|w| !w.is_empty());

        debug!(
            authenticated = token.is_some(),
            workspace = ?current_workspace_id,
            "Session loaded"
        );

        Ok(Self {
            store,
            state: Arc::new(RwLock::new(SessionState {
                token,
                user_id,
                current_workspace_id,
            })),
        })
    }

    /// Empty session over a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            state: Arc::new(RwLock::new(SessionState::default())),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn token(&self) -> Option<String> {
        self.snapshot().token
    }

    pub fn user_id(&self) -> Option<String> {
        self.snapshot().user_id
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().token.is_some()
    }

    pub fn current_workspace_id(&self) -> Option<String> {
        self.snapshot().current_workspace_id
    }

    /// Store a new token and user id. An empty token logs out instead.
    ///
    /// The user id is written first so a stored token always has its user.
    /// If the token write fails the previous user id is put back.
    pub async fn login(&self, token: &str, user_id: &str) -> SessionResult<()> {
        if token.is_empty() {
            return self.logout().await;
        }

        let previous_user = self.user_id();
        self.store.set(USER_ID_KEY, user_id).await?;
        if let Err(e) = self.store.set(TOKEN_KEY, token).await {
            let rollback = match previous_user.as_deref() {
                Some(previous) => self.store.set(USER_ID_KEY, previous).await,
                None => self.store.remove(USER_ID_KEY).await,
            };
            if let Err(rollback_err) = rollback {
                warn!(error = %rollback_err, "Failed to restore user id after login error");
            }
            return Err(e);
        }

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.token = Some(token.to_string());
        state.user_id = Some(user_id.to_string()).filter(|u| !u.is_empty());
        Ok(())
    }

    /// Forget token and user id. The workspace selection is kept.
    pub async fn logout(&self) -> SessionResult<()> {
        self.store.remove(TOKEN_KEY).await?;
        self.store.remove(USER_ID_KEY).await?;

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.token = None;
        state.user_id = None;
        Ok(())
    }

    /// Remember the workspace the user navigated to.
    pub async fn set_current_workspace(&self, workspace_id: &str) -> SessionResult<()> {
        self.store.set(CURRENT_WORKSPACE_KEY, workspace_id).await?;

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.current_workspace_id = Some(workspace_id.to_string());
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.snapshot();
        f.debug_struct("Session")
            .field("authenticated", &state.token.is_some())
            .field("user_id", &state.user_id)
            .field("current_workspace_id", &state.current_workspace_id)
            .finish()
    }
}
