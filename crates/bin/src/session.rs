//! Session management for web interface
//!
//! Provides in-memory session storage mapping session tokens to logged-in users.

use std::{collections::HashMap, sync::Arc};

use intentions::auth::{constant_time_eq, generate_token};
use intentions::store::User;
use tokio::sync::RwLock;

/// Session token (random hex stored in cookie)
pub type SessionToken = String;

/// A logged-in user and the anti-forgery token issued with the session.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub csrf_token: String,
}

impl Session {
    /// Check a submitted anti-forgery token against the session's.
    pub fn csrf_matches(&self, candidate: Option<&str>) -> bool {
        candidate.is_some_and(|c| constant_time_eq(c, &self.csrf_token))
    }
}

/// In-memory session store
///
/// Sessions are ephemeral and lost on server restart. Only the user id is
/// kept; handlers reload the user row so preference changes are seen at once.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionToken, Session>>>,
}

impl SessionStore {
    /// Create a new empty session store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session for a user.
    ///
    /// Returns the session token to be stored in a cookie, together with the
    /// session holding its anti-forgery token.
    pub async fn create_session(&self, user: &User) -> (SessionToken, Session) {
        let token = generate_token();
        let session = Session {
            user_id: user.id,
            username: user.username.clone(),
            csrf_token: generate_token(),
        };
        let mut sessions = self.sessions.write().await;
        sessions.insert(token.clone(), session.clone());
        (token, session)
    }

    /// Get the session for a token
    pub async fn get(&self, token: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions.get(token).cloned()
    }

    /// Destroy a session
    pub async fn destroy_session(&self, token: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(token);
    }

    /// Get the number of active sessions (for the health endpoint)
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}
