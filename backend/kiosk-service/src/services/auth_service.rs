use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use kiosk_core::SessionUser;

use crate::config::AdminConfig;
use crate::error::{AppError, Result};

/// Checks dashboard credentials against the configured admin account.
#[derive(Clone)]
pub struct AuthService {
    username: String,
    password: String,
}

impl AuthService {
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<SessionUser> {
        if username == self.username && password == self.password {
            info!(username = %username, "Admin logged in");
            Ok(SessionUser::admin(username))
        } else {
            warn!(username = %username, "Rejected login attempt");
            Err(AppError::InvalidCredentials)
        }
    }
}

struct Session {
    user: SessionUser,
    expires_at: Instant,
}

/// Server-side sessions keyed by an opaque cookie value. A session ends on
/// logout or once it has been idle for the configured time to live.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn create(&self, user: SessionUser) -> String {
        let now = Instant::now();
        self.prune(now);

        let id = Uuid::new_v4().to_string();
        self.sessions.insert(
            id.clone(),
            Session {
                user,
                expires_at: now + self.ttl,
            },
        );
        id
    }

    /// Look a session up and extend it. Expired sessions are dropped.
    pub fn get(&self, id: &str) -> Option<SessionUser> {
        let now = Instant::now();
        {
            let mut session = self.sessions.get_mut(id)?;
            if session.expires_at > now {
                session.expires_at = now + self.ttl;
                return Some(session.user.clone());
            }
        }

        self.sessions.remove_if(id, |_, session| session.expires_at <= now);
        debug!("Expired session rejected");
        None
    }

    pub fn destroy(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }

    fn prune(&self, now: Instant) {
        let before = self.len();
        self.sessions.retain(|_, session| session.expires_at > now);
        let pruned = before.saturating_sub(self.len());
        if pruned > 0 {
            debug!(pruned, active = self.len(), "Pruned expired sessions");
        }
    }
}
