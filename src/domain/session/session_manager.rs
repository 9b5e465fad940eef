//! Single shared-password admin gate with time-limited sessions.
//!
//! A successful login hands out an opaque bearer token. Only the token digest is
//! kept, mapped to the roles it grants and its expiry. Expired sessions are dropped
//! lazily on lookup and periodically by a background purge task.

use crate::crypto::{digests_equal, generate_token, hash_secret, hash_token};
use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

/// Capability a session may hold. Only one exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
}

/// Who is calling a core operation. Passed explicitly into every admin operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    roles: Vec<Role>,
    expires_at: Option<DateTime<Utc>>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_roles(roles: Vec<Role>, expires_at: DateTime<Utc>) -> Self {
        Self {
            roles,
            expires_at: Some(expires_at),
        }
    }

    /// Roles held by a context that has not yet expired.
    pub fn has_role(&self, role: Role) -> bool {
        let live = self.expires_at.map_or(true, |at| at > Utc::now());
        live && self.roles.contains(&role)
    }

    /// Fails with an authorization error unless the session holds `role`.
    ///
    /// A context kept past its session's expiry no longer grants anything.
    pub fn require(&self, role: Role) -> CoreResult<()> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(CoreError::Authorization(format!("{:?} role required", role)))
        }
    }
}

/// Token handed back by a successful login.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

struct SessionEntry {
    roles: Vec<Role>,
    expires_at: DateTime<Utc>,
}

pub struct SessionManager {
    admin_digest: [u8; 32],
    ttl: Duration,
    sessions: Arc<Mutex<HashMap<[u8; 32], SessionEntry>>>,
    /// Stops the background purge task.
    shutdown: Arc<Notify>,
}

impl SessionManager {
    pub fn new(admin_password: &str, ttl: Duration) -> Self {
        Self {
            admin_digest: hash_secret(admin_password),
            ttl,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Checks the shared password and opens an admin session.
    pub async fn login(&self, password: &str) -> CoreResult<SessionToken> {
        if !digests_equal(&hash_secret(password), &self.admin_digest) {
            warn!("admin login rejected");
            return Err(CoreError::Authorization("invalid credentials".to_string()));
        }

        let token = generate_token();
        let ttl = chrono::Duration::from_std(self.ttl)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        let expires_at = Utc::now() + ttl;

        self.sessions.lock().await.insert(
            hash_token(&token),
            SessionEntry {
                roles: vec![Role::Admin],
                expires_at,
            },
        );
        info!(%expires_at, "admin session opened");
        Ok(SessionToken { token, expires_at })
    }

    /// Ends a session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) {
        if self.sessions.lock().await.remove(&hash_token(token)).is_some() {
            info!("admin session closed");
        }
    }

    /// Resolves a bearer token to its context; unknown or expired tokens are anonymous.
    pub async fn resolve(&self, token: Option<&str>) -> SessionContext {
        let Some(token) = token else {
            return SessionContext::anonymous();
        };
        let key = hash_token(token);
        let mut sessions = self.sessions.lock().await;
        match sessions.get(&key) {
            Some(entry) if entry.expires_at > Utc::now() => {
                SessionContext::with_roles(entry.roles.clone(), entry.expires_at)
            }
            Some(_) => {
                sessions.remove(&key);
                debug!("expired session dropped");
                SessionContext::anonymous()
            }
            None => SessionContext::anonymous(),
        }
    }

    /// Removes every expired session and returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, e| e.expires_at > now);
        before - sessions.len()
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Periodically purges expired sessions until [`shutdown`](Self::shutdown) is called.
    pub fn start_background_purge_task(self: Arc<Self>, every: Duration) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let dropped = self.purge_expired().await;
                        if dropped > 0 {
                            debug!(dropped, "purged expired sessions");
                        }
                    }
                    _ = self.shutdown.notified() => {
                        debug!("session purge task stopped");
                        break;
                    }
                }
            }
        });
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let gate = SessionManager::new("secret", Duration::from_secs(60));
        let err = gate.login("Secret").await.unwrap_err();
        assert!(matches!(err, CoreError::Authorization(_)));
        assert_eq!(gate.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn login_grants_admin_until_logout() {
        let gate = SessionManager::new("secret", Duration::from_secs(60));
        let session = gate.login("secret").await.unwrap();

        let ctx = gate.resolve(Some(&session.token)).await;
        assert!(ctx.require(Role::Admin).is_ok());
        assert_eq!(
            ctx,
            SessionContext::with_roles(vec![Role::Admin], session.expires_at)
        );

        gate.logout(&session.token).await;
        let ctx = gate.resolve(Some(&session.token)).await;
        assert!(matches!(ctx.require(Role::Admin), Err(CoreError::Authorization(_))));
    }

    #[tokio::test]
    async fn unknown_and_missing_tokens_are_anonymous() {
        let gate = SessionManager::new("secret", Duration::from_secs(60));
        assert_eq!(gate.resolve(None).await, SessionContext::anonymous());
        assert_eq!(gate.resolve(Some("deadbeef")).await, SessionContext::anonymous());
    }

    #[test]
    fn context_held_past_expiry_grants_nothing() {
        let expired_at = Utc::now() - chrono::Duration::seconds(1);
        let stale = SessionContext::with_roles(vec![Role::Admin], expired_at);
        assert!(matches!(stale.require(Role::Admin), Err(CoreError::Authorization(_))));
        assert!(SessionContext::anonymous().require(Role::Admin).is_err());
    }

    #[tokio::test]
    async fn shutdown_before_first_wait_still_stops_purge_task() {
        let gate = Arc::new(SessionManager::new("secret", Duration::from_secs(60)));
        gate.clone().start_background_purge_task(Duration::from_millis(5));
        gate.shutdown();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(Arc::strong_count(&gate), 1);
    }

    #[tokio::test]
    async fn expired_sessions_are_dropped() {
        let gate = SessionManager::new("secret", Duration::from_millis(1));
        let session = gate.login("secret").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!gate.resolve(Some(&session.token)).await.has_role(Role::Admin));
        assert_eq!(gate.active_sessions().await, 0);

        gate.login("secret").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(gate.purge_expired().await, 1);
    }
}
