//! Server-side session store keyed by an opaque token.
//!
//! Sessions expire `ttl` after sign-in. Expired entries are dropped on lookup
//! and swept whenever a new session is opened.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn is_expired(&self, ttl: TimeDelta, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at) >= ttl
    }
}

#[derive(Clone)]
pub struct SessionStore {
    r: Arc<RwLock<HashMap<String, Session>>>,
    ttl: TimeDelta,
}

impl SessionStore {
    pub fn new(ttl: TimeDelta) -> Self {
        Self {
            r: Arc::default(),
            ttl,
        }
    }

    /// Opens a session for `user_id` and returns its token.
    pub fn create(&self, user_id: Uuid) -> String {
        self.create_at(user_id, Utc::now())
    }

    fn create_at(&self, user_id: Uuid, now: DateTime<Utc>) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let session = Session {
            user_id,
            created_at: now,
        };

        let mut sessions = self.r.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(self.ttl, now));
        if sessions.len() < before {
            log::debug!("swept {} expired sessions", before - sessions.len());
        }
        sessions.insert(token.clone(), session);
        token
    }

    pub fn get(&self, token: &str) -> Option<Session> {
        self.get_at(token, Utc::now())
    }

    fn get_at(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        let session = self
            .r
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(token)
            .cloned()?;

        if session.is_expired(self.ttl, now) {
            self.destroy(token);
            return None;
        }
        Some(session)
    }

    /// Drops everything held for `token`. Returns whether a session existed.
    pub fn destroy(&self, token: &str) -> bool {
        self.r
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(token)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.r
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(TimeDelta::hours(1))
    }

    #[test]
    fn created_session_is_retrievable() {
        let store = store();
        let user = Uuid::new_v4();

        let token = store.create(user);

        assert_eq!(store.get(&token).map(|s| s.user_id), Some(user));
        assert_eq!(token.len(), 32);
    }

    #[test]
    fn tokens_are_unique_per_login() {
        let store = store();
        let user = Uuid::new_v4();
        assert_ne!(store.create(user), store.create(user));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn destroy_clears_only_that_session() {
        let store = store();
        let a = store.create(Uuid::new_v4());
        let b = store.create(Uuid::new_v4());

        assert!(store.destroy(&a));
        assert!(!store.destroy(&a));
        assert!(store.get(&a).is_none());
        assert!(store.get(&b).is_some());
    }

    #[test]
    fn clones_share_state() {
        let store = store();
        let handle = store.clone();
        let token = store.create(Uuid::new_v4());
        assert!(handle.get(&token).is_some());
    }

    #[test]
    fn expired_token_resolves_to_none() {
        let store = store();
        let signed_in = Utc::now() - TimeDelta::hours(2);
        let token = store.create_at(Uuid::new_v4(), signed_in);

        assert!(store.get_at(&token, signed_in).is_some());
        assert!(store.get(&token).is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn session_expires_exactly_at_ttl() {
        let store = store();
        let signed_in = Utc::now();
        let token = store.create_at(Uuid::new_v4(), signed_in);

        let almost = signed_in + TimeDelta::minutes(59);
        assert!(store.get_at(&token, almost).is_some());
        assert!(store.get_at(&token, signed_in + TimeDelta::hours(1)).is_none());
    }

    #[test]
    fn new_sign_in_sweeps_expired_sessions() {
        let store = store();
        let long_ago = Utc::now() - TimeDelta::days(1);
        for _ in 0..3 {
            store.create_at(Uuid::new_v4(), long_ago);
        }
        assert_eq!(store.len(), 3);

        let fresh = store.create(Uuid::new_v4());

        assert_eq!(store.len(), 1);
        assert!(store.get(&fresh).is_some());
    }
}
