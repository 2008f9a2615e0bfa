//! Persisted, observable session stores.
//!
//! A [`TokenStore`] owns one session value behind a `watch` channel. Every mutation replaces
//! the whole snapshot under the channel's write lock and persists it before releasing, so a
//! reader can never observe a token without its user, and the file on disk is written in the
//! same order as the mutations that produced it.

use std::fmt;
use std::sync::Arc;

use radmin_core::{
    ADMIN_STORE_KEY, AdminSession, Advertisement, Credentials, OperatingMode, PORTAL_STORE_KEY,
    PortalSession, SESSION_FORMAT_VERSION, SessionState, User,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::backend::KeyValueStore;
use crate::error::StorageError;

/// What readers observe: the session plus whether storage has been read yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot<S> {
    pub state: S,
    /// False until the persisted value has been read back; never flips back afterwards.
    pub has_hydrated: bool,
}

#[derive(Serialize, Deserialize)]
struct Envelope<S> {
    version: u32,
    state: S,
}

pub struct TokenStore<S: SessionState> {
    key: String,
    backend: Arc<dyn KeyValueStore>,
    tx: watch::Sender<StoreSnapshot<S>>,
}

pub type AdminStore = TokenStore<AdminSession>;
pub type PortalStore = TokenStore<PortalSession>;

impl<S: SessionState> fmt::Debug for TokenStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.tx.borrow();
        f.debug_struct("TokenStore")
            .field("key", &self.key)
            .field("has_hydrated", &snapshot.has_hydrated)
            .field("authenticated", &snapshot.state.is_authenticated())
            .finish()
    }
}

impl<S: SessionState> TokenStore<S> {
    /// Creates an unhydrated store; call [`TokenStore::hydrate`] to read persisted state.
    pub fn new(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let (tx, _) = watch::channel(StoreSnapshot::default());
        Self { key: key.into(), backend, tx }
    }

    /// Creates and hydrates in one step.
    pub fn open(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let store = Self::new(backend, key);
        store.hydrate();
        store
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads persisted state and marks the store hydrated.
    ///
    /// Unreadable, corrupt or incompatible data hydrates as logged out. Calling this again
    /// after hydration is a no-op.
    pub fn hydrate(&self) {
        if self.has_hydrated() {
            return;
        }
        let state = match self.load() {
            Ok(Some(state)) => state,
            Ok(None) => S::default(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "discarding unreadable session state");
                S::default()
            },
        };
        self.tx.send_modify(|snapshot| {
            if !snapshot.has_hydrated {
                snapshot.state = state;
                snapshot.has_hydrated = true;
            }
        });
        tracing::debug!(key = %self.key, "session store hydrated");
    }

    /// Synchronous read of the current value, for non-reactive callers.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot<S> {
        self.tx.borrow().clone()
    }

    /// Reactive view; every mutation notifies all receivers.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot<S>> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn has_hydrated(&self) -> bool {
        self.tx.borrow().has_hydrated
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.tx.borrow().state.token().map(str::to_owned)
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.tx.borrow().state.user().cloned()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().state.is_authenticated()
    }

    /// Sets token, user and the variant's extra fields together. A blank token is
    /// rejected and leaves the session untouched.
    pub fn login(&self, token: impl Into<String>, user: User, extra: S::LoginExtra) -> bool {
        let token = token.into();
        if token.trim().is_empty() {
            tracing::warn!(key = %self.key, "login without a token ignored");
            return false;
        }
        let credentials = Credentials::new(token, user);
        self.mutate(|state| {
            state.login(credentials, extra);
            true
        });
        tracing::info!(key = %self.key, "session started");
        true
    }

    /// Clears the session. Returns whether anything was cleared; a second call is a no-op.
    pub fn logout(&self) -> bool {
        let cleared = self.mutate(|state| {
            if *state == S::default() {
                return false;
            }
            state.clear();
            true
        });
        if cleared {
            tracing::info!(key = %self.key, "session cleared");
        }
        cleared
    }

    /// Replaces the user while keeping the token. Ignored when logged out.
    pub fn set_user(&self, user: User) -> bool {
        self.mutate(|state| match state.user_mut() {
            Some(current) if *current != user => {
                *current = user;
                true
            },
            _ => false,
        })
    }

    /// Applies `f` under the write lock and persists when it reports a change.
    pub(crate) fn mutate(&self, f: impl FnOnce(&mut S) -> bool) -> bool {
        self.tx.send_if_modified(|snapshot| {
            snapshot.has_hydrated = true;
            if !f(&mut snapshot.state) {
                return false;
            }
            self.persist(&snapshot.state);
            true
        })
    }

    fn load(&self) -> Result<Option<S>, StorageError> {
        let Some(raw) = self.backend.read(&self.key)? else {
            return Ok(None);
        };
        let serialization = |source| StorageError::Serialization { key: self.key.clone(), source };
        let value: Value = serde_json::from_str(&raw).map_err(serialization)?;
        let version = value.get("version").and_then(Value::as_u64).unwrap_or(0);
        if version != u64::from(SESSION_FORMAT_VERSION) {
            return Err(StorageError::UnsupportedVersion {
                key: self.key.clone(),
                found: u32::try_from(version).unwrap_or(u32::MAX),
                expected: SESSION_FORMAT_VERSION,
            });
        }
        let envelope: Envelope<S> = serde_json::from_value(value).map_err(serialization)?;
        Ok(Some(envelope.state))
    }

    fn persist(&self, state: &S) {
        let result = if *state == S::default() {
            self.backend.remove(&self.key)
        } else {
            let envelope = Envelope { version: SESSION_FORMAT_VERSION, state };
            serde_json::to_string(&envelope)
                .map_err(|source| StorageError::Serialization { key: self.key.clone(), source })
                .and_then(|json| self.backend.write(&self.key, &json))
        };
        if let Err(e) = result {
            tracing::warn!(key = %self.key, error = %e, "failed to persist session state");
        }
    }
}

impl TokenStore<AdminSession> {
    /// Admin store under its dedicated key, hydrated.
    pub fn open_admin(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::open(backend, ADMIN_STORE_KEY)
    }

    #[must_use]
    pub fn operating_mode(&self) -> Option<OperatingMode> {
        self.tx.borrow().state.operating_mode
    }

    /// Records the backend's operating mode; only meaningful while logged in.
    pub fn set_operating_mode(&self, mode: OperatingMode) -> bool {
        self.mutate(|state| {
            if state.credentials.is_none() || state.operating_mode == Some(mode) {
                return false;
            }
            state.operating_mode = Some(mode);
            true
        })
    }
}

impl TokenStore<PortalSession> {
    /// Portal-user store under its dedicated key, hydrated.
    pub fn open_portal(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::open(backend, PORTAL_STORE_KEY)
    }

    /// Returns the advertisement attached at login and clears it; later calls get `None`.
    pub fn take_pending_ad(&self) -> Option<Advertisement> {
        let mut taken = None;
        self.mutate(|state| {
            taken = state.pending_ad.take();
            taken.is_some()
        });
        taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FileStore, MemoryStore};
    use serde_json::json;

    fn user(name: &str) -> User {
        serde_json::from_value(json!({"id": 1, "username": name})).unwrap()
    }

    fn memory() -> (MemoryStore, Arc<dyn KeyValueStore>) {
        let store = MemoryStore::new();
        let backend: Arc<dyn KeyValueStore> = Arc::new(store.clone());
        (store, backend)
    }

    fn consistent<S: SessionState>(store: &TokenStore<S>) -> bool {
        let snapshot = store.snapshot();
        snapshot.state.token().is_some() == snapshot.state.user().is_some()
    }

    #[test]
    fn test_token_and_user_always_move_together() {
        let (_, backend) = memory();
        let store = AdminStore::open_admin(backend);
        assert!(consistent(&store));

        assert!(!store.set_user(user("ghost")));
        assert!(store.user().is_none());
        assert!(consistent(&store));

        assert!(!store.login("", user("nobody"), None));
        assert!(!store.login("   ", user("nobody"), None));
        assert!(store.user().is_none());
        assert!(!store.is_authenticated());
        assert!(consistent(&store));

        assert!(store.login("t1", user("alice"), None));
        assert!(consistent(&store));
        assert!(!store.login("", user("mallory"), None));
        assert_eq!(store.user().unwrap().username.as_deref(), Some("alice"));
        assert!(store.set_user(user("alice2")));
        assert_eq!(store.token().as_deref(), Some("t1"));
        assert_eq!(store.user().unwrap().username.as_deref(), Some("alice2"));

        store.logout();
        assert!(consistent(&store));
        assert!(store.token().is_none());
        assert!(store.user().is_none());

        store.login("t2", user("bob"), Some(OperatingMode::Aaa));
        store.login("t3", user("carol"), None);
        assert!(consistent(&store));
        assert_eq!(store.operating_mode(), None);
    }

    #[test]
    fn test_logout_is_idempotent() {
        let (raw, backend) = memory();
        let store = AdminStore::open_admin(backend);
        store.login("t", user("alice"), Some(OperatingMode::Mikrotik));

        assert!(store.logout());
        let once = store.snapshot();
        assert!(!store.logout());
        assert_eq!(store.snapshot(), once);
        assert_eq!(once.state, AdminSession::default());
        assert!(raw.keys().is_empty());
    }

    #[test]
    fn test_stores_are_isolated() {
        let (raw, backend) = memory();
        let admin = AdminStore::open_admin(Arc::clone(&backend));
        let portal = PortalStore::open_portal(backend);

        admin.login("admin-token", user("root"), None);
        portal.login("portal-token", user("guest"), None);
        assert_eq!(raw.keys(), vec![ADMIN_STORE_KEY.to_owned(), PORTAL_STORE_KEY.to_owned()]);

        portal.logout();
        assert_eq!(admin.token().as_deref(), Some("admin-token"));
        assert_eq!(raw.keys(), vec![ADMIN_STORE_KEY.to_owned()]);
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let backend: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir.path()));
        {
            let store = AdminStore::open_admin(Arc::clone(&backend));
            store.login("persisted", user("alice"), None);
            assert!(store.set_operating_mode(OperatingMode::Mikrotik));
        }
        let reopened = AdminStore::open_admin(backend);
        assert_eq!(reopened.token().as_deref(), Some("persisted"));
        assert_eq!(reopened.operating_mode(), Some(OperatingMode::Mikrotik));

        let raw = std::fs::read_to_string(dir.path().join("radmin-admin-session.json")).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["state"]["operatingMode"], "Mikrotik");
    }

    #[test]
    fn test_unhydrated_until_hydrate() {
        let (raw, backend) = memory();
        raw.write(
            ADMIN_STORE_KEY,
            &json!({"version": 1, "state": {"token": "t", "user": {"username": "a"}}}).to_string(),
        )
        .unwrap();
        let store = AdminStore::new(backend, ADMIN_STORE_KEY);
        assert!(!store.has_hydrated());
        assert!(store.token().is_none());

        store.hydrate();
        assert!(store.has_hydrated());
        assert_eq!(store.token().as_deref(), Some("t"));
    }

    #[test]
    fn test_corrupt_or_foreign_state_fails_closed() {
        let (raw, backend) = memory();
        raw.write(ADMIN_STORE_KEY, "{not json").unwrap();
        let store = AdminStore::open_admin(Arc::clone(&backend));
        assert!(store.has_hydrated());
        assert!(!store.is_authenticated());

        raw.write(
            PORTAL_STORE_KEY,
            &json!({"version": 99, "state": {"token": "t", "user": {}}}).to_string(),
        )
        .unwrap();
        let portal = PortalStore::open_portal(backend);
        assert!(portal.has_hydrated());
        assert!(!portal.is_authenticated());
    }

    #[test]
    fn test_write_failure_is_not_surfaced() {
        struct ReadOnly;
        impl KeyValueStore for ReadOnly {
            fn read(&self, _: &str) -> Result<Option<String>, StorageError> {
                Ok(None)
            }
            fn write(&self, key: &str, _: &str) -> Result<(), StorageError> {
                Err(StorageError::InvalidKey(key.to_owned()))
            }
            fn remove(&self, key: &str) -> Result<(), StorageError> {
                Err(StorageError::InvalidKey(key.to_owned()))
            }
        }

        let store = AdminStore::open_admin(Arc::new(ReadOnly));
        store.login("t", user("alice"), None);
        assert_eq!(store.token().as_deref(), Some("t"));
        assert!(store.logout());
        assert!(store.token().is_none());
    }

    #[test]
    fn test_pending_ad_is_consumed_once() {
        let (_, backend) = memory();
        let portal = PortalStore::open_portal(backend);
        let ad = Advertisement { title: Some("welcome".to_owned()), ..Advertisement::default() };
        portal.login("t", user("guest"), Some(ad.clone()));

        assert_eq!(portal.take_pending_ad(), Some(ad));
        assert_eq!(portal.take_pending_ad(), None);
        assert!(portal.is_authenticated());
    }

    #[test]
    fn test_operating_mode_requires_session() {
        let (_, backend) = memory();
        let store = AdminStore::open_admin(backend);
        assert!(!store.set_operating_mode(OperatingMode::Aaa));
        store.login("t", user("alice"), None);
        assert!(store.set_operating_mode(OperatingMode::Aaa));
        assert!(!store.set_operating_mode(OperatingMode::Aaa));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let (_, backend) = memory();
        let store = AdminStore::open_admin(backend);
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.login("t", user("alice"), None);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state.token(), Some("t"));

        store.logout();
        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update().state.is_authenticated());

        assert!(!store.logout());
        assert!(!rx.has_changed().unwrap());
    }
}
