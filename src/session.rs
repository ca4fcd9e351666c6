use rand::RngCore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::watch;

use crate::{
    models::{CredentialRecord, SessionSnapshot},
    storage::{SecureStore, StorageState},
    token::is_valid_token,
};

/// Storage keys owned by the session.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const USER_ID: &str = "_id";
    pub const ROLE: &str = "role";
    pub const NAME: &str = "name";
    pub const IS_APPROVED: &str = "isApproved";
    /// Lives in session-scoped storage, not the persistent store.
    pub const CSRF_TOKEN: &str = "csrf_token";
}

/// SessionError
///
/// The only session failures a caller ever sees. Storage faults and corrupted
/// stored sessions are recovered internally and never show up here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The login token failed validation, or the user id, role or name was
    /// empty. Storage has already been cleared.
    #[error("invalid credential: token failed validation or identity is incomplete")]
    InvalidCredential,
    #[error("session has been disposed")]
    Disposed,
}

/// SessionManager
///
/// The authentication state machine for the portal:
///
/// ```text
/// Loading --check_auth_status--> Authenticated | Unauthenticated
/// ```
///
/// `Loading` is only ever the initial state. One manager is constructed at
/// startup and shared via `SessionState`; consumers read snapshots or
/// subscribe to changes rather than reaching for ambient globals.
///
/// Transitions are serialized by an internal lock, so `login`, `logout` and
/// `check_auth_status` never interleave their storage accesses.
pub struct SessionManager {
    store: SecureStore,
    session_store: SecureStore,
    // Source of truth for `snapshot()`; the watch channel only fans changes out.
    current: Mutex<SessionSnapshot>,
    tx: Mutex<Option<watch::Sender<SessionSnapshot>>>,
    rx: watch::Receiver<SessionSnapshot>,
    ops: Mutex<()>,
}

/// SessionState
///
/// Shared handle to the single session of the process.
pub type SessionState = Arc<SessionManager>;

impl SessionManager {
    /// new
    ///
    /// `persistent` holds the credential record and survives restarts;
    /// `session` holds per-session data such as the CSRF token.
    pub fn new(persistent: StorageState, session: StorageState) -> Self {
        let (tx, rx) = watch::channel(SessionSnapshot::loading());
        Self {
            store: SecureStore::new(persistent, "persistent"),
            session_store: SecureStore::new(session, "session"),
            current: Mutex::new(SessionSnapshot::loading()),
            tx: Mutex::new(Some(tx)),
            rx,
            ops: Mutex::new(()),
        }
    }

    /// init
    ///
    /// Entry action: resolves the initial `Loading` state from storage.
    pub fn init(&self) -> SessionSnapshot {
        tracing::debug!("initializing session from storage");
        self.check_auth_status()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// subscribe
    ///
    /// Receiver that observes every published snapshot. Its `changed()` errors
    /// once the session has been disposed.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.rx.clone()
    }

    pub fn persistent_store(&self) -> &SecureStore {
        &self.store
    }

    pub fn session_store(&self) -> &SecureStore {
        &self.session_store
    }

    /// check_auth_status
    ///
    /// Re-reads the credential record. The session is authenticated iff a
    /// token is stored, passes `is_valid_token`, and user id, role and name are
    /// all present. A stored token that fails validation, or a storage fault
    /// while reading any credential field, is treated as a corrupted session:
    /// the whole persistent store is wiped.
    ///
    /// Changes made to storage by another process are only picked up here.
    pub fn check_auth_status(&self) -> SessionSnapshot {
        let _guard = self.lock_ops();

        let mut faulted = false;
        let mut read = |key: &str| match self.store.try_get_item(key) {
            Ok(value) => value,
            Err(_) => {
                faulted = true;
                None
            }
        };

        let token = read(keys::TOKEN).filter(|v| !v.is_empty());
        let user_id = read(keys::USER_ID).filter(|v| !v.is_empty());
        let role = read(keys::ROLE).filter(|v| !v.is_empty());
        let name = read(keys::NAME).filter(|v| !v.is_empty());
        let is_approved = read(keys::IS_APPROVED).map(|v| v == "true");

        if faulted {
            tracing::warn!("credential record could not be read, clearing corrupted session");
            self.store.clear();
            return self.publish(SessionSnapshot::unauthenticated());
        }

        let next = match (token, user_id, role, name) {
            (Some(token), _, _, _) if !is_valid_token(&token) => {
                tracing::warn!("stored token failed validation, clearing corrupted session");
                self.store.clear();
                SessionSnapshot::unauthenticated()
            }
            (Some(token), Some(user_id), Some(role), Some(name)) => {
                tracing::info!(%user_id, %role, "session restored from storage");
                SessionSnapshot::authenticated(CredentialRecord {
                    token,
                    user_id,
                    role,
                    name,
                    is_approved,
                })
            }
            (Some(_), ..) => {
                tracing::info!("stored credential record is incomplete, session unauthenticated");
                SessionSnapshot::unauthenticated()
            }
            (None, ..) => SessionSnapshot::unauthenticated(),
        };

        self.publish(next)
    }

    /// login
    ///
    /// Persists the credential record and marks the session authenticated.
    ///
    /// # Errors
    /// `SessionError::InvalidCredential` if the token fails validation; the
    /// persistent store is cleared and the session left unauthenticated.
    /// `SessionError::Disposed` after `dispose`.
    pub fn login(&self, user: impl Into<CredentialRecord>) -> Result<SessionSnapshot, SessionError> {
        if self.is_disposed() {
            return Err(SessionError::Disposed);
        }
        let user = user.into();
        let _guard = self.lock_ops();

        let identity_complete =
            !user.user_id.is_empty() && !user.role.is_empty() && !user.name.is_empty();

        if !is_valid_token(&user.token) || !identity_complete {
            tracing::warn!(
                user_id = %user.user_id,
                identity_complete,
                "login rejected: token failed validation or identity is incomplete"
            );
            self.store.clear();
            self.publish(SessionSnapshot::unauthenticated());
            return Err(SessionError::InvalidCredential);
        }

        // A stale approval flag from a previous user must not survive.
        self.store.remove_item(keys::IS_APPROVED);

        let mut items = vec![
            (keys::TOKEN, user.token.clone()),
            (keys::USER_ID, user.user_id.clone()),
            (keys::ROLE, user.role.clone()),
            (keys::NAME, user.name.clone()),
        ];
        if let Some(approved) = user.is_approved {
            items.push((keys::IS_APPROVED, approved.to_string()));
        }

        if !self.store.write_all(&items) {
            tracing::warn!(
                user_id = %user.user_id,
                "credential record could not be persisted, session will not survive a reload"
            );
        }

        tracing::info!(user_id = %user.user_id, role = %user.role, "user logged in");
        Ok(self.publish(SessionSnapshot::authenticated(user)))
    }

    /// logout
    ///
    /// Clears persistent and session-scoped storage and unconditionally moves to
    /// `Unauthenticated`.
    pub fn logout(&self) -> SessionSnapshot {
        let _guard = self.lock_ops();

        self.store.clear();
        self.session_store.clear();

        tracing::info!("user logged out");
        self.publish(SessionSnapshot::unauthenticated())
    }

    /// dispose
    ///
    /// Ends the session lifecycle: subscribers see their channel close and any
    /// later `login` is refused. Storage is left untouched. Later transitions
    /// (`logout`, `check_auth_status`) still update `snapshot()`, they are just
    /// no longer fanned out.
    pub fn dispose(&self) {
        let sender = self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
        if sender.is_some() {
            tracing::debug!("session disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }

    /// csrf_token
    ///
    /// Per-session anti-forgery token: 16 random bytes as lowercase hex,
    /// generated on first read and kept in session-scoped storage.
    pub fn csrf_token(&self) -> String {
        let _guard = self.lock_ops();

        if let Some(existing) = self.session_store.get_item(keys::CSRF_TOKEN) {
            return existing;
        }

        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        self.session_store.set_item(keys::CSRF_TOKEN, &token);
        token
    }

    fn lock_ops(&self) -> MutexGuard<'_, ()> {
        self.ops.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, next: SessionSnapshot) -> SessionSnapshot {
        debug_assert!(!next.is_authenticated || next.user.is_some());

        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = next.clone();

        match self.tx.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            Some(tx) => {
                tx.send_replace(next.clone());
            }
            None => tracing::debug!("session disposed, snapshot not fanned out"),
        }
        next
    }
}
