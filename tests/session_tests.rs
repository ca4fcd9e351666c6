use portal_gate::codec;
use portal_gate::models::LoginRequest;
use portal_gate::session::{SessionError, SessionManager, keys};
use portal_gate::storage::{FileStorage, MemoryStorage, StorageBackend, StorageError};
use std::sync::Arc;
use std::thread;

// --- Setup Utilities ---

struct Harness {
    persistent: Arc<MemoryStorage>,
    scoped: Arc<MemoryStorage>,
    session: SessionManager,
}

fn harness() -> Harness {
    let persistent = Arc::new(MemoryStorage::new());
    let scoped = Arc::new(MemoryStorage::new());
    let session = SessionManager::new(persistent.clone(), scoped.clone());
    Harness {
        persistent,
        scoped,
        session,
    }
}

fn user(role: &str, token: &str) -> LoginRequest {
    LoginRequest {
        id: "64f1c0ffee".to_string(),
        role: role.to_string(),
        name: "Test User".to_string(),
        token: token.to_string(),
        is_approved: None,
    }
}

fn seed(storage: &MemoryStorage, pairs: &[(&str, &str)]) {
    for (key, value) in pairs {
        storage.set(key, &codec::encode(value)).unwrap();
    }
}

/// Reads of one key fault; everything else goes to the wrapped store.
#[derive(Default)]
struct UnreadableKey {
    inner: MemoryStorage,
    fault_key: &'static str,
}

impl StorageBackend for UnreadableKey {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if key == self.fault_key {
            return Err(StorageError::Unavailable(format!("cannot read {key}")));
        }
        self.inner.get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value)
    }
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
    fn clear(&self) -> Result<(), StorageError> {
        self.inner.clear()
    }
    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.inner.keys()
    }
}

// --- Initial state ---

#[test]
fn test_starts_loading_then_settles() {
    let h = harness();
    let snapshot = h.session.snapshot();
    assert!(snapshot.is_loading);
    assert!(!snapshot.is_authenticated);
    assert!(snapshot.checked_at.is_none());

    let snapshot = h.session.init();
    assert!(!snapshot.is_loading);
    assert!(!snapshot.is_authenticated);
    assert!(snapshot.user.is_none());
    assert!(snapshot.checked_at.is_some());
}

#[test]
fn test_restores_stored_credential_record() {
    let h = harness();
    seed(
        &h.persistent,
        &[
            (keys::TOKEN, "validtoken123"),
            (keys::USER_ID, "u-1"),
            (keys::ROLE, "auditor"),
            (keys::NAME, "Ida"),
            (keys::IS_APPROVED, "true"),
        ],
    );

    let snapshot = h.session.init();
    assert!(snapshot.is_authenticated);
    let user = snapshot.user.unwrap();
    assert_eq!(user.user_id, "u-1");
    assert_eq!(user.role, "auditor");
    assert_eq!(user.is_approved, Some(true));
}

#[test]
fn test_restores_legacy_plaintext_record() {
    let h = harness();
    for (key, value) in [
        (keys::TOKEN, "validtoken123"),
        (keys::USER_ID, "u-2"),
        (keys::ROLE, "tutor"),
        (keys::NAME, "Tom"),
    ] {
        h.persistent.set(key, value).unwrap();
    }

    let snapshot = h.session.init();
    assert!(snapshot.is_authenticated);
    assert_eq!(snapshot.role(), Some("tutor"));
    assert_eq!(snapshot.user.unwrap().is_approved, None);
}

#[test]
fn test_corrupted_token_clears_storage() {
    let h = harness();
    seed(
        &h.persistent,
        &[
            (keys::TOKEN, "short"),
            (keys::USER_ID, "u-3"),
            (keys::ROLE, "admin"),
            (keys::NAME, "Eve"),
        ],
    );
    h.persistent.set("theme", "dark").unwrap();

    let snapshot = h.session.check_auth_status();
    assert!(!snapshot.is_authenticated);
    assert!(!snapshot.is_loading);
    assert!(h.persistent.keys().unwrap().is_empty());
}

#[test]
fn test_incomplete_record_is_unauthenticated_but_kept() {
    let h = harness();
    seed(
        &h.persistent,
        &[(keys::TOKEN, "validtoken123"), (keys::ROLE, "admin"), (keys::NAME, "")],
    );

    let snapshot = h.session.check_auth_status();
    assert!(!snapshot.is_authenticated);
    assert_eq!(h.persistent.keys().unwrap().len(), 3);
}

#[test]
fn test_failing_storage_settles_unauthenticated() {
    let session = SessionManager::new(
        Arc::new(MemoryStorage::new_failing()),
        Arc::new(MemoryStorage::new_failing()),
    );
    let snapshot = session.init();
    assert!(!snapshot.is_loading);
    assert!(!snapshot.is_authenticated);
}

#[test]
fn test_unreadable_field_wipes_stored_session() {
    let backend = Arc::new(UnreadableKey {
        fault_key: keys::ROLE,
        ..UnreadableKey::default()
    });
    seed(
        &backend.inner,
        &[
            (keys::TOKEN, "validtoken123"),
            (keys::USER_ID, "u-1"),
            (keys::ROLE, "admin"),
            (keys::NAME, "Ada"),
        ],
    );
    let session = SessionManager::new(backend.clone(), Arc::new(MemoryStorage::new()));

    let snapshot = session.check_auth_status();
    assert!(!snapshot.is_loading);
    assert!(!snapshot.is_authenticated);
    assert!(snapshot.user.is_none());
    assert!(backend.inner.keys().unwrap().is_empty());
}

// --- Login ---

#[test]
fn test_login_then_check_reports_same_role() {
    let h = harness();
    h.session.init();

    let snapshot = h.session.login(user("coursemanagement", "validtoken123")).unwrap();
    assert!(snapshot.is_authenticated);

    let rechecked = h.session.check_auth_status();
    assert!(rechecked.is_authenticated);
    assert_eq!(rechecked.role(), Some("coursemanagement"));
    assert_eq!(rechecked.user, snapshot.user);
}

#[test]
fn test_login_persists_obfuscated_fields() {
    let h = harness();
    let mut req = user("marketing", "validtoken123");
    req.is_approved = Some(false);
    h.session.login(req).unwrap();

    let mut stored = h.persistent.keys().unwrap();
    stored.sort();
    assert_eq!(stored, vec!["_id", "isApproved", "name", "role", "token"]);

    let raw_role = h.persistent.get(keys::ROLE).unwrap().unwrap();
    assert!(codec::is_encoded(&raw_role));
    assert_eq!(codec::decode(&raw_role), "marketing");
    assert_eq!(codec::decode(&h.persistent.get(keys::IS_APPROVED).unwrap().unwrap()), "false");
}

#[test]
fn test_login_drops_stale_approval_flag() {
    let h = harness();
    let mut first = user("tutor", "validtoken123");
    first.is_approved = Some(true);
    h.session.login(first).unwrap();

    h.session.login(user("admin", "anothertoken456")).unwrap();
    let rechecked = h.session.check_auth_status();
    assert_eq!(rechecked.user.unwrap().is_approved, None);
}

#[test]
fn test_login_rejects_invalid_token_and_clears_storage() {
    let h = harness();
    h.session.login(user("admin", "validtoken123")).unwrap();

    let err = h.session.login(user("admin", "1234567890")).unwrap_err();
    assert_eq!(err, SessionError::InvalidCredential);

    let snapshot = h.session.snapshot();
    assert!(!snapshot.is_authenticated);
    assert!(snapshot.user.is_none());
    assert!(h.persistent.keys().unwrap().is_empty());
}

#[test]
fn test_login_rejects_empty_identity_fields() {
    let h = harness();

    for blank in ["id", "role", "name"] {
        h.session.login(user("admin", "validtoken123")).unwrap();

        let mut req = user("admin", "validtoken123");
        match blank {
            "id" => req.id.clear(),
            "role" => req.role.clear(),
            _ => req.name.clear(),
        }

        let err = h.session.login(req).unwrap_err();
        assert_eq!(err, SessionError::InvalidCredential, "blank {blank}");
        assert!(!h.session.snapshot().is_authenticated, "blank {blank}");
        assert!(h.persistent.keys().unwrap().is_empty(), "blank {blank}");
    }
}

#[test]
fn test_login_survives_storage_failure_in_memory_only() {
    let session = SessionManager::new(
        Arc::new(MemoryStorage::with_quota(16)),
        Arc::new(MemoryStorage::new()),
    );
    session.init();

    let snapshot = session.login(user("admin", "validtoken123")).unwrap();
    assert!(snapshot.is_authenticated);

    // Nothing was persisted, so a reload finds no session.
    assert!(!session.check_auth_status().is_authenticated);
}

// --- Logout ---

#[test]
fn test_logout_empties_both_stores() {
    let h = harness();
    h.session.login(user("admin", "validtoken123")).unwrap();
    h.session.csrf_token();
    assert!(!h.scoped.keys().unwrap().is_empty());

    let snapshot = h.session.logout();
    assert!(!snapshot.is_authenticated);
    assert!(snapshot.user.is_none());
    assert!(h.persistent.keys().unwrap().is_empty());
    assert!(h.scoped.keys().unwrap().is_empty());
}

// --- CSRF ---

#[test]
fn test_csrf_token_is_lazy_stable_hex() {
    let h = harness();
    assert!(h.scoped.keys().unwrap().is_empty());

    let token = h.session.csrf_token();
    assert_eq!(token.len(), 32);
    assert!(token.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    assert_eq!(h.session.csrf_token(), token);

    h.session.logout();
    assert_ne!(h.session.csrf_token(), token);
}

#[test]
fn test_concurrent_csrf_reads_agree() {
    let h = harness();
    let session = Arc::new(h.session);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let session = session.clone();
            thread::spawn(move || session.csrf_token())
        })
        .collect();
    let tokens: Vec<String> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();

    assert!(tokens.iter().all(|t| t == &tokens[0]));
    assert_eq!(session.csrf_token(), tokens[0]);
    assert_eq!(h.scoped.keys().unwrap().len(), 1);
}

// --- Lifecycle ---

#[tokio::test]
async fn test_subscribers_observe_transitions_until_dispose() {
    let h = harness();
    let mut rx = h.session.subscribe();
    assert!(rx.borrow_and_update().is_loading);

    h.session.init();
    rx.changed().await.unwrap();
    assert!(!rx.borrow_and_update().is_loading);

    h.session.login(user("tutor", "validtoken123")).unwrap();
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_authenticated);

    h.session.dispose();
    assert!(h.session.is_disposed());
    assert!(rx.changed().await.is_err());
    assert_eq!(
        h.session.login(user("tutor", "validtoken123")).unwrap_err(),
        SessionError::Disposed
    );
}

#[test]
fn test_snapshot_tracks_logout_after_dispose() {
    let h = harness();
    h.session.login(user("admin", "validtoken123")).unwrap();
    h.session.dispose();
    assert!(h.session.snapshot().is_authenticated);

    let snapshot = h.session.logout();
    assert!(!snapshot.is_authenticated);
    assert_eq!(h.session.snapshot(), snapshot);
    assert!(h.persistent.keys().unwrap().is_empty());
}

#[test]
fn test_session_survives_restart_with_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    {
        let session = SessionManager::new(
            Arc::new(FileStorage::open(&path).unwrap()),
            Arc::new(MemoryStorage::new()),
        );
        session.init();
        session.login(user("Financial", "validtoken123")).unwrap();
    }

    let restarted = SessionManager::new(
        Arc::new(FileStorage::open(&path).unwrap()),
        Arc::new(MemoryStorage::new()),
    );
    let snapshot = restarted.init();
    assert!(snapshot.is_authenticated);
    assert_eq!(snapshot.role(), Some("Financial"));
}
