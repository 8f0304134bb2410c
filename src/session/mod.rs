//! Session lifecycle management.
//!
//! The [`SessionManager`] is the single source of truth for "is the user
//! authenticated". It owns the bearer credential, its persistence, and the
//! idle-inactivity timer, and it is the one place a remote authorization
//! rejection is turned into the `Expired` state.
//!
//! ## Design
//! - State machine: `Unauthenticated → Authenticated` only via explicit
//!   login/registration; `Authenticated → Expired` via idle timeout or a
//!   remote 401; `Expired → Unauthenticated` when the user acknowledges
//!   the expiry notice.
//! - The idle timer is a single spawned task per session: arming aborts
//!   any previous handle, so there is never a second live timer.
//! - Transitions are published on a `watch` channel — the read-only state
//!   observer for route guards and the expiry notice.
//! - A failed credential write degrades durability across restarts only;
//!   in-memory state stays authoritative for the process lifetime.

pub mod store;

pub use store::CredentialStore;

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Authentication state of the client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No credential; the login surface is in charge.
    Unauthenticated,
    /// A credential is present and remote calls may be issued.
    Authenticated,
    /// The credential was invalidated (idle timeout or remote rejection);
    /// waiting for the user to acknowledge before returning to login.
    Expired,
}

/// Mutable session state behind the lock.
#[derive(Debug)]
struct Inner {
    state: SessionState,
    credential: Option<String>,
}

/// Owns the credential, the session state machine, and the idle timer.
pub struct SessionManager {
    inner: Mutex<Inner>,
    idle_timer: Mutex<Option<JoinHandle<()>>>,
    idle_timeout: Duration,
    store: CredentialStore,
    state_tx: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Create a manager. No disk access and no timer until
    /// [`initialize`](Self::initialize) or [`login`](Self::login).
    pub fn new(store: CredentialStore, idle_timeout: Duration) -> Arc<Self> {
        let (state_tx, _) = watch::channel(SessionState::Unauthenticated);
        Arc::new(Self {
            inner: Mutex::new(Inner {
                state: SessionState::Unauthenticated,
                credential: None,
            }),
            idle_timer: Mutex::new(None),
            idle_timeout,
            store,
            state_tx,
        })
    }

    /// Read the persisted credential once. Present ⇒ `Authenticated` with
    /// the idle timer armed; absent ⇒ `Unauthenticated`. Returns the
    /// resulting state.
    pub fn initialize(self: &Arc<Self>) -> SessionState {
        match self.store.load() {
            Some(token) => {
                self.set_state(|inner| {
                    inner.credential = Some(token);
                    inner.state = SessionState::Authenticated;
                });
                self.arm_idle_timer();
                tracing::debug!("session restored from stored credential");
                SessionState::Authenticated
            }
            None => {
                tracing::debug!("no stored credential; starting unauthenticated");
                SessionState::Unauthenticated
            }
        }
    }

    /// Accept a freshly issued credential (from login or registration).
    /// Persists it, marks the session authenticated, and (re)arms the idle
    /// timer. No network call happens here.
    pub fn login(self: &Arc<Self>, token: &str) {
        if let Err(err) = self.store.save(token) {
            // Current-session correctness is unaffected; only durability
            // across restarts is lost.
            tracing::warn!("failed to persist credential: {err:#}");
        }
        self.set_state(|inner| {
            inner.credential = Some(token.to_string());
            inner.state = SessionState::Authenticated;
        });
        self.arm_idle_timer();
    }

    /// End the session: clear the stored credential, cancel the idle
    /// timer, return to `Unauthenticated`. Idempotent.
    pub fn logout(&self) {
        if let Err(err) = self.store.clear() {
            tracing::warn!("failed to clear stored credential: {err:#}");
        }
        self.disarm_idle_timer();
        self.set_state(|inner| {
            inner.credential = None;
            inner.state = SessionState::Unauthenticated;
        });
    }

    /// Qualifying user activity: restart the idle countdown at its full
    /// duration. No-op unless currently authenticated.
    pub fn notify_activity(self: &Arc<Self>) {
        if self.state() != SessionState::Authenticated {
            return;
        }
        self.arm_idle_timer();
    }

    /// Invalidate the session: `Authenticated → Expired`. Called on idle
    /// timeout and on any remote authorization rejection. Returns whether
    /// this call performed the transition; once expired, further calls are
    /// no-ops, so concurrent 401 reports raise the notice exactly once.
    pub fn expire(&self) -> bool {
        let transitioned = {
            let mut inner = self.inner.lock();
            if inner.state != SessionState::Authenticated {
                false
            } else {
                inner.state = SessionState::Expired;
                true
            }
        };
        if transitioned {
            self.disarm_idle_timer();
            self.state_tx.send_replace(SessionState::Expired);
            tracing::info!("session expired");
        }
        transitioned
    }

    /// The user acknowledged the expiry notice: clear the credential and
    /// return to `Unauthenticated`. No-op unless currently expired.
    pub fn acknowledge_expiry(&self) {
        {
            let mut inner = self.inner.lock();
            if inner.state != SessionState::Expired {
                return;
            }
            inner.state = SessionState::Unauthenticated;
            inner.credential = None;
        }
        if let Err(err) = self.store.clear() {
            tracing::warn!("failed to clear stored credential: {err:#}");
        }
        self.disarm_idle_timer();
        self.state_tx.send_replace(SessionState::Unauthenticated);
    }

    /// The bearer credential, only while authenticated.
    pub fn credential(&self) -> Option<String> {
        let inner = self.inner.lock();
        match inner.state {
            SessionState::Authenticated => inner.credential.clone(),
            _ => None,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// Whether remote calls may be issued right now.
    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Read-only state observer; receives every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    fn set_state(&self, apply: impl FnOnce(&mut Inner)) {
        let state = {
            let mut inner = self.inner.lock();
            apply(&mut inner);
            inner.state
        };
        self.state_tx.send_replace(state);
    }

    /// Arm the single-shot idle timer, cancelling any previous instance.
    /// The spawned task holds only a weak reference back to the manager.
    fn arm_idle_timer(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let timeout = self.idle_timeout;
        let task = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(session) = weak.upgrade() {
                if session.expire() {
                    tracing::debug!("idle timeout elapsed");
                }
            }
        });

        let mut slot = self.idle_timer.lock();
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }
    }

    fn disarm_idle_timer(&self) {
        if let Some(task) = self.idle_timer.lock().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(idle_timeout: Duration) -> (Arc<SessionManager>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credential"));
        (SessionManager::new(store, idle_timeout), dir)
    }

    fn long_timeout() -> Duration {
        Duration::from_secs(600)
    }

    #[tokio::test]
    async fn initialize_without_credential_is_unauthenticated() {
        let (session, _dir) = manager(long_timeout());
        assert_eq!(session.initialize(), SessionState::Unauthenticated);
        assert!(!session.is_authenticated());
        assert_eq!(session.credential(), None);
    }

    #[tokio::test]
    async fn initialize_restores_persisted_credential() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credential"));
        store.save("tok-persisted").unwrap();

        let session = SessionManager::new(store, long_timeout());
        assert_eq!(session.initialize(), SessionState::Authenticated);
        assert_eq!(session.credential(), Some("tok-persisted".to_string()));
    }

    #[tokio::test]
    async fn login_persists_and_authenticates() {
        let (session, dir) = manager(long_timeout());
        session.login("tok-1");

        assert!(session.is_authenticated());
        assert_eq!(session.credential(), Some("tok-1".to_string()));
        let on_disk = std::fs::read_to_string(dir.path().join("credential")).unwrap();
        assert_eq!(on_disk, "tok-1");
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let (session, dir) = manager(long_timeout());
        session.login("tok-1");
        session.logout();
        session.logout();

        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert_eq!(session.credential(), None);
        assert!(!dir.path().join("credential").exists());
    }

    #[tokio::test]
    async fn expire_transitions_exactly_once() {
        let (session, _dir) = manager(long_timeout());
        session.login("tok-1");

        assert!(session.expire());
        assert!(!session.expire());
        assert_eq!(session.state(), SessionState::Expired);
        // An expired session exposes no credential.
        assert_eq!(session.credential(), None);
    }

    #[tokio::test]
    async fn expire_is_noop_when_unauthenticated() {
        let (session, _dir) = manager(long_timeout());
        assert!(!session.expire());
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn acknowledge_expiry_clears_credential() {
        let (session, dir) = manager(long_timeout());
        session.login("tok-1");
        session.expire();
        session.acknowledge_expiry();

        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert!(!dir.path().join("credential").exists());
        // Acknowledging again changes nothing.
        session.acknowledge_expiry();
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn idle_timeout_expires_the_session() {
        let (session, _dir) = manager(Duration::from_millis(50));
        session.login("tok-1");

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(session.state(), SessionState::Expired);
    }

    #[tokio::test]
    async fn activity_resets_the_idle_countdown() {
        let (session, _dir) = manager(Duration::from_millis(200));
        session.login("tok-1");

        // Keep touching the session before the timeout elapses.
        for _ in 0..3 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            session.notify_activity();
        }
        assert_eq!(session.state(), SessionState::Authenticated);

        // Then go quiet and let it fire.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(session.state(), SessionState::Expired);
    }

    #[tokio::test]
    async fn logout_cancels_the_idle_timer() {
        let (session, _dir) = manager(Duration::from_millis(50));
        session.login("tok-1");
        session.logout();

        tokio::time::sleep(Duration::from_millis(150)).await;
        // A stale timer firing after logout would move us to Expired.
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn activity_is_noop_when_not_authenticated() {
        let (session, _dir) = manager(Duration::from_millis(50));
        session.notify_activity();
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn watcher_observes_transitions() {
        let (session, _dir) = manager(long_timeout());
        let mut rx = session.subscribe();
        assert_eq!(*rx.borrow_and_update(), SessionState::Unauthenticated);

        session.login("tok-1");
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionState::Authenticated);

        session.expire();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionState::Expired);
    }
}
