//! Shared session store.
//!
//! One [`SessionStore`] exists per session. Every UI region holds a clone of
//! the same handle, so they all observe one identity instead of fetching
//! their own.
//!
//! Each mutation is stamped with a generation number when it is issued. A
//! result is applied only if no later mutation has been issued since, so a
//! slow identity check can never overwrite the outcome of a newer sign-out.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, OnceCell};

use crate::api::{ApiClient, SessionBackend, User};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::validation::SignInForm;

/// Snapshot of the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub is_loading: bool,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            is_loading: true,
        }
    }
}

struct Inner {
    backend: Arc<dyn SessionBackend>,
    tx: watch::Sender<SessionState>,
    generation: AtomicU64,
    init: OnceCell<()>,
}

/// Cloneable handle to the process-wide session state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn SessionBackend>) -> Self {
        let (tx, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(Inner {
                backend,
                tx,
                generation: AtomicU64::new(0),
                init: OnceCell::new(),
            }),
        }
    }

    /// Store backed by the HTTP client for `config`.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let client = ApiClient::new(config)?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Run the initial identity check.
    ///
    /// Concurrent and repeated calls share the first check; use
    /// [`refresh`](Self::refresh) to force another one.
    pub async fn init(&self) {
        self.inner.init.get_or_init(|| self.refresh()).await;
    }

    /// Ask the backend who the current user is.
    ///
    /// Never fails: any error or non-2xx answer leaves the store anonymous.
    pub async fn refresh(&self) {
        let pending = self.begin();
        let user = self.check_identity().await;
        pending.settle(|state| {
            state.user = user;
            state.is_loading = false;
        });
    }

    pub fn state(&self) -> SessionState {
        self.inner.tx.borrow().clone()
    }

    /// Receiver that is notified on every applied state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.tx.subscribe()
    }

    /// Sign in, then re-derive the identity from the backend.
    ///
    /// Invalid input is rejected before any state change or request. On a
    /// rejected sign-in the current user is kept as it was.
    pub async fn sign_in(&self, email: &str, password: &str) -> ClientResult<User> {
        let form = SignInForm::new(email, password);
        form.validate()?;

        let pending = self.begin();
        if let Err(e) = self.inner.backend.sign_in(&form).await {
            tracing::warn!(error = %e, "Sign in rejected");
            pending.settle(|state| state.is_loading = false);
            return Err(e);
        }

        let user = self.check_identity().await;
        pending.settle(|state| {
            state.user = user.clone();
            state.is_loading = false;
        });

        match user {
            Some(user) => {
                tracing::info!(user_id = %user.id, "Signed in");
                Ok(user)
            }
            None => Err(ClientError::SessionNotEstablished),
        }
    }

    /// Sign out. `is_loading` ends `false` whether or not the call succeeds.
    pub async fn sign_out(&self) -> ClientResult<()> {
        let pending = self.begin();
        let result = self.inner.backend.sign_out().await;

        match &result {
            Ok(()) => {
                tracing::info!("Signed out");
                pending.settle(|state| {
                    state.user = None;
                    state.is_loading = false;
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sign out failed");
                pending.settle(|state| state.is_loading = false);
            }
        }
        result
    }

    async fn check_identity(&self) -> Option<User> {
        match self.inner.backend.get_me().await {
            Ok(user) => user,
            Err(e) => {
                tracing::debug!(error = %e, "Identity check failed, treating as anonymous");
                None
            }
        }
    }

    /// Issue a new generation and mark the store as loading.
    fn begin(&self) -> Pending<'_> {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.tx.send_modify(|state| state.is_loading = true);
        Pending {
            store: self,
            generation,
            settled: false,
        }
    }

    /// Apply `update` unless a newer mutation has been issued.
    fn apply(&self, generation: u64, update: impl FnOnce(&mut SessionState)) {
        self.inner.tx.send_if_modified(|state| {
            let current = self.inner.generation.load(Ordering::SeqCst);
            if current != generation {
                tracing::debug!(generation, current, "Dropping stale session result");
                return false;
            }
            update(state);
            true
        });
    }
}

/// An issued mutation that has not produced its result yet.
///
/// Dropping it unsettled (the caller's future was cancelled) clears
/// `is_loading` if no newer mutation has been issued since.
struct Pending<'a> {
    store: &'a SessionStore,
    generation: u64,
    settled: bool,
}

impl Pending<'_> {
    fn settle(mut self, update: impl FnOnce(&mut SessionState)) {
        self.settled = true;
        self.store.apply(self.generation, update);
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::debug!(generation = self.generation, "Session call cancelled");
        self.store.apply(self.generation, |state| state.is_loading = false);
    }
}
