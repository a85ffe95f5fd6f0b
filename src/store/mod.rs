use log::debug;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

pub mod actions;
pub mod reducer;
pub mod selectors;

pub use actions::Action;
pub use reducer::{reduce, AppState};

/// The single owner of application state. Every change goes through
/// `dispatch`, which applies the pure reducer under the write lock, so
/// actions are folded in exactly the order they were dispatched.
#[derive(Clone)]
pub struct Store {
    inner: Arc<RwLock<AppState>>,
    version: Arc<watch::Sender<u64>>,
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    pub fn with_state(state: AppState) -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            inner: Arc::new(RwLock::new(state)),
            version: Arc::new(tx),
        }
    }

    pub async fn dispatch(&self, action: Action) {
        let mut state = self.inner.write().await;
        debug!("⚡ {}", action.kind());
        let current = std::mem::take(&mut *state);
        *state = reduce(current, &action);
        self.version.send_modify(|v| *v += 1);
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> AppState {
        self.inner.read().await.clone()
    }

    /// Bumps once per dispatched action; views await `changed()` to re-render.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
