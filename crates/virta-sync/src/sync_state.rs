use std::sync::{Arc, Mutex};

/// Lifecycle of a background history sync.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed(String),
}

/// Shared, cloneable view of the sync lifecycle.
///
/// Every transition goes through this handle instead of a process-wide
/// status flag, and [`SyncStateHandle::begin`] is atomic so two syncs
/// cannot run concurrently.
#[derive(Debug, Clone, Default)]
pub struct SyncStateHandle {
    state: Arc<Mutex<SyncState>>,
}

impl SyncStateHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transition to `Running` unless a run is already active. Returns
    /// whether the caller acquired the run.
    pub fn begin(&self) -> bool {
        let mut state = self.lock();
        if *state == SyncState::Running {
            return false;
        }
        *state = SyncState::Running;
        true
    }

    pub fn succeed(&self) {
        *self.lock() = SyncState::Succeeded;
    }

    pub fn fail(&self, message: impl Into<String>) {
        *self.lock() = SyncState::Failed(message.into());
    }

    pub fn snapshot(&self) -> SyncState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SyncState> {
        self.state.lock().expect("sync state lock poisoned")
    }
}
