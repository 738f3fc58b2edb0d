use std::collections::HashMap;
use tokio::sync::Mutex;

/// Conversation position of one caller between messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Idle,
    AwaitingPeriodToken { admin: bool },
    AwaitingReportScope { year: i32, month: u32 },
    AwaitingTargetAccount { action: PendingAction },
    AwaitingNewDisplayName { account_id: i64 },
}

/// What to do with the target account once it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    MonthlyReport { year: i32, month: u32 },
    Rename,
}

/// Per-caller session state, keyed by platform id. Absent entry means
/// `Idle`; a caller can never observe or mutate another caller's state.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<i64, State>>,
}

impl SessionStore {
    pub fn new() -> SessionStore {
        SessionStore::default()
    }

    pub async fn get(&self, caller: i64) -> State {
        self.inner
            .lock()
            .await
            .get(&caller)
            .cloned()
            .unwrap_or(State::Idle)
    }

    pub async fn set(&self, caller: i64, state: State) {
        self.inner.lock().await.insert(caller, state);
    }

    pub async fn clear(&self, caller: i64) {
        self.inner.lock().await.remove(&caller);
    }
}
