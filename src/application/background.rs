//! Tracking for detached side effects.
//!
//! Profile auto-creation and view recording must never hold up the caller,
//! but their failures still need logging and shutdown should be able to
//! wait for them. `BackgroundTasks` owns a `JoinSet` for that.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tokio::task::JoinSet;

#[derive(Debug, Default)]
pub struct BackgroundTasks {
    tasks: Mutex<JoinSet<()>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` without waiting for it. Already-finished tasks are
    /// reaped first so the set does not grow without bound.
    pub fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        while let Some(result) = tasks.try_join_next() {
            log_outcome(result);
        }
        tracing::trace!(task = name, "Spawning background task");
        tasks.spawn(task);
    }

    /// Number of tasks spawned and not yet reaped.
    pub fn len(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits for every task spawned so far.
    pub async fn drain(&self) {
        let mut pending = {
            let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *tasks)
        };
        while let Some(result) = pending.join_next().await {
            log_outcome(result);
        }
    }
}

fn log_outcome(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            tracing::error!(error = %e, "Background task panicked");
        }
    }
}
