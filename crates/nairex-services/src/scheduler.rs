//! One-shot task scheduler.
//!
//! A process-wide map from task id to an armed timer. Tasks run on their
//! own tokio task, never on a request worker, and have no response channel.
//! `cancel` after the timer fired is a no-op; a panicking task takes down
//! only its own timer.
//!
//! Nothing is persisted: timers in flight when the process dies are lost.
//! The swap status classification tolerates that by deriving reversed/failed
//! from ledger timestamps alone.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tasks: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot timer. An existing timer under the same id is
    /// replaced (and disarmed).
    pub fn schedule<F>(&self, id: impl Into<String>, at: DateTime<Utc>, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = id.into();
        let delay = (at - Utc::now()).to_std().unwrap_or_default();
        debug!(task_id = %id, delay_ms = delay.as_millis() as u64, "arming one-shot task");

        let tasks = Arc::clone(&self.tasks);
        let task_id = id.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Deregister before running so a late cancel is a no-op.
            tasks.lock().expect("scheduler lock poisoned").remove(&task_id);
            task.await;
        });

        if let Some(previous) = self
            .tasks
            .lock()
            .expect("scheduler lock poisoned")
            .insert(id, handle)
        {
            previous.abort();
        }
    }

    /// Disarm the timer under `id`. Returns whether a timer was pending.
    pub fn cancel(&self, id: &str) -> bool {
        match self.tasks.lock().expect("scheduler lock poisoned").remove(id) {
            Some(handle) => {
                handle.abort();
                debug!(task_id = %id, "cancelled one-shot task");
                true
            }
            None => false,
        }
    }

    /// Whether a timer is currently armed under `id`.
    pub fn is_scheduled(&self, id: &str) -> bool {
        self.tasks.lock().expect("scheduler lock poisoned").contains_key(id)
    }
}
