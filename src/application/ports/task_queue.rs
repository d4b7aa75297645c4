use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ProcessingTask, TaskId};

/// A task handed to exactly one worker, with the attempt number the lease
/// represents (1-based).
#[derive(Debug, Clone)]
pub struct LeasedTask {
    pub task: ProcessingTask,
    pub attempt: u32,
}

/// Outcome of failing a task: requeued for another attempt, or out of
/// attempts and parked as failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskDisposition {
    Requeued,
    Terminal,
}

/// Where a task currently sits in the queue. Completed tasks are removed
/// outright, so they have no state to report.
#[derive(Debug, Clone)]
pub struct TaskState {
    pub meeting_id: crate::domain::MeetingId,
    pub status: QueueTaskStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueTaskStatus {
    Queued,
    Leased,
    Failed,
}

impl QueueTaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueTaskStatus::Queued => "QUEUED",
            QueueTaskStatus::Leased => "LEASED",
            QueueTaskStatus::Failed => "FAILED",
        }
    }
}

/// Durable, at-least-once task queue. `pull` leases at most one task per
/// call; a lease that outlives `visibility` (worker crash or hang) makes
/// the task pullable again, counting another attempt. The implementation
/// guarantees at most one active owner per task.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn enqueue(&self, task: ProcessingTask) -> Result<(), TaskQueueError>;

    async fn pull(&self, visibility: Duration) -> Result<Option<LeasedTask>, TaskQueueError>;

    async fn complete(&self, id: TaskId) -> Result<(), TaskQueueError>;

    /// Record a failed attempt. Non-retryable failures and exhausted
    /// retries are terminal; anything else goes back in the queue.
    async fn fail(
        &self,
        id: TaskId,
        error: &str,
        retryable: bool,
    ) -> Result<TaskDisposition, TaskQueueError>;

    /// Current queue state of a task; `None` for unknown or already
    /// completed tasks.
    async fn get_state(&self, id: TaskId) -> Result<Option<TaskState>, TaskQueueError>;

    /// Park every task whose lease expired with no attempts left as
    /// failed, returning the meeting of each parked task so the caller
    /// can settle its status. Tasks with attempts remaining are not
    /// touched; `pull` re-leases those.
    async fn reap_exhausted(&self) -> Result<Vec<crate::domain::MeetingId>, TaskQueueError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TaskQueueError {
    #[error("enqueue failed: {0}")]
    EnqueueFailed(String),
    #[error("pull failed: {0}")]
    PullFailed(String),
    #[error("ack failed: {0}")]
    AckFailed(String),
    #[error("unknown task: {0}")]
    UnknownTask(String),
}
