use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{
    LeasedTask, QueueTaskStatus, TaskDisposition, TaskQueue, TaskQueueError, TaskState,
};
use crate::domain::{MeetingId, ProcessingTask, StoragePath, TaskId};

/// Durable task queue on Postgres.
///
/// `FOR UPDATE SKIP LOCKED` gives at-most-one-active-owner per task, so
/// several worker processes can share the table. A lease that outlives its
/// visibility window (crashed or hung worker) becomes pullable again and
/// burns an attempt, until `max_attempts` is reached; after that the task
/// is only reachable through `reap_exhausted`. Completed tasks are
/// deleted; failures are kept for inspection.
pub struct PgTaskQueue {
    pool: PgPool,
    max_attempts: u32,
}

impl PgTaskQueue {
    pub fn new(pool: PgPool, max_attempts: u32) -> Self {
        Self { pool, max_attempts }
    }

    fn leased_from_row(row: &PgRow) -> Result<LeasedTask, TaskQueueError> {
        let attempts: i32 = row
            .try_get("attempts")
            .map_err(|e| TaskQueueError::PullFailed(e.to_string()))?;
        let storage_path: String = row
            .try_get("storage_path")
            .map_err(|e| TaskQueueError::PullFailed(e.to_string()))?;

        Ok(LeasedTask {
            task: ProcessingTask {
                id: TaskId::from_uuid(
                    row.try_get::<Uuid, _>("id")
                        .map_err(|e| TaskQueueError::PullFailed(e.to_string()))?,
                ),
                meeting_id: MeetingId::from_uuid(
                    row.try_get::<Uuid, _>("meeting_id")
                        .map_err(|e| TaskQueueError::PullFailed(e.to_string()))?,
                ),
                storage_path: StoragePath::from_raw(storage_path),
                media_type: row
                    .try_get("media_type")
                    .map_err(|e| TaskQueueError::PullFailed(e.to_string()))?,
                created_at: row
                    .try_get("created_at")
                    .map_err(|e| TaskQueueError::PullFailed(e.to_string()))?,
            },
            attempt: attempts as u32,
        })
    }
}

#[async_trait]
impl TaskQueue for PgTaskQueue {
    #[instrument(skip(self, task), fields(task_id = %task.id, meeting_id = %task.meeting_id))]
    async fn enqueue(&self, task: ProcessingTask) -> Result<(), TaskQueueError> {
        sqlx::query(
            "INSERT INTO processing_tasks
                 (id, meeting_id, storage_path, media_type, status, attempts, created_at)
             VALUES ($1, $2, $3, $4, 'QUEUED', 0, $5)",
        )
        .bind(task.id.as_uuid())
        .bind(task.meeting_id.as_uuid())
        .bind(task.storage_path.as_str())
        .bind(&task.media_type)
        .bind(task.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| TaskQueueError::EnqueueFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn pull(&self, visibility: Duration) -> Result<Option<LeasedTask>, TaskQueueError> {
        let leased_until = Utc::now()
            + chrono::Duration::from_std(visibility)
                .map_err(|e| TaskQueueError::PullFailed(e.to_string()))?;

        let row = sqlx::query(
            "WITH next AS (
                 SELECT id FROM processing_tasks
                 WHERE status = 'QUEUED'
                    OR (status = 'LEASED' AND leased_until < NOW() AND attempts < $2)
                 ORDER BY created_at
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             UPDATE processing_tasks t
             SET status = 'LEASED', attempts = t.attempts + 1, leased_until = $1
             FROM next
             WHERE t.id = next.id
             RETURNING t.id, t.meeting_id, t.storage_path, t.media_type, t.attempts, t.created_at",
        )
        .bind(leased_until)
        .bind(self.max_attempts as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TaskQueueError::PullFailed(e.to_string()))?;

        row.as_ref().map(Self::leased_from_row).transpose()
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn complete(&self, id: TaskId) -> Result<(), TaskQueueError> {
        sqlx::query("DELETE FROM processing_tasks WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| TaskQueueError::AckFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self, error), fields(task_id = %id, retryable = retryable))]
    async fn fail(
        &self,
        id: TaskId,
        error: &str,
        retryable: bool,
    ) -> Result<TaskDisposition, TaskQueueError> {
        let row = sqlx::query(
            "UPDATE processing_tasks
             SET status = CASE WHEN $3 AND attempts < $4 THEN 'QUEUED' ELSE 'FAILED' END,
                 leased_until = NULL,
                 last_error = $2
             WHERE id = $1
             RETURNING status",
        )
        .bind(id.as_uuid())
        .bind(error)
        .bind(retryable)
        .bind(self.max_attempts as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TaskQueueError::AckFailed(e.to_string()))?;

        let status: String = row
            .ok_or_else(|| TaskQueueError::UnknownTask(id.to_string()))?
            .try_get("status")
            .map_err(|e| TaskQueueError::AckFailed(e.to_string()))?;

        Ok(if status == "QUEUED" {
            TaskDisposition::Requeued
        } else {
            TaskDisposition::Terminal
        })
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn get_state(&self, id: TaskId) -> Result<Option<TaskState>, TaskQueueError> {
        let row = sqlx::query(
            "SELECT meeting_id, status, attempts, last_error
             FROM processing_tasks
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TaskQueueError::PullFailed(e.to_string()))?;

        let Some(row) = row else { return Ok(None) };

        let status: String = row
            .try_get("status")
            .map_err(|e| TaskQueueError::PullFailed(e.to_string()))?;
        let status = match status.as_str() {
            "QUEUED" => QueueTaskStatus::Queued,
            "LEASED" => QueueTaskStatus::Leased,
            "FAILED" => QueueTaskStatus::Failed,
            other => return Err(TaskQueueError::PullFailed(format!("bad status: {}", other))),
        };
        let attempts: i32 = row
            .try_get("attempts")
            .map_err(|e| TaskQueueError::PullFailed(e.to_string()))?;

        Ok(Some(TaskState {
            meeting_id: MeetingId::from_uuid(
                row.try_get::<Uuid, _>("meeting_id")
                    .map_err(|e| TaskQueueError::PullFailed(e.to_string()))?,
            ),
            status,
            attempts: attempts as u32,
            last_error: row
                .try_get("last_error")
                .map_err(|e| TaskQueueError::PullFailed(e.to_string()))?,
        }))
    }

    #[instrument(skip(self))]
    async fn reap_exhausted(&self) -> Result<Vec<MeetingId>, TaskQueueError> {
        let rows = sqlx::query(
            "UPDATE processing_tasks
             SET status = 'FAILED',
                 leased_until = NULL,
                 last_error = COALESCE(last_error, 'lease expired with no attempts left')
             WHERE status = 'LEASED' AND leased_until < NOW() AND attempts >= $1
             RETURNING meeting_id",
        )
        .bind(self.max_attempts as i32)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TaskQueueError::AckFailed(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get::<Uuid, _>("meeting_id")
                    .map(MeetingId::from_uuid)
                    .map_err(|e| TaskQueueError::AckFailed(e.to_string()))
            })
            .collect()
    }
}
