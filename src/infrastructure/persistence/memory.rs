use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::application::ports::{
    ChatRepository, ChunkRepository, LeasedTask, MeetingRepository, QueueTaskStatus,
    RepositoryError, TaskDisposition, TaskQueue, TaskQueueError, TaskState,
};
use crate::domain::{
    ChatMessage, Chunk, Embedding, Meeting, MeetingId, MeetingStatus, ProcessingTask, Summary,
    TaskId,
};

/// In-memory repositories and queue, sharing the Postgres adapters'
/// semantics (status guards, lease/attempt accounting). Used by tests and
/// handy for running the server without external services.
#[derive(Default)]
pub struct InMemoryMeetingRepository {
    inner: Mutex<HashMap<MeetingId, Meeting>>,
}

impl InMemoryMeetingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MeetingRepository for InMemoryMeetingRepository {
    async fn create(&self, meeting: &Meeting) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().expect("meeting store poisoned");
        if inner.contains_key(&meeting.id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "meeting {} already exists",
                meeting.id
            )));
        }
        inner.insert(meeting.id, meeting.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: MeetingId) -> Result<Option<Meeting>, RepositoryError> {
        let inner = self.inner.lock().expect("meeting store poisoned");
        Ok(inner.get(&id).cloned())
    }

    async fn list(
        &self,
        limit: usize,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Meeting>, RepositoryError> {
        let inner = self.inner.lock().expect("meeting store poisoned");
        let mut meetings: Vec<Meeting> = inner
            .values()
            .filter(|m| before.map(|b| m.created_at < b).unwrap_or(true))
            .cloned()
            .collect();
        meetings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        meetings.truncate(limit);
        Ok(meetings)
    }

    async fn list_completed(&self) -> Result<Vec<Meeting>, RepositoryError> {
        let inner = self.inner.lock().expect("meeting store poisoned");
        let mut meetings: Vec<Meeting> = inner
            .values()
            .filter(|m| m.status == MeetingStatus::Completed)
            .cloned()
            .collect();
        meetings.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(meetings)
    }

    async fn mark_completed(
        &self,
        id: MeetingId,
        transcript: &str,
        summary: &Summary,
        embedding: &Embedding,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().expect("meeting store poisoned");
        let meeting = inner
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        if meeting.status != MeetingStatus::Processing {
            return Err(RepositoryError::ConstraintViolation(format!(
                "meeting {} is not in PROCESSING",
                id
            )));
        }
        meeting.status = MeetingStatus::Completed;
        meeting.transcript = Some(transcript.to_string());
        meeting.summary = Some(summary.clone());
        meeting.embedding = Some(embedding.clone());
        meeting.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_failed(&self, id: MeetingId) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().expect("meeting store poisoned");
        let meeting = inner
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        if meeting.status != MeetingStatus::Processing {
            return Err(RepositoryError::ConstraintViolation(format!(
                "meeting {} is not in PROCESSING",
                id
            )));
        }
        meeting.status = MeetingStatus::Failed;
        meeting.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryChunkRepository {
    inner: Mutex<Vec<Chunk>>,
}

impl InMemoryChunkRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChunkRepository for InMemoryChunkRepository {
    async fn replace_for_meeting(
        &self,
        meeting_id: MeetingId,
        chunks: &[Chunk],
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().expect("chunk store poisoned");
        inner.retain(|c| c.meeting_id != meeting_id);
        inner.extend_from_slice(chunks);
        Ok(())
    }

    async fn list(&self, scope: Option<MeetingId>) -> Result<Vec<Chunk>, RepositoryError> {
        let inner = self.inner.lock().expect("chunk store poisoned");
        Ok(inner
            .iter()
            .filter(|c| scope.map(|s| c.meeting_id == s).unwrap_or(true))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryChatRepository {
    inner: Mutex<Vec<ChatMessage>>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn append_pair(
        &self,
        user: &ChatMessage,
        assistant: &ChatMessage,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().expect("chat store poisoned");
        inner.push(user.clone());
        inner.push(assistant.clone());
        Ok(())
    }

    async fn history(
        &self,
        limit: usize,
        before: Option<DateTime<Utc>>,
        scope: Option<MeetingId>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let inner = self.inner.lock().expect("chat store poisoned");
        let mut messages: Vec<ChatMessage> = inner
            .iter()
            .filter(|m| scope.map(|s| m.meeting_id == Some(s)).unwrap_or(true))
            .filter(|m| before.map(|b| m.created_at < b).unwrap_or(true))
            .cloned()
            .collect();
        // Newest first; insertion order breaks exact-timestamp ties.
        messages.reverse();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        messages.truncate(limit);
        Ok(messages)
    }
}

struct QueuedEntry {
    task: ProcessingTask,
    status: QueueTaskStatus,
    attempts: u32,
    leased_until: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

pub struct InMemoryTaskQueue {
    inner: Mutex<Vec<QueuedEntry>>,
    max_attempts: u32,
}

impl InMemoryTaskQueue {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
            max_attempts,
        }
    }

    pub fn pending(&self) -> usize {
        let inner = self.inner.lock().expect("task queue poisoned");
        inner
            .iter()
            .filter(|e| e.status == QueueTaskStatus::Queued)
            .count()
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue(&self, task: ProcessingTask) -> Result<(), TaskQueueError> {
        let mut inner = self.inner.lock().expect("task queue poisoned");
        inner.push(QueuedEntry {
            task,
            status: QueueTaskStatus::Queued,
            attempts: 0,
            leased_until: None,
            last_error: None,
        });
        Ok(())
    }

    async fn pull(&self, visibility: Duration) -> Result<Option<LeasedTask>, TaskQueueError> {
        let mut inner = self.inner.lock().expect("task queue poisoned");
        let now = Utc::now();

        let entry = inner.iter_mut().find(|e| match e.status {
            QueueTaskStatus::Queued => true,
            QueueTaskStatus::Leased => {
                e.attempts < self.max_attempts && e.leased_until.map(|l| l < now).unwrap_or(true)
            }
            QueueTaskStatus::Failed => false,
        });

        let Some(entry) = entry else { return Ok(None) };

        entry.status = QueueTaskStatus::Leased;
        entry.attempts += 1;
        entry.leased_until = chrono::Duration::from_std(visibility)
            .ok()
            .map(|v| now + v);

        Ok(Some(LeasedTask {
            task: entry.task.clone(),
            attempt: entry.attempts,
        }))
    }

    async fn complete(&self, id: TaskId) -> Result<(), TaskQueueError> {
        let mut inner = self.inner.lock().expect("task queue poisoned");
        inner.retain(|e| e.task.id != id);
        Ok(())
    }

    async fn fail(
        &self,
        id: TaskId,
        error: &str,
        retryable: bool,
    ) -> Result<TaskDisposition, TaskQueueError> {
        let mut inner = self.inner.lock().expect("task queue poisoned");
        let entry = inner
            .iter_mut()
            .find(|e| e.task.id == id)
            .ok_or_else(|| TaskQueueError::UnknownTask(id.to_string()))?;

        entry.leased_until = None;
        entry.last_error = Some(error.to_string());

        if retryable && entry.attempts < self.max_attempts {
            entry.status = QueueTaskStatus::Queued;
            Ok(TaskDisposition::Requeued)
        } else {
            entry.status = QueueTaskStatus::Failed;
            Ok(TaskDisposition::Terminal)
        }
    }

    async fn get_state(&self, id: TaskId) -> Result<Option<TaskState>, TaskQueueError> {
        let inner = self.inner.lock().expect("task queue poisoned");
        Ok(inner.iter().find(|e| e.task.id == id).map(|e| TaskState {
            meeting_id: e.task.meeting_id,
            status: e.status,
            attempts: e.attempts,
            last_error: e.last_error.clone(),
        }))
    }

    async fn reap_exhausted(&self) -> Result<Vec<MeetingId>, TaskQueueError> {
        let mut inner = self.inner.lock().expect("task queue poisoned");
        let now = Utc::now();

        let mut reaped = Vec::new();
        for entry in inner.iter_mut() {
            let expired = entry.leased_until.map(|l| l < now).unwrap_or(true);
            if entry.status == QueueTaskStatus::Leased
                && expired
                && entry.attempts >= self.max_attempts
            {
                entry.status = QueueTaskStatus::Failed;
                entry.leased_until = None;
                entry
                    .last_error
                    .get_or_insert_with(|| "lease expired with no attempts left".to_string());
                reaped.push(entry.task.meeting_id);
            }
        }
        Ok(reaped)
    }
}
