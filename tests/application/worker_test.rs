use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

use minutes::application::ports::{
    AiGateway, AiGatewayError, AudioAnalysis, ChunkRepository, MeetingRepository, QueueTaskStatus,
    StagingStore, TaskQueue,
};
use minutes::application::services::{ProcessingWorker, WorkerConfig};
use minutes::domain::{
    Embedding, Meeting, MeetingStatus, ProcessingTask, Sentiment, StoragePath, Summary, TaskId,
};
use minutes::infrastructure::persistence::{
    InMemoryChunkRepository, InMemoryMeetingRepository, InMemoryTaskQueue,
};
use minutes::infrastructure::storage::InMemoryStagingStore;

const TRANSCRIPT: &str = "Hello, thanks for joining. The budget for next quarter is ten thousand. \
    We agreed to ship the pilot in March and Maria will send the contract.";

fn scripted_summary() -> Summary {
    Summary {
        key_points: vec!["Budget set at ten thousand".to_string()],
        decisions: vec!["Ship the pilot in March".to_string()],
        follow_ups: vec!["Maria sends the contract".to_string()],
        sentiment: Sentiment::Positive,
    }
}

struct ScriptedGateway {
    transcript: String,
    summary: Summary,
    failing_analyses: Mutex<u32>,
}

impl ScriptedGateway {
    fn succeeding() -> Self {
        Self {
            transcript: TRANSCRIPT.to_string(),
            summary: scripted_summary(),
            failing_analyses: Mutex::new(0),
        }
    }

    fn failing_first(n: u32) -> Self {
        Self {
            failing_analyses: Mutex::new(n),
            ..Self::succeeding()
        }
    }
}

#[async_trait]
impl AiGateway for ScriptedGateway {
    async fn analyze_audio(
        &self,
        _data: &[u8],
        _media_type: &str,
    ) -> Result<AudioAnalysis, AiGatewayError> {
        {
            let mut remaining = self.failing_analyses.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(AiGatewayError::ApiRequestFailed(
                    "provider unavailable".to_string(),
                ));
            }
        }
        Ok(AudioAnalysis {
            transcript: self.transcript.clone(),
            summary: self.summary.clone(),
        })
    }

    async fn embed(&self, _text: &str) -> Result<Embedding, AiGatewayError> {
        Ok(Embedding::new(vec![1.0, 0.0]))
    }

    async fn answer(&self, _question: &str, _context: &str) -> Result<String, AiGatewayError> {
        Ok("unused".to_string())
    }
}

struct Fixture {
    meetings: Arc<InMemoryMeetingRepository>,
    chunks: Arc<InMemoryChunkRepository>,
    queue: Arc<InMemoryTaskQueue>,
    staging: Arc<InMemoryStagingStore>,
    worker: ProcessingWorker,
}

fn fixture(gateway: ScriptedGateway, max_attempts: u32) -> Fixture {
    let meetings = Arc::new(InMemoryMeetingRepository::new());
    let chunks = Arc::new(InMemoryChunkRepository::new());
    let queue = Arc::new(InMemoryTaskQueue::new(max_attempts));
    let staging = Arc::new(InMemoryStagingStore::new());

    let worker = ProcessingWorker::new(
        Arc::clone(&queue) as _,
        Arc::new(gateway),
        Arc::clone(&meetings) as _,
        Arc::clone(&chunks) as _,
        Arc::clone(&staging) as _,
        WorkerConfig {
            chunk_size: 50,
            chunk_overlap: 10,
            ..WorkerConfig::default()
        },
    )
    .unwrap();

    Fixture {
        meetings,
        chunks,
        queue,
        staging,
        worker,
    }
}

/// Creates a processing meeting, stages audio for it and enqueues the task.
async fn seed(f: &Fixture, with_audio: bool) -> (Meeting, TaskId) {
    let meeting = Meeting::new("Acme Corp".to_string());
    f.meetings.create(&meeting).await.unwrap();

    let path = StoragePath::new(&meeting.id, "call.webm");
    if with_audio {
        let stream = futures::stream::once(async { Ok(Bytes::from_static(b"FAKEAUDIO")) }).boxed();
        f.staging.store(&path, stream).await.unwrap();
    }

    let task = ProcessingTask::new(meeting.id, path, "audio/webm".to_string());
    let task_id = task.id;
    f.queue.enqueue(task).await.unwrap();

    (meeting, task_id)
}

#[tokio::test]
async fn given_staged_audio_when_drained_then_meeting_completed_with_chunks() {
    let f = fixture(ScriptedGateway::succeeding(), 3);
    let (meeting, task_id) = seed(&f, true).await;

    let processed = f.worker.drain().await.unwrap();
    assert_eq!(processed, 1);

    let stored = f.meetings.get_by_id(meeting.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MeetingStatus::Completed);
    assert_eq!(stored.transcript.as_deref(), Some(TRANSCRIPT));
    assert_eq!(stored.summary, Some(scripted_summary()));
    assert!(stored.embedding.is_some());

    let chunks = f.chunks.list(Some(meeting.id)).await.unwrap();
    assert!(!chunks.is_empty());
    assert!(chunks.iter().all(|c| c.meeting_id == meeting.id));

    // Completed tasks leave the queue and the staged file is released.
    assert!(f.queue.get_state(task_id).await.unwrap().is_none());
    assert_eq!(f.staging.object_count(), 0);
}

#[tokio::test]
async fn given_provider_failure_and_single_attempt_when_drained_then_meeting_failed() {
    let f = fixture(ScriptedGateway::failing_first(5), 1);
    let (meeting, task_id) = seed(&f, true).await;

    f.worker.drain().await.unwrap();

    let stored = f.meetings.get_by_id(meeting.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MeetingStatus::Failed);
    assert!(stored.transcript.is_none());

    let state = f.queue.get_state(task_id).await.unwrap().unwrap();
    assert_eq!(state.status, QueueTaskStatus::Failed);
    assert_eq!(state.attempts, 1);
    assert!(state.last_error.unwrap().contains("provider"));

    assert_eq!(f.staging.object_count(), 0);
}

#[tokio::test]
async fn given_transient_provider_failure_when_drained_then_retried_to_completion() {
    let f = fixture(ScriptedGateway::failing_first(1), 3);
    let (meeting, task_id) = seed(&f, true).await;

    let processed = f.worker.drain().await.unwrap();
    assert_eq!(processed, 2);

    let stored = f.meetings.get_by_id(meeting.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MeetingStatus::Completed);
    assert!(f.queue.get_state(task_id).await.unwrap().is_none());
    assert_eq!(f.staging.object_count(), 0);
}

#[tokio::test]
async fn given_missing_audio_when_drained_then_failed_without_retries() {
    let f = fixture(ScriptedGateway::succeeding(), 3);
    let (meeting, task_id) = seed(&f, false).await;

    let processed = f.worker.drain().await.unwrap();
    assert_eq!(processed, 1);

    let stored = f.meetings.get_by_id(meeting.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MeetingStatus::Failed);

    let state = f.queue.get_state(task_id).await.unwrap().unwrap();
    assert_eq!(state.status, QueueTaskStatus::Failed);
    assert_eq!(state.attempts, 1);
}

#[tokio::test]
async fn given_stalled_task_out_of_attempts_when_drained_then_meeting_failed() {
    let f = fixture(ScriptedGateway::succeeding(), 1);
    let (meeting, task_id) = seed(&f, true).await;

    // A worker that died mid-attempt: the lease expires with the last
    // attempt already burned.
    f.queue.pull(Duration::from_millis(1)).await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let processed = f.worker.drain().await.unwrap();
    assert_eq!(processed, 0);

    let stored = f.meetings.get_by_id(meeting.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MeetingStatus::Failed);

    let state = f.queue.get_state(task_id).await.unwrap().unwrap();
    assert_eq!(state.status, QueueTaskStatus::Failed);
    assert_eq!(state.attempts, 1);
}

#[tokio::test]
async fn given_empty_queue_when_drained_then_no_tasks_processed() {
    let f = fixture(ScriptedGateway::succeeding(), 3);

    let processed = f.worker.drain().await.unwrap();

    assert_eq!(processed, 0);
}
