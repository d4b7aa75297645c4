use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, Utc};
use futures::stream::BoxStream;
use futures::StreamExt;

use minutes::application::ports::{
    AiGateway, AiGatewayError, AudioAnalysis, LeasedTask, MeetingRepository, TaskDisposition,
    TaskQueue, TaskQueueError, TaskState,
};
use minutes::application::services::MeetingService;
use minutes::domain::{Embedding, Meeting, MeetingStatus, ProcessingTask, Summary, TaskId};
use minutes::infrastructure::persistence::{InMemoryMeetingRepository, InMemoryTaskQueue};
use minutes::infrastructure::storage::InMemoryStagingStore;

struct FixedEmbedGateway {
    embedding: Vec<f32>,
}

#[async_trait]
impl AiGateway for FixedEmbedGateway {
    async fn analyze_audio(
        &self,
        _data: &[u8],
        _media_type: &str,
    ) -> Result<AudioAnalysis, AiGatewayError> {
        Err(AiGatewayError::ApiRequestFailed("not used".to_string()))
    }

    async fn embed(&self, _text: &str) -> Result<Embedding, AiGatewayError> {
        Ok(Embedding::new(self.embedding.clone()))
    }

    async fn answer(&self, _question: &str, _context: &str) -> Result<String, AiGatewayError> {
        Err(AiGatewayError::ApiRequestFailed("not used".to_string()))
    }
}

struct RejectingQueue;

#[async_trait]
impl TaskQueue for RejectingQueue {
    async fn enqueue(&self, _task: ProcessingTask) -> Result<(), TaskQueueError> {
        Err(TaskQueueError::EnqueueFailed("queue down".to_string()))
    }

    async fn pull(
        &self,
        _visibility: std::time::Duration,
    ) -> Result<Option<LeasedTask>, TaskQueueError> {
        Ok(None)
    }

    async fn complete(&self, _id: TaskId) -> Result<(), TaskQueueError> {
        Ok(())
    }

    async fn fail(
        &self,
        _id: TaskId,
        _error: &str,
        _retryable: bool,
    ) -> Result<TaskDisposition, TaskQueueError> {
        Ok(TaskDisposition::Terminal)
    }

    async fn get_state(&self, _id: TaskId) -> Result<Option<TaskState>, TaskQueueError> {
        Ok(None)
    }

    async fn reap_exhausted(&self) -> Result<Vec<minutes::domain::MeetingId>, TaskQueueError> {
        Ok(Vec::new())
    }
}

fn audio_stream(data: &'static [u8]) -> BoxStream<'static, Result<Bytes, io::Error>> {
    futures::stream::once(async move { Ok(Bytes::from_static(data)) }).boxed()
}

struct Fixture {
    meetings: Arc<InMemoryMeetingRepository>,
    queue: Arc<InMemoryTaskQueue>,
    staging: Arc<InMemoryStagingStore>,
    service: MeetingService,
}

fn fixture(embedding: Vec<f32>) -> Fixture {
    let meetings = Arc::new(InMemoryMeetingRepository::new());
    let queue = Arc::new(InMemoryTaskQueue::new(3));
    let staging = Arc::new(InMemoryStagingStore::new());
    let gateway = Arc::new(FixedEmbedGateway { embedding });

    let service = MeetingService::new(
        Arc::clone(&meetings) as _,
        Arc::clone(&queue) as _,
        Arc::clone(&staging) as _,
        gateway,
        0.3,
    );

    Fixture {
        meetings,
        queue,
        staging,
        service,
    }
}

#[tokio::test]
async fn given_upload_when_creating_meeting_then_staged_and_enqueued_as_processing() {
    let f = fixture(vec![1.0, 0.0]);

    let meeting = f
        .service
        .create(
            "Acme Corp".to_string(),
            "call.webm".to_string(),
            "audio/webm".to_string(),
            audio_stream(b"FAKEAUDIO"),
        )
        .await
        .unwrap();

    assert_eq!(meeting.status, MeetingStatus::Processing);
    assert_eq!(f.staging.object_count(), 1);
    assert_eq!(f.queue.pending(), 1);

    let stored = f.meetings.get_by_id(meeting.id).await.unwrap().unwrap();
    assert_eq!(stored.client_name, "Acme Corp");
    assert!(stored.transcript.is_none());
}

#[tokio::test]
async fn given_enqueue_failure_when_creating_meeting_then_staged_audio_removed() {
    let meetings = Arc::new(InMemoryMeetingRepository::new());
    let staging = Arc::new(InMemoryStagingStore::new());
    let gateway = Arc::new(FixedEmbedGateway {
        embedding: vec![1.0, 0.0],
    });

    let service = MeetingService::new(
        Arc::clone(&meetings) as _,
        Arc::new(RejectingQueue),
        Arc::clone(&staging) as _,
        gateway,
        0.3,
    );

    let result = service
        .create(
            "Acme Corp".to_string(),
            "call.webm".to_string(),
            "audio/webm".to_string(),
            audio_stream(b"FAKEAUDIO"),
        )
        .await;

    assert!(result.is_err());
    assert_eq!(staging.object_count(), 0);
}

#[tokio::test]
async fn given_completed_meetings_when_searching_then_only_similar_returned() {
    let f = fixture(vec![1.0, 0.0]);

    let matching = Meeting::new("Acme Corp".to_string());
    let other = Meeting::new("Globex".to_string());
    f.meetings.create(&matching).await.unwrap();
    f.meetings.create(&other).await.unwrap();
    f.meetings
        .mark_completed(
            matching.id,
            "budget discussion",
            &Summary::default(),
            &Embedding::new(vec![1.0, 0.0]),
        )
        .await
        .unwrap();
    f.meetings
        .mark_completed(
            other.id,
            "unrelated topic",
            &Summary::default(),
            &Embedding::new(vec![0.0, 1.0]),
        )
        .await
        .unwrap();

    let results = f.service.search("what was the budget?").await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].item.id, matching.id);
    assert!((results[0].similarity - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn given_processing_meeting_when_searching_then_excluded() {
    let f = fixture(vec![1.0, 0.0]);

    let pending = Meeting::new("Acme Corp".to_string());
    f.meetings.create(&pending).await.unwrap();

    let results = f.service.search("anything").await.unwrap();

    assert!(results.is_empty());
}

#[tokio::test]
async fn given_meetings_when_listing_then_newest_first_with_cursor() {
    let f = fixture(vec![1.0, 0.0]);

    let now = Utc::now();
    let mut older = Meeting::new("Older".to_string());
    older.created_at = now - Duration::hours(2);
    let mut newer = Meeting::new("Newer".to_string());
    newer.created_at = now - Duration::hours(1);
    f.meetings.create(&older).await.unwrap();
    f.meetings.create(&newer).await.unwrap();

    let all = f.service.list(10, None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, newer.id);
    assert_eq!(all[1].id, older.id);

    let page = f
        .service
        .list(10, Some(now - Duration::minutes(90)))
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, older.id);
}
