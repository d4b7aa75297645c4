use std::io;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::application::ports::{
    AiGateway, AiGatewayError, MeetingRepository, RepositoryError, StagingStore, StagingStoreError,
    TaskQueue, TaskQueueError,
};
use crate::application::services::ranking::{rank_by_similarity, Ranked};
use crate::domain::{Meeting, MeetingId, ProcessingTask, StoragePath};

const SEARCH_TOP_K: usize = 5;

/// Ingestion entry point and meeting read paths: create/get/list plus
/// whole-document semantic search.
pub struct MeetingService {
    meetings: Arc<dyn MeetingRepository>,
    queue: Arc<dyn TaskQueue>,
    staging: Arc<dyn StagingStore>,
    gateway: Arc<dyn AiGateway>,
    search_threshold: f32,
}

impl MeetingService {
    pub fn new(
        meetings: Arc<dyn MeetingRepository>,
        queue: Arc<dyn TaskQueue>,
        staging: Arc<dyn StagingStore>,
        gateway: Arc<dyn AiGateway>,
        search_threshold: f32,
    ) -> Self {
        Self {
            meetings,
            queue,
            staging,
            gateway,
            search_threshold,
        }
    }

    /// Stage the upload, create the meeting in `Processing` and enqueue the
    /// task. Returns immediately; the worker does the heavy lifting.
    #[tracing::instrument(skip(self, audio), fields(client_name = %client_name, filename = %filename))]
    pub async fn create(
        &self,
        client_name: String,
        filename: String,
        media_type: String,
        audio: BoxStream<'_, Result<Bytes, io::Error>>,
    ) -> Result<Meeting, MeetingServiceError> {
        let meeting = Meeting::new(client_name);
        let path = StoragePath::new(&meeting.id, &filename);

        let bytes_written = self.staging.store(&path, audio).await?;
        tracing::debug!(bytes = bytes_written, path = %path, "Audio staged");

        if let Err(e) = self.create_and_enqueue(&meeting, &path, &media_type).await {
            // The upload is useless without a task pointing at it.
            if let Err(del_err) = self.staging.delete(&path).await {
                tracing::warn!(error = %del_err, path = %path, "Failed to remove staged audio after enqueue failure");
            }
            return Err(e);
        }

        tracing::info!(meeting_id = %meeting.id, "Meeting created and processing enqueued");
        Ok(meeting)
    }

    async fn create_and_enqueue(
        &self,
        meeting: &Meeting,
        path: &StoragePath,
        media_type: &str,
    ) -> Result<(), MeetingServiceError> {
        self.meetings.create(meeting).await?;
        let task = ProcessingTask::new(meeting.id, path.clone(), media_type.to_string());
        self.queue.enqueue(task).await?;
        Ok(())
    }

    pub async fn get(&self, id: MeetingId) -> Result<Option<Meeting>, MeetingServiceError> {
        Ok(self.meetings.get_by_id(id).await?)
    }

    pub async fn list(
        &self,
        limit: usize,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Meeting>, MeetingServiceError> {
        Ok(self.meetings.list(limit, before).await?)
    }

    /// Rank completed meetings' whole-document embeddings against the query.
    /// Meetings still processing, or without an embedding, never show up.
    #[tracing::instrument(skip(self, query))]
    pub async fn search(&self, query: &str) -> Result<Vec<Ranked<Meeting>>, MeetingServiceError> {
        let query_embedding = self.gateway.embed(query).await?;
        let candidates = self.meetings.list_completed().await?;

        let ranked = rank_by_similarity(
            &query_embedding,
            candidates,
            |m: &Meeting| m.embedding.as_ref(),
            self.search_threshold,
            SEARCH_TOP_K,
        );

        tracing::debug!(results = ranked.len(), "Meeting search ranked");
        Ok(ranked)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MeetingServiceError {
    #[error("staging: {0}")]
    Staging(#[from] StagingStoreError),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("queue: {0}")]
    Queue(#[from] TaskQueueError),
    #[error("ai gateway: {0}")]
    Gateway(#[from] AiGatewayError),
}
