use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    AiGateway, AiGatewayError, ChunkRepository, LeasedTask, MeetingRepository, RepositoryError,
    StagingStore, StagingStoreError, TaskDisposition, TaskQueue, TaskQueueError,
};
use crate::application::services::chunker::{ChunkerError, TranscriptChunker};
use crate::domain::{Chunk, ProcessingTask, StoragePath};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Lease length per pull. Generous (minutes) because a single
    /// transcription call can legitimately run that long; a shorter value
    /// would requeue healthy tasks.
    pub visibility: Duration,
    /// Sleep between polls when the queue is empty.
    pub poll_interval: Duration,
    /// Chars of transcript fed to the whole-document embedding call.
    pub embed_input_cap: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: TranscriptChunker::DEFAULT_SIZE,
            chunk_overlap: TranscriptChunker::DEFAULT_OVERLAP,
            visibility: Duration::from_secs(600),
            poll_interval: Duration::from_secs(10),
            embed_input_cap: 8000,
        }
    }
}

/// Single-flight worker draining the processing queue.
///
/// One task is in flight at a time: the external AI call is slow and
/// rate-limited, and serializing also rules out concurrent writes to the
/// same meeting. Every task outcome ends up as a meeting status update;
/// nothing escapes the run loop.
pub struct ProcessingWorker {
    queue: Arc<dyn TaskQueue>,
    gateway: Arc<dyn AiGateway>,
    meetings: Arc<dyn MeetingRepository>,
    chunks: Arc<dyn ChunkRepository>,
    staging: Arc<dyn StagingStore>,
    chunker: TranscriptChunker,
    config: WorkerConfig,
}

impl ProcessingWorker {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        gateway: Arc<dyn AiGateway>,
        meetings: Arc<dyn MeetingRepository>,
        chunks: Arc<dyn ChunkRepository>,
        staging: Arc<dyn StagingStore>,
        config: WorkerConfig,
    ) -> Result<Self, ChunkerError> {
        let chunker = TranscriptChunker::new(config.chunk_size, config.chunk_overlap)?;
        Ok(Self {
            queue,
            gateway,
            meetings,
            chunks,
            staging,
            chunker,
            config,
        })
    }

    pub async fn run(self) {
        tracing::info!("Processing worker started");
        loop {
            match self.tick().await {
                Ok(true) => {}
                Ok(false) => tokio::time::sleep(self.config.poll_interval).await,
                Err(e) => {
                    tracing::error!(error = %e, "Queue pull failed");
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }
    }

    /// Pull and handle at most one task. Returns whether a task was
    /// processed.
    pub async fn tick(&self) -> Result<bool, TaskQueueError> {
        self.settle_exhausted().await?;

        let Some(leased) = self.queue.pull(self.config.visibility).await? else {
            return Ok(false);
        };

        let span = tracing::info_span!(
            "processing_task",
            task_id = %leased.task.id,
            meeting_id = %leased.task.meeting_id,
            attempt = leased.attempt,
        );
        let _guard = span.enter();

        self.handle(leased).await;
        Ok(true)
    }

    /// Process tasks until the queue is empty. Used by tests and one-shot
    /// runs.
    pub async fn drain(&self) -> Result<usize, TaskQueueError> {
        let mut processed = 0;
        while self.tick().await? {
            processed += 1;
        }
        Ok(processed)
    }

    /// A worker that died mid-attempt never reaches `fail`, so a task can
    /// run out of attempts with its lease expired and its meeting still
    /// PROCESSING. Park those tasks and settle their meetings here.
    async fn settle_exhausted(&self) -> Result<(), TaskQueueError> {
        for meeting_id in self.queue.reap_exhausted().await? {
            tracing::warn!(meeting_id = %meeting_id, "Stalled task out of attempts");
            if let Err(e) = self.meetings.mark_failed(meeting_id).await {
                tracing::error!(error = %e, meeting_id = %meeting_id, "Failed to mark meeting failed");
            }
        }
        Ok(())
    }

    async fn handle(&self, leased: LeasedTask) {
        let task = leased.task;

        match self.process(&task).await {
            Ok(()) => {
                if let Err(e) = self.queue.complete(task.id).await {
                    tracing::error!(error = %e, "Failed to ack completed task");
                }
                self.release(&task.storage_path).await;
                tracing::info!("Meeting processed");
            }
            Err(e) => {
                tracing::error!(error = %e, retryable = e.is_retryable(), "Task failed");

                let disposition = match self
                    .queue
                    .fail(task.id, &e.to_string(), e.is_retryable())
                    .await
                {
                    Ok(d) => d,
                    Err(ack_err) => {
                        // The lease will expire and the task comes back;
                        // leave the meeting and the staged file alone.
                        tracing::error!(error = %ack_err, "Failed to record task failure");
                        return;
                    }
                };

                match disposition {
                    TaskDisposition::Requeued => {
                        tracing::warn!("Task requeued for another attempt");
                    }
                    TaskDisposition::Terminal => {
                        if let Err(mark_err) = self.meetings.mark_failed(task.meeting_id).await {
                            tracing::error!(error = %mark_err, "Failed to mark meeting failed");
                        }
                        self.release(&task.storage_path).await;
                    }
                }
            }
        }
    }

    async fn process(&self, task: &ProcessingTask) -> Result<(), WorkerError> {
        // Fail fast on unreadable input before committing to a long AI
        // call. Missing input is not retryable: the upload is gone.
        self.staging
            .head(&task.storage_path)
            .await
            .map_err(WorkerError::Input)?;
        let audio = self
            .staging
            .fetch(&task.storage_path)
            .await
            .map_err(WorkerError::Input)?;

        tracing::info!(bytes = audio.len(), "Starting AI analysis");
        let analysis = self
            .gateway
            .analyze_audio(&audio, &task.media_type)
            .await
            .map_err(WorkerError::Provider)?;
        drop(audio);

        let embed_input: String = analysis
            .transcript
            .chars()
            .take(self.config.embed_input_cap)
            .collect();
        let document_embedding = self
            .gateway
            .embed(&embed_input)
            .await
            .map_err(WorkerError::Provider)?;

        let windows = self.chunker.split(&analysis.transcript);

        // Chunk embeddings fan out concurrently; they are independent and
        // write to disjoint records. One failure fails the whole task.
        let embeddings = futures::future::try_join_all(
            windows.iter().map(|w| self.gateway.embed(&w.text)),
        )
        .await
        .map_err(WorkerError::Provider)?;

        let chunks: Vec<Chunk> = windows
            .into_iter()
            .zip(embeddings)
            .map(|(w, e)| Chunk::new(task.meeting_id, w.text, e, w.start_offset, w.end_offset))
            .collect();

        tracing::debug!(
            transcript_chars = analysis.transcript.chars().count(),
            chunk_count = chunks.len(),
            "Persisting analysis"
        );

        // Chunks first, status flip last: the status transition must stay
        // monotonic, and chunks may exist transiently before completion.
        if let Err(e) = self
            .chunks
            .replace_for_meeting(task.meeting_id, &chunks)
            .await
        {
            self.log_unrecoverable(&analysis.transcript);
            return Err(WorkerError::Persistence(e));
        }

        if let Err(e) = self
            .meetings
            .mark_completed(
                task.meeting_id,
                &analysis.transcript,
                &analysis.summary,
                &document_embedding,
            )
            .await
        {
            self.log_unrecoverable(&analysis.transcript);
            return Err(WorkerError::Persistence(e));
        }

        Ok(())
    }

    /// The transcript is not recoverable once the provider-side artifacts
    /// are cleaned up, so dump it to the log before losing it to a failed
    /// write.
    fn log_unrecoverable(&self, transcript: &str) {
        tracing::error!(transcript = %transcript, "Persistence failed after successful AI call; raw transcript follows");
    }

    async fn release(&self, path: &StoragePath) {
        if let Err(e) = self.staging.delete(path).await {
            tracing::warn!(error = %e, path = %path, "Failed to delete staged audio");
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("input: {0}")]
    Input(StagingStoreError),
    #[error("provider: {0}")]
    Provider(AiGatewayError),
    #[error("persistence: {0}")]
    Persistence(RepositoryError),
}

impl WorkerError {
    /// Only provider failures (timeouts, quota, malformed output) are worth
    /// another attempt; missing input and store failures are terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkerError::Provider(_))
    }
}
