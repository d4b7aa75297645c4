use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{MeetingRepository, RepositoryError};
use crate::domain::{Embedding, Meeting, MeetingId, MeetingStatus, Summary};

pub struct PgMeetingRepository {
    pool: PgPool,
}

impl PgMeetingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &PgRow) -> Result<Meeting, RepositoryError> {
        let status: String = row
            .try_get("status")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
        let status = status
            .parse::<MeetingStatus>()
            .map_err(RepositoryError::QueryFailed)?;

        let summary: Option<serde_json::Value> = row
            .try_get("summary")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
        let summary: Option<Summary> = summary
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let embedding: Option<Vec<f32>> = row
            .try_get("embedding")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(Meeting {
            id: MeetingId::from_uuid(
                row.try_get::<Uuid, _>("id")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            ),
            client_name: row
                .try_get("client_name")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            status,
            transcript: row
                .try_get("transcript")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            summary,
            embedding: embedding.map(Embedding::new),
            created_at: row
                .try_get("created_at")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            updated_at: row
                .try_get("updated_at")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        })
    }
}

const MEETING_COLUMNS: &str =
    "id, client_name, status, transcript, summary, embedding, created_at, updated_at";

#[async_trait]
impl MeetingRepository for PgMeetingRepository {
    #[instrument(skip(self, meeting), fields(meeting_id = %meeting.id))]
    async fn create(&self, meeting: &Meeting) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO meetings (id, client_name, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(meeting.id.as_uuid())
        .bind(&meeting.client_name)
        .bind(meeting.status.as_str())
        .bind(meeting.created_at)
        .bind(meeting.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(meeting_id = %id))]
    async fn get_by_id(&self, id: MeetingId) -> Result<Option<Meeting>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM meetings WHERE id = $1",
            MEETING_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.as_ref().map(Self::from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        limit: usize,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Meeting>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM meetings
             WHERE ($2::timestamptz IS NULL OR created_at < $2)
             ORDER BY created_at DESC
             LIMIT $1",
            MEETING_COLUMNS
        ))
        .bind(limit as i64)
        .bind(before)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::from_row).collect()
    }

    #[instrument(skip(self))]
    async fn list_completed(&self) -> Result<Vec<Meeting>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM meetings WHERE status = 'COMPLETED' ORDER BY created_at",
            MEETING_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::from_row).collect()
    }

    #[instrument(skip(self, transcript, summary, embedding), fields(meeting_id = %id))]
    async fn mark_completed(
        &self,
        id: MeetingId,
        transcript: &str,
        summary: &Summary,
        embedding: &Embedding,
    ) -> Result<(), RepositoryError> {
        let summary_json = serde_json::to_value(summary)
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        // The status guard keeps the transition monotonic: only a meeting
        // still in PROCESSING can complete.
        let result = sqlx::query(
            "UPDATE meetings
             SET status = 'COMPLETED', transcript = $2, summary = $3, embedding = $4, updated_at = $5
             WHERE id = $1 AND status = 'PROCESSING'",
        )
        .bind(id.as_uuid())
        .bind(transcript)
        .bind(summary_json)
        .bind(&embedding.values)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::ConstraintViolation(format!(
                "meeting {} is not in PROCESSING",
                id
            )));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(meeting_id = %id))]
    async fn mark_failed(&self, id: MeetingId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE meetings
             SET status = 'FAILED', updated_at = $2
             WHERE id = $1 AND status = 'PROCESSING'",
        )
        .bind(id.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::ConstraintViolation(format!(
                "meeting {} is not in PROCESSING",
                id
            )));
        }
        Ok(())
    }
}
