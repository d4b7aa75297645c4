use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{ChunkRepository, RepositoryError};
use crate::domain::{Chunk, ChunkId, Embedding, MeetingId};

pub struct PgChunkRepository {
    pool: PgPool,
}

impl PgChunkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &PgRow) -> Result<Chunk, RepositoryError> {
        let embedding: Vec<f32> = row
            .try_get("embedding")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
        let start_offset: i64 = row
            .try_get("start_offset")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
        let end_offset: i64 = row
            .try_get("end_offset")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(Chunk {
            id: ChunkId::from_uuid(
                row.try_get::<Uuid, _>("id")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            ),
            meeting_id: MeetingId::from_uuid(
                row.try_get::<Uuid, _>("meeting_id")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            ),
            content: row
                .try_get("content")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            embedding: Embedding::new(embedding),
            start_offset: start_offset as usize,
            end_offset: end_offset as usize,
        })
    }
}

#[async_trait]
impl ChunkRepository for PgChunkRepository {
    #[instrument(skip(self, chunks), fields(meeting_id = %meeting_id, chunk_count = chunks.len()))]
    async fn replace_for_meeting(
        &self,
        meeting_id: MeetingId,
        chunks: &[Chunk],
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        sqlx::query("DELETE FROM meeting_chunks WHERE meeting_id = $1")
            .bind(meeting_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        for chunk in chunks {
            sqlx::query(
                "INSERT INTO meeting_chunks (id, meeting_id, content, embedding, start_offset, end_offset)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(chunk.id.as_uuid())
            .bind(chunk.meeting_id.as_uuid())
            .bind(&chunk.content)
            .bind(&chunk.embedding.values)
            .bind(chunk.start_offset as i64)
            .bind(chunk.end_offset as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(scope = ?scope.map(|s| s.as_uuid())))]
    async fn list(&self, scope: Option<MeetingId>) -> Result<Vec<Chunk>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, meeting_id, content, embedding, start_offset, end_offset
             FROM meeting_chunks
             WHERE ($1::uuid IS NULL OR meeting_id = $1)
             ORDER BY meeting_id, start_offset",
        )
        .bind(scope.map(|s| s.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::from_row).collect()
    }
}
