use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{ChatRepository, RepositoryError};
use crate::domain::{ChatMessage, MeetingId, MessageId, MessageRole, SourceRef};

pub struct PgChatRepository {
    pool: PgPool,
}

impl PgChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &PgRow) -> Result<ChatMessage, RepositoryError> {
        let role: String = row
            .try_get("role")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
        let role = role
            .parse::<MessageRole>()
            .map_err(RepositoryError::QueryFailed)?;

        let sources: Option<serde_json::Value> = row
            .try_get("sources")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
        let sources: Vec<SourceRef> = sources
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?
            .unwrap_or_default();

        Ok(ChatMessage {
            id: MessageId::from_uuid(
                row.try_get::<Uuid, _>("id")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            ),
            meeting_id: row
                .try_get::<Option<Uuid>, _>("meeting_id")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?
                .map(MeetingId::from_uuid),
            role,
            content: row
                .try_get("content")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            sources,
            created_at: row
                .try_get("created_at")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        })
    }

    async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        message: &ChatMessage,
    ) -> Result<(), RepositoryError> {
        let sources = if message.sources.is_empty() {
            None
        } else {
            Some(
                serde_json::to_value(&message.sources)
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            )
        };

        sqlx::query(
            "INSERT INTO chat_messages (id, meeting_id, role, content, sources, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(message.id.as_uuid())
        .bind(message.meeting_id.map(|m| m.as_uuid()))
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(sources)
        .bind(message.created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    #[instrument(skip(self, user, assistant), fields(user_id = %user.id.as_uuid(), assistant_id = %assistant.id.as_uuid()))]
    async fn append_pair(
        &self,
        user: &ChatMessage,
        assistant: &ChatMessage,
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Self::insert(&mut tx, user).await?;
        Self::insert(&mut tx, assistant).await?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(scope = ?scope.map(|s| s.as_uuid())))]
    async fn history(
        &self,
        limit: usize,
        before: Option<DateTime<Utc>>,
        scope: Option<MeetingId>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, meeting_id, role, content, sources, created_at
             FROM chat_messages
             WHERE ($2::timestamptz IS NULL OR created_at < $2)
               AND ($3::uuid IS NULL OR meeting_id = $3)
             ORDER BY created_at DESC
             LIMIT $1",
        )
        .bind(limit as i64)
        .bind(before)
        .bind(scope.map(|s| s.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::from_row).collect()
    }
}
