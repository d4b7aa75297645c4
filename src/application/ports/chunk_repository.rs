use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{Chunk, MeetingId};

#[async_trait]
pub trait ChunkRepository: Send + Sync {
    /// Replace all chunks for a meeting in one shot. Re-running the worker
    /// for the same meeting must not accumulate duplicates.
    async fn replace_for_meeting(
        &self,
        meeting_id: MeetingId,
        chunks: &[Chunk],
    ) -> Result<(), RepositoryError>;

    /// Chunks for one meeting, or every chunk when no scope is given.
    async fn list(&self, scope: Option<MeetingId>) -> Result<Vec<Chunk>, RepositoryError>;
}
