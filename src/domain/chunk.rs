use uuid::Uuid;

use super::{Embedding, MeetingId};

/// An overlapping window of a meeting transcript, embedded independently
/// for fine-grained retrieval. Chunks are written once by the worker and
/// never updated.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: ChunkId,
    pub meeting_id: MeetingId,
    pub content: String,
    pub embedding: Embedding,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Chunk {
    pub fn new(
        meeting_id: MeetingId,
        content: String,
        embedding: Embedding,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Self {
            id: ChunkId::new(),
            meeting_id,
            content,
            embedding,
            start_offset,
            end_offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkId(Uuid);

impl ChunkId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ChunkId {
    fn default() -> Self {
        Self::new()
    }
}
