use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::ports::{
    AiGateway, AiGatewayError, ChatRepository, ChunkRepository, MeetingRepository, RepositoryError,
};
use crate::application::services::ranking::{rank_by_similarity, Ranked};
use crate::domain::{ChatMessage, Chunk, MeetingId, SourceRef, Summary};

#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Chunks fed into the prompt, after threshold filtering.
    pub top_k: usize,
    /// Similarity cutoff for chunk retrieval. Tighter than meeting search
    /// because chunk text is noisier.
    pub chunk_threshold: f32,
    /// Recent conversation turns carried for continuity.
    pub history_turns: usize,
    /// Hard ceiling on assembled context, in chars.
    pub context_budget_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            chunk_threshold: 0.4,
            history_turns: 6,
            context_budget_chars: 6000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatAnswer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

/// Retrieval-augmented chat over one meeting or all of them.
///
/// Each successful turn persists exactly two messages: the user question
/// and the assistant reply (sources attached), even when the reply is a
/// degenerate "I don't know". A failed provider call persists nothing.
pub struct ChatService {
    gateway: Arc<dyn AiGateway>,
    meetings: Arc<dyn MeetingRepository>,
    chunks: Arc<dyn ChunkRepository>,
    chat: Arc<dyn ChatRepository>,
    config: ChatConfig,
}

impl ChatService {
    pub fn new(
        gateway: Arc<dyn AiGateway>,
        meetings: Arc<dyn MeetingRepository>,
        chunks: Arc<dyn ChunkRepository>,
        chat: Arc<dyn ChatRepository>,
        config: ChatConfig,
    ) -> Self {
        Self {
            gateway,
            meetings,
            chunks,
            chat,
            config,
        }
    }

    #[tracing::instrument(skip(self, query), fields(scope = ?scope.map(|s| s.as_uuid())))]
    pub async fn answer(
        &self,
        query: &str,
        scope: Option<MeetingId>,
    ) -> Result<ChatAnswer, ChatError> {
        let query_embedding = self.gateway.embed(query).await?;

        // Scoped chats always carry the meeting summary; it is cheap and
        // high-signal, so it outranks chunk excerpts in the context.
        let summary = match scope {
            Some(id) => self
                .meetings
                .get_by_id(id)
                .await?
                .and_then(|m| m.summary),
            None => None,
        };

        let candidates = self.chunks.list(scope).await?;
        let ranked = rank_by_similarity(
            &query_embedding,
            candidates,
            |c: &Chunk| Some(&c.embedding),
            self.config.chunk_threshold,
            self.config.top_k,
        );

        let recent = self.recent_turns(scope).await?;

        let context = assemble_context(
            &recent,
            summary.as_ref(),
            &ranked,
            self.config.context_budget_chars,
        );
        tracing::debug!(
            context_chars = context.chars().count(),
            chunks = ranked.len(),
            history = recent.len(),
            "Context assembled"
        );

        let answer = self.gateway.answer(query, &context).await?;

        let sources: Vec<SourceRef> = ranked
            .iter()
            .map(|r| SourceRef::new(r.item.id, r.item.meeting_id, r.similarity))
            .collect();

        let user_msg = ChatMessage::user(query.to_string(), scope);
        let assistant_msg = ChatMessage::assistant(answer.clone(), scope, sources.clone());
        self.chat.append_pair(&user_msg, &assistant_msg).await?;

        Ok(ChatAnswer { answer, sources })
    }

    pub async fn history(
        &self,
        limit: usize,
        before: Option<DateTime<Utc>>,
        scope: Option<MeetingId>,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        Ok(self.chat.history(limit, before, scope).await?)
    }

    /// Last N turns in chronological order.
    async fn recent_turns(
        &self,
        scope: Option<MeetingId>,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let mut turns = self
            .chat
            .history(self.config.history_turns, None, scope)
            .await?;
        turns.reverse();
        Ok(turns)
    }
}

/// Build the prompt context in fixed priority order: conversation history,
/// then meeting summary, then chunk excerpts. When the combined text
/// exceeds `budget_chars`, whole blocks are dropped from the low-priority
/// end (last excerpt first, then the summary); the surviving prefix is
/// hard-cut only if a single block still exceeds the budget.
pub fn assemble_context(
    history: &[ChatMessage],
    summary: Option<&Summary>,
    excerpts: &[Ranked<Chunk>],
    budget_chars: usize,
) -> String {
    let mut blocks: Vec<String> = Vec::new();

    if !history.is_empty() {
        let turns: Vec<String> = history
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect();
        blocks.push(format!("CONVERSATION HISTORY:\n{}", turns.join("\n")));
    }

    if let Some(summary) = summary {
        blocks.push(format!(
            "MEETING SUMMARY:\nKey points:\n{}\n\nDecisions:\n{}\n\nFollow-ups:\n{}\n\nSentiment: {}",
            summary.key_points.join("\n"),
            summary.decisions.join("\n"),
            summary.follow_ups.join("\n"),
            summary.sentiment
        ));
    }

    for ranked in excerpts {
        blocks.push(format!("Transcript excerpt: {}", ranked.item.content));
    }

    let joined_len = |blocks: &[String]| -> usize {
        let sep = if blocks.len() > 1 {
            (blocks.len() - 1) * 2
        } else {
            0
        };
        blocks.iter().map(|b| b.chars().count()).sum::<usize>() + sep
    };

    while blocks.len() > 1 && joined_len(&blocks) > budget_chars {
        blocks.pop();
    }

    let mut context = blocks.join("\n\n");
    if context.chars().count() > budget_chars {
        context = context.chars().take(budget_chars).collect();
    }
    context
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("ai gateway: {0}")]
    Gateway(#[from] AiGatewayError),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}
