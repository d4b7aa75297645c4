use async_trait::async_trait;

use crate::domain::{Embedding, Summary};

/// Transcript plus structured summary for one audio recording.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAnalysis {
    pub transcript: String,
    pub summary: Summary,
}

/// Adapter around the generative-AI provider. Pure request/response; holds
/// no state between calls.
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Transcribe and summarize a recording. Blocking from the caller's
    /// viewpoint; transcription time scales with audio length.
    async fn analyze_audio(
        &self,
        data: &[u8],
        media_type: &str,
    ) -> Result<AudioAnalysis, AiGatewayError>;

    async fn embed(&self, text: &str) -> Result<Embedding, AiGatewayError>;

    /// Answer `question` using only `context`. The adapter instructs the
    /// provider to decline rather than invent facts when the context is
    /// insufficient.
    async fn answer(&self, question: &str, context: &str) -> Result<String, AiGatewayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AiGatewayError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("audio processing failed: {0}")]
    AudioProcessingFailed(String),
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}
