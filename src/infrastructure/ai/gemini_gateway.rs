use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::response_parser::parse_analysis;
use crate::application::ports::{AiGateway, AiGatewayError, AudioAnalysis};
use crate::domain::Embedding;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const FILE_POLL_INTERVAL: Duration = Duration::from_secs(1);

const ANALYSIS_PROMPT: &str = "You are a CRM assistant. Listen to this audio.\n\
1. Transcribe the conversation nicely.\n\
2. Summarize key points, decisions, and follow-ups.\n\
3. Determine client sentiment (Positive/Neutral/Negative).\n\
4. Return ONLY raw JSON (no markdown formatting) in this structure:\n\
{\n\
  \"transcription\": \"...\",\n\
  \"summary\": { \"keyPoints\": [], \"decisions\": [], \"followUps\": [], \"sentiment\": \"\" }\n\
}";

/// Gemini-flavored REST adapter: audio upload + generate for analysis,
/// embedContent for vectors, generateContent for answers. Timeouts apply
/// per call; total task duration is unbounded by design.
pub struct GeminiGateway {
    client: Client,
    api_key: String,
    base_url: String,
    generation_model: String,
    embedding_model: String,
}

impl GeminiGateway {
    pub fn new(
        api_key: String,
        generation_model: String,
        embedding_model: String,
        request_timeout: Duration,
    ) -> Result<Self, AiGatewayError> {
        Self::with_base_url(
            api_key,
            generation_model,
            embedding_model,
            request_timeout,
            DEFAULT_BASE_URL.to_string(),
        )
    }

    pub fn with_base_url(
        api_key: String,
        generation_model: String,
        embedding_model: String,
        request_timeout: Duration,
        base_url: String,
    ) -> Result<Self, AiGatewayError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| AiGatewayError::ApiRequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url,
            generation_model,
            embedding_model,
        })
    }

    async fn upload_file(&self, data: &[u8], media_type: &str) -> Result<FileInfo, AiGatewayError> {
        let url = format!("{}/upload/v1beta/files?key={}", self.base_url, self.api_key);
        let response = self
            .client
            .post(&url)
            .header("X-Goog-Upload-Protocol", "raw")
            .header("Content-Type", media_type)
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| AiGatewayError::ApiRequestFailed(e.to_string()))?;

        let body: UploadResponse = Self::decode(response).await?;
        Ok(body.file)
    }

    /// The provider processes uploads asynchronously; poll until the file
    /// leaves PROCESSING.
    async fn await_file_active(&self, mut file: FileInfo) -> Result<FileInfo, AiGatewayError> {
        while file.state.as_deref() == Some("PROCESSING") {
            tokio::time::sleep(FILE_POLL_INTERVAL).await;
            let url = format!("{}/v1beta/{}?key={}", self.base_url, file.name, self.api_key);
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| AiGatewayError::ApiRequestFailed(e.to_string()))?;
            file = Self::decode(response).await?;
        }

        if file.state.as_deref() == Some("FAILED") {
            return Err(AiGatewayError::AudioProcessingFailed(format!(
                "provider rejected uploaded audio {}",
                file.name
            )));
        }

        Ok(file)
    }

    async fn generate(&self, parts: serde_json::Value) -> Result<String, AiGatewayError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.generation_model, self.api_key
        );
        let body = json!({ "contents": [{ "parts": parts }] });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiGatewayError::ApiRequestFailed(e.to_string()))?;

        let generated: GenerateResponse = Self::decode(response).await?;
        generated
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| {
                AiGatewayError::MalformedResponse("no candidates in generate response".to_string())
            })
    }

    /// Remote temp files count against provider quota; delete on success
    /// and failure alike, never masking the original error.
    async fn cleanup_file(&self, name: &str) {
        let url = format!("{}/v1beta/{}?key={}", self.base_url, name, self.api_key);
        if let Err(e) = self.client.delete(&url).send().await {
            tracing::warn!(error = %e, file = %name, "Failed to delete provider temp file");
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AiGatewayError> {
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(AiGatewayError::RateLimited);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AiGatewayError::ApiRequestFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }
        response
            .json()
            .await
            .map_err(|e| AiGatewayError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl AiGateway for GeminiGateway {
    #[tracing::instrument(skip(self, data), fields(bytes = data.len(), media_type = %media_type))]
    async fn analyze_audio(
        &self,
        data: &[u8],
        media_type: &str,
    ) -> Result<AudioAnalysis, AiGatewayError> {
        let uploaded = self.upload_file(data, media_type).await?;
        let file_name = uploaded.name.clone();

        let result = async {
            let file = self.await_file_active(uploaded).await?;
            let text = self
                .generate(json!([
                    { "fileData": { "mimeType": file.mime_type, "fileUri": file.uri } },
                    { "text": ANALYSIS_PROMPT }
                ]))
                .await?;
            parse_analysis(&text)
        }
        .await;

        self.cleanup_file(&file_name).await;
        result
    }

    async fn embed(&self, text: &str) -> Result<Embedding, AiGatewayError> {
        let url = format!(
            "{}/v1beta/models/{}:embedContent?key={}",
            self.base_url, self.embedding_model, self.api_key
        );
        let body = json!({ "content": { "parts": [{ "text": text }] } });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiGatewayError::ApiRequestFailed(e.to_string()))?;

        let embedded: EmbedResponse = Self::decode(response).await?;
        Ok(Embedding::new(embedded.embedding.values))
    }

    async fn answer(&self, question: &str, context: &str) -> Result<String, AiGatewayError> {
        let prompt = format!(
            "You are an assistant answering questions about recorded meetings.\n\
             Answer using ONLY the context below. If the context does not \
             contain the answer, say you don't know instead of guessing.\n\n\
             {}\n\nQUESTION: {}",
            context, question
        );
        self.generate(json!([{ "text": prompt }])).await
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    file: FileInfo,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileInfo {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    mime_type: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbedValues,
}

#[derive(Deserialize)]
struct EmbedValues {
    values: Vec<f32>,
}
