use serde::Deserialize;

use crate::application::ports::{AiGatewayError, AudioAnalysis};
use crate::domain::{Sentiment, Summary};

/// Parse the provider's free-form analysis text into a validated
/// `AudioAnalysis`.
///
/// The model is asked for raw JSON but routinely wraps it in markdown
/// fences or prose, so the outermost `{...}` is extracted first. Fields
/// must match the schema (arrays of strings, string sentiment); missing
/// fields default to empty rather than propagating nulls. Anything that
/// does not parse is `MalformedResponse` carrying the raw text.
pub fn parse_analysis(raw: &str) -> Result<AudioAnalysis, AiGatewayError> {
    let json = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => &raw[start..=end],
        _ => return Err(AiGatewayError::MalformedResponse(raw.to_string())),
    };

    let parsed: RawAnalysis = serde_json::from_str(json)
        .map_err(|_| AiGatewayError::MalformedResponse(raw.to_string()))?;

    Ok(AudioAnalysis {
        transcript: parsed.transcription,
        summary: Summary {
            key_points: parsed.summary.key_points,
            decisions: parsed.summary.decisions,
            follow_ups: parsed.summary.follow_ups,
            sentiment: Sentiment::parse_lenient(&parsed.summary.sentiment),
        },
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    #[serde(default)]
    transcription: String,
    #[serde(default)]
    summary: RawSummary,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawSummary {
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    decisions: Vec<String>,
    #[serde(default)]
    follow_ups: Vec<String>,
    #[serde(default)]
    sentiment: String,
}
