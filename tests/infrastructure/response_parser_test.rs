use minutes::domain::Sentiment;
use minutes::infrastructure::ai::parse_analysis;

#[test]
fn given_plain_json_when_parsed_then_analysis_returned() {
    let raw = r#"{"transcription": "hello world", "summary": {"keyPoints": ["a"], "decisions": ["b"], "followUps": ["c"], "sentiment": "Positive"}}"#;

    let analysis = parse_analysis(raw).unwrap();

    assert_eq!(analysis.transcript, "hello world");
    assert_eq!(analysis.summary.key_points, vec!["a"]);
    assert_eq!(analysis.summary.decisions, vec!["b"]);
    assert_eq!(analysis.summary.follow_ups, vec!["c"]);
    assert_eq!(analysis.summary.sentiment, Sentiment::Positive);
}

#[test]
fn given_markdown_fenced_json_when_parsed_then_fences_stripped() {
    let raw = "```json\n{\"transcription\": \"fenced\", \"summary\": {\"sentiment\": \"negative\"}}\n```";

    let analysis = parse_analysis(raw).unwrap();

    assert_eq!(analysis.transcript, "fenced");
    assert_eq!(analysis.summary.sentiment, Sentiment::Negative);
}

#[test]
fn given_json_with_surrounding_prose_when_parsed_then_object_extracted() {
    let raw = "Here is the analysis you asked for:\n{\"transcription\": \"wrapped\"}\nLet me know if you need more.";

    let analysis = parse_analysis(raw).unwrap();

    assert_eq!(analysis.transcript, "wrapped");
}

#[test]
fn given_missing_summary_fields_when_parsed_then_defaults_applied() {
    let raw = r#"{"transcription": "minimal"}"#;

    let analysis = parse_analysis(raw).unwrap();

    assert!(analysis.summary.key_points.is_empty());
    assert!(analysis.summary.decisions.is_empty());
    assert!(analysis.summary.follow_ups.is_empty());
    assert_eq!(analysis.summary.sentiment, Sentiment::Neutral);
}

#[test]
fn given_unknown_sentiment_when_parsed_then_neutral() {
    let raw = r#"{"transcription": "t", "summary": {"sentiment": "elated"}}"#;

    let analysis = parse_analysis(raw).unwrap();

    assert_eq!(analysis.summary.sentiment, Sentiment::Neutral);
}

#[test]
fn given_no_json_object_when_parsed_then_malformed_error_with_raw_text() {
    let raw = "I could not process the audio.";

    let error = parse_analysis(raw).unwrap_err();

    assert!(error.to_string().contains("I could not process the audio."));
}

#[test]
fn given_invalid_json_when_parsed_then_malformed_error() {
    let raw = "{\"transcription\": }";

    assert!(parse_analysis(raw).is_err());
}

#[test]
fn given_wrong_field_types_when_parsed_then_malformed_error() {
    let raw = r#"{"transcription": "t", "summary": {"keyPoints": "not an array"}}"#;

    assert!(parse_analysis(raw).is_err());
}
