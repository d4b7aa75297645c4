use minutes::infrastructure::observability::sanitize_prompt;

#[test]
fn given_empty_prompt_when_sanitized_then_placeholder() {
    assert_eq!(sanitize_prompt(""), "[EMPTY]");
    assert_eq!(sanitize_prompt("   "), "[EMPTY]");
}

#[test]
fn given_short_prompt_when_sanitized_then_unchanged() {
    assert_eq!(
        sanitize_prompt("what was the budget?"),
        "what was the budget?"
    );
}

#[test]
fn given_long_prompt_when_sanitized_then_truncated_with_length() {
    let prompt = "a".repeat(250);

    let sanitized = sanitize_prompt(&prompt);

    assert!(sanitized.starts_with(&"a".repeat(100)));
    assert!(sanitized.contains("250 chars total"));
}

#[test]
fn given_bearer_token_when_sanitized_then_redacted() {
    let sanitized = sanitize_prompt("use Bearer abc123 for auth");

    assert!(!sanitized.contains("abc123"));
    assert!(sanitized.contains("Bearer [REDACTED]"));
}

#[test]
fn given_api_key_when_sanitized_then_redacted() {
    let sanitized = sanitize_prompt("call it with api_key=sk-secret-value please");

    assert!(!sanitized.contains("sk-secret-value"));
    assert!(sanitized.contains("api_key=[REDACTED]"));
}
