use minutes::domain::MessageRole;

#[test]
fn given_roles_when_rendered_then_lowercase() {
    assert_eq!(MessageRole::User.as_str(), "user");
    assert_eq!(MessageRole::Assistant.as_str(), "assistant");
    assert_eq!(MessageRole::Assistant.to_string(), "assistant");
}

#[test]
fn given_stored_role_when_parsed_then_case_ignored() {
    assert_eq!("user".parse::<MessageRole>().unwrap(), MessageRole::User);
    // Rows written before the lowercase convention.
    assert_eq!(
        "ASSISTANT".parse::<MessageRole>().unwrap(),
        MessageRole::Assistant
    );
}

#[test]
fn given_unknown_role_when_parsed_then_rejected() {
    assert!("system".parse::<MessageRole>().is_err());
}
