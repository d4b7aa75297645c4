use std::str::FromStr;

use minutes::domain::MeetingStatus;

#[test]
fn given_status_when_round_tripped_through_str_then_unchanged() {
    for status in [
        MeetingStatus::Processing,
        MeetingStatus::Completed,
        MeetingStatus::Failed,
    ] {
        let parsed = MeetingStatus::from_str(status.as_str()).unwrap();
        assert_eq!(parsed, status);
    }
}

#[test]
fn given_unknown_string_when_parsed_then_rejected() {
    assert!(MeetingStatus::from_str("QUEUED").is_err());
    assert!(MeetingStatus::from_str("").is_err());
}

#[test]
fn given_statuses_when_checking_terminal_then_only_processing_is_not() {
    assert!(!MeetingStatus::Processing.is_terminal());
    assert!(MeetingStatus::Completed.is_terminal());
    assert!(MeetingStatus::Failed.is_terminal());
}
