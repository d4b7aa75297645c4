use minutes::domain::{MeetingId, StoragePath};

#[test]
fn given_meeting_and_filename_when_building_path_then_prefixed_by_meeting_id() {
    let meeting_id = MeetingId::new();

    let path = StoragePath::new(&meeting_id, "call.webm");

    assert_eq!(
        path.as_str(),
        format!("{}/call.webm", meeting_id.as_uuid())
    );
}

#[test]
fn given_raw_string_when_rebuilding_path_then_preserved() {
    let path = StoragePath::from_raw("abc/recording.mp3".to_string());

    assert_eq!(path.as_str(), "abc/recording.mp3");
}
