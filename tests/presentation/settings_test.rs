use minutes::presentation::config::{Environment, Settings};

#[test]
fn given_test_environment_when_loaded_then_file_values_deserialized() {
    let settings = Settings::load(Environment::Test).unwrap();

    assert_eq!(settings.server.port, 8181);
    assert_eq!(settings.queue.max_attempts, 2);
    assert_eq!(settings.chunking.size, 200);
    assert_eq!(settings.logging.level, "debug");
}

#[test]
fn given_nested_env_override_when_loaded_then_snake_case_key_wins() {
    std::env::set_var("APP_AI__API_KEY", "key-from-env");

    let settings = Settings::load(Environment::Test).unwrap();

    std::env::remove_var("APP_AI__API_KEY");
    assert_eq!(settings.ai.api_key, "key-from-env");
}
