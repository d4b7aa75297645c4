/// Logging options for subscriber setup. Resolved from `Settings` by the
/// caller rather than read from the process environment here, so the
/// config file and `APP_*` variables stay the single source of truth.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub environment: String,
    /// Base level directive for crates without an explicit override.
    pub level: String,
    pub json_format: bool,
}

impl TracingConfig {
    pub fn new(
        environment: impl Into<String>,
        level: impl Into<String>,
        json_format: bool,
    ) -> Self {
        Self {
            environment: environment.into(),
            level: level.into(),
            json_format,
        }
    }
}
