use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a meeting. Starts at `Processing` and moves exactly
/// once to `Completed` or `Failed`; there is no reverse transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeetingStatus {
    Processing,
    Completed,
    Failed,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Processing => "PROCESSING",
            MeetingStatus::Completed => "COMPLETED",
            MeetingStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, MeetingStatus::Processing)
    }
}

impl FromStr for MeetingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESSING" => Ok(MeetingStatus::Processing),
            "COMPLETED" => Ok(MeetingStatus::Completed),
            "FAILED" => Ok(MeetingStatus::Failed),
            _ => Err(format!("Invalid meeting status: {}", s)),
        }
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
