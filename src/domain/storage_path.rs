use std::fmt;

use super::MeetingId;

/// Location of a staged audio upload, relative to the staging store root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath(String);

impl StoragePath {
    pub fn new(meeting_id: &MeetingId, filename: &str) -> Self {
        Self(format!("{}/{}", meeting_id.as_uuid(), filename))
    }

    pub fn from_raw(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
