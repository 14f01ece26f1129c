use serde::{Deserialize, Serialize};

pub type UserId = uuid::Uuid;
pub type GroupId = uuid::Uuid;
pub type EventId = uuid::Uuid;

/// Attendance state of one user on one event.
///
/// Every entitled user sits in exactly one of these buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Undecided,
    In,
    Out,
    Waitlist,
}

impl RsvpStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undecided => "undecided",
            Self::In => "in",
            Self::Out => "out",
            Self::Waitlist => "waitlist",
        }
    }
}

impl std::fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
