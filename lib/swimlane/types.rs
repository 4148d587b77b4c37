use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating or applying a swimlane change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwimlaneError {
    #[error(transparent)]
    InvalidStatus(#[from] UnknownStatus),
    #[error("invalid priority: {0}")]
    InvalidPriority(String),
    #[error("client {id} is not present in the loaded snapshot")]
    RecordNotFound { id: i64 },
}

/// A status label outside the fixed bucket set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status label: {0:?}")]
pub struct UnknownStatus(pub String);

/// The fixed, closed set of swimlanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Backlog,
    InProgress,
    Complete,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Backlog, Status::InProgress, Status::Complete];

    pub fn as_db_str(self) -> &'static str {
        match self {
            Status::Backlog => "backlog",
            Status::InProgress => "in-progress",
            Status::Complete => "complete",
        }
    }
}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "backlog" => Ok(Status::Backlog),
            "in-progress" => Ok(Status::InProgress),
            "complete" => Ok(Status::Complete),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// One client row as seen by the reorder path and the JSON API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientRecord {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Status,
    pub priority: i64,
}

/// Where the moving client should land inside a bucket.
///
/// Priorities are integers, but a cross-bucket insert has to land strictly between two of
/// them. Positions are therefore compared on a half-step grid where priority `p` sits at `2p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Exactly at priority `p`; the member currently holding `p` moves later.
    At(i64),
    /// Half a step before priority `p`.
    Before(i64),
    /// After every existing member.
    Last,
}

impl Placement {
    pub(crate) fn half_steps(self) -> i128 {
        match self {
            Placement::At(priority) => i128::from(priority) * 2,
            Placement::Before(priority) => i128::from(priority) * 2 - 1,
            Placement::Last => i128::MAX,
        }
    }

    /// Integer priority stored on the moving client until the bucket is compacted.
    ///
    /// `Before(p)` stores `p`: every other member at or after `p` has been pushed to at least
    /// `p + 1` and every member before it pulled to at most `p - 2`, so the slot is free.
    pub(crate) fn provisional_priority(self) -> i64 {
        match self {
            Placement::At(priority) | Placement::Before(priority) => priority,
            Placement::Last => i64::MAX,
        }
    }

    /// True when a member currently at `priority` has to move one step later to make room.
    pub(crate) fn displaces(self, priority: i64) -> bool {
        i128::from(priority) * 2 >= self.half_steps()
    }
}

/// Checks that a requested priority is a positive integer.
pub fn validate_priority(priority: i64) -> Result<i64, SwimlaneError> {
    if priority < 1 {
        return Err(SwimlaneError::InvalidPriority(format!(
            "priority must be >= 1, got {priority}"
        )));
    }
    Ok(priority)
}
