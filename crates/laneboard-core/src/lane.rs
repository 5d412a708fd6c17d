//! Workflow lanes.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One of the three workflow stages a client can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Lane {
    /// Not yet started.
    Backlog,
    /// Currently being worked on.
    InProgress,
    /// Finished.
    Complete,
}

impl Lane {
    /// All lanes in board order.
    pub const ALL: [Self; 3] = [Self::Backlog, Self::InProgress, Self::Complete];

    /// Wire name of the lane, as stored and as accepted by the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::InProgress => "in-progress",
            Self::Complete => "complete",
        }
    }

    /// Parse a lane from a JSON value; anything but a known string is rejected.
    ///
    /// # Errors
    /// Returns `InvalidLane` for non-strings and unknown names.
    pub fn from_json(value: &Value) -> Result<Self, CoreError> {
        match value {
            Value::String(s) => s.parse(),
            other => Err(CoreError::InvalidLane(other.to_string())),
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lane {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|lane| lane.as_str() == s)
            .ok_or_else(|| CoreError::InvalidLane(s.to_string()))
    }
}
