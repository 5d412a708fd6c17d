//! Client record model.

use crate::error::{CoreError, Result};
use crate::lane::Lane;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Store-assigned client identifier.
pub type ClientId = i64;

/// A client record tracked on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Unique, immutable identifier.
    pub id: ClientId,

    /// Display name.
    pub name: String,

    /// Free-form description (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Lane the client currently occupies.
    pub status: Lane,

    /// 1-based rank within the lane; 1 is most urgent.
    pub priority: u32,
}

impl Client {
    /// Create a client record with the given placement.
    #[must_use]
    pub fn new(id: ClientId, name: impl Into<String>, status: Lane, priority: u32) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            status,
            priority,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A validated, strictly positive priority.
///
/// Capped at [`Priority::MAX`] so that shifting or appending above any
/// requested rank still fits in a `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Priority(u32);

impl Priority {
    /// Largest priority a request may ask for.
    pub const MAX: u32 = i32::MAX.unsigned_abs();

    /// Validate an integer priority.
    ///
    /// # Errors
    /// Returns `InvalidPriority` if the value is not in `1..=Priority::MAX`.
    pub fn new(value: i64) -> Result<Self> {
        u32::try_from(value)
            .ok()
            .filter(|v| (1..=Self::MAX).contains(v))
            .map(Self)
            .ok_or_else(|| CoreError::InvalidPriority(value.to_string()))
    }

    /// Validate a priority taken from a request body.
    ///
    /// Accepts a JSON integer, an integral float such as `3.0`, or a string
    /// holding an integer.
    ///
    /// # Errors
    /// Returns `InvalidPriority` for anything that is not a positive integer.
    pub fn from_json(value: &Value) -> Result<Self> {
        let invalid = || CoreError::InvalidPriority(value.to_string());
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::new(i)
                } else {
                    let f = n.as_f64().ok_or_else(invalid)?;
                    if f.fract() != 0.0 || f < 1.0 || f > f64::from(Self::MAX) {
                        return Err(invalid());
                    }
                    // Integral and within 1..=Priority::MAX, so the cast is exact.
                    #[allow(clippy::cast_possible_truncation)]
                    let whole = f as i64;
                    Self::new(whole)
                }
            }
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| invalid())
                .and_then(Self::new),
            _ => Err(invalid()),
        }
    }

    /// The underlying rank.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A validated request to move a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reassignment {
    /// Client to move.
    pub id: ClientId,
    /// Target lane; `None` keeps the current lane.
    pub lane: Option<Lane>,
    /// Target rank; `None` keeps the current rank, or appends on a lane change.
    pub priority: Option<Priority>,
}

impl Reassignment {
    /// Request a move with already-typed arguments.
    #[must_use]
    pub const fn new(id: ClientId, lane: Option<Lane>, priority: Option<Priority>) -> Self {
        Self { id, lane, priority }
    }

    /// Validate raw request fields.
    ///
    /// # Errors
    /// Returns `InvalidLane` or `InvalidPriority` when a supplied field is malformed.
    pub fn parse(id: ClientId, status: Option<&str>, priority: Option<&Value>) -> Result<Self> {
        let lane = status.map(str::parse::<Lane>).transpose()?;
        let priority = priority
            .filter(|v| !v.is_null())
            .map(Priority::from_json)
            .transpose()?;
        Ok(Self { id, lane, priority })
    }

    /// Validate fields taken straight from a JSON request body.
    ///
    /// `null` and absent fields both mean "not supplied".
    ///
    /// # Errors
    /// Returns `InvalidLane` or `InvalidPriority` when a supplied field has
    /// the wrong type or value.
    pub fn from_json(id: ClientId, status: Option<&Value>, priority: Option<&Value>) -> Result<Self> {
        let lane = status
            .filter(|v| !v.is_null())
            .map(Lane::from_json)
            .transpose()?;
        let priority = priority
            .filter(|v| !v.is_null())
            .map(Priority::from_json)
            .transpose()?;
        Ok(Self { id, lane, priority })
    }
}
