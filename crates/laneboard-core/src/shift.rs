//! Bulk rank shifts applied to a contiguous range of one lane.

use crate::lane::Lane;
use serde::Serialize;

/// Which way a shift moves the affected priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftDirection {
    /// Decrement priority by one (toward more urgent).
    Down,
    /// Increment priority by one (toward less urgent).
    Up,
}

/// A single bulk shift: every client in `lane` whose priority falls in
/// the range moves by one in `direction`.
///
/// Ranges are `(low, high]` for [`ShiftDirection::Down`] and `[low, high)`
/// for [`ShiftDirection::Up`]. A `high` of `None` leaves the range open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankShift {
    pub lane: Lane,
    pub direction: ShiftDirection,
    pub low: u32,
    pub high: Option<u32>,
}

impl RankShift {
    /// Decrement every rank in `(low, high]`.
    #[must_use]
    pub const fn close_range(lane: Lane, low: u32, high: u32) -> Self {
        Self {
            lane,
            direction: ShiftDirection::Down,
            low,
            high: Some(high),
        }
    }

    /// Increment every rank in `[low, high)`.
    #[must_use]
    pub const fn open_range(lane: Lane, low: u32, high: u32) -> Self {
        Self {
            lane,
            direction: ShiftDirection::Up,
            low,
            high: Some(high),
        }
    }

    /// Decrement every rank above `low`.
    #[must_use]
    pub const fn close_tail(lane: Lane, low: u32) -> Self {
        Self {
            lane,
            direction: ShiftDirection::Down,
            low,
            high: None,
        }
    }

    /// Increment every rank from `low` upward.
    #[must_use]
    pub const fn open_tail(lane: Lane, low: u32) -> Self {
        Self {
            lane,
            direction: ShiftDirection::Up,
            low,
            high: None,
        }
    }

    /// Whether a client at `(lane, priority)` is affected by this shift.
    #[must_use]
    pub fn applies_to(&self, lane: Lane, priority: u32) -> bool {
        if lane != self.lane {
            return false;
        }
        match self.direction {
            ShiftDirection::Down => {
                priority > self.low && self.high.is_none_or(|high| priority <= high)
            }
            ShiftDirection::Up => {
                priority >= self.low && self.high.is_none_or(|high| priority < high)
            }
        }
    }

    /// The new priority of an affected client.
    #[must_use]
    pub const fn apply(&self, priority: u32) -> u32 {
        match self.direction {
            ShiftDirection::Down => priority.saturating_sub(1),
            ShiftDirection::Up => priority.saturating_add(1),
        }
    }
}
