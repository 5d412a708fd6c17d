//! Priority reassignment engine.
//!
//! Moves a client to a new rank and/or lane while keeping every lane
//! densely ranked `1..=n`. The engine holds no state between calls: each
//! reassignment re-reads the client before deciding which shifts to issue.
//! Callers are responsible for running [`reassign`] inside a single
//! transaction so no reader observes a half-shifted lane.

use crate::client::{Client, ClientId, Reassignment};
use crate::error::{CoreError, Result};
use crate::lane::Lane;
use crate::shift::RankShift;
use serde::Serialize;
use tracing::{debug, info};

/// Storage operations the engine is written against.
pub trait LaneStore {
    /// Fetch a single client.
    ///
    /// # Errors
    /// Returns `Storage` if the backing store fails.
    fn get_by_id(&self, id: ClientId) -> Result<Option<Client>>;

    /// Fetch every client, in no particular order.
    ///
    /// # Errors
    /// Returns `Storage` if the backing store fails.
    fn get_all(&self) -> Result<Vec<Client>>;

    /// Fetch the clients in one lane.
    ///
    /// # Errors
    /// Returns `Storage` if the backing store fails.
    fn get_by_lane(&self, lane: Lane) -> Result<Vec<Client>>;

    /// Apply one bulk shift.
    ///
    /// # Errors
    /// Returns `Storage` if the backing store fails.
    fn apply_shift(&mut self, shift: &RankShift) -> Result<()>;

    /// Point update of a client's lane and priority.
    ///
    /// # Errors
    /// Returns `Storage` if the backing store fails.
    fn set_item(&mut self, id: ClientId, lane: Lane, priority: u32) -> Result<()>;

    /// Highest priority currently held in `lane`, or `None` if it is empty.
    ///
    /// # Errors
    /// Returns `Storage` if the backing store fails.
    fn max_priority(&self, lane: Lane) -> Result<Option<u32>> {
        Ok(self.get_by_lane(lane)?.iter().map(|c| c.priority).max())
    }

    /// Decrement every priority in `(low, high]` of `lane`.
    ///
    /// # Errors
    /// Returns `Storage` if the backing store fails.
    fn shift_priority_down(&mut self, lane: Lane, low: u32, high: u32) -> Result<()> {
        self.apply_shift(&RankShift::close_range(lane, low, high))
    }

    /// Increment every priority in `[low, high)` of `lane`.
    ///
    /// # Errors
    /// Returns `Storage` if the backing store fails.
    fn shift_priority_up(&mut self, lane: Lane, low: u32, high: u32) -> Result<()> {
        self.apply_shift(&RankShift::open_range(lane, low, high))
    }

    /// Decrement every priority above `low` in `lane`.
    ///
    /// # Errors
    /// Returns `Storage` if the backing store fails.
    fn shift_priority_down_open_end(&mut self, lane: Lane, low: u32) -> Result<()> {
        self.apply_shift(&RankShift::close_tail(lane, low))
    }

    /// Increment every priority from `low` upward in `lane`.
    ///
    /// # Errors
    /// Returns `Storage` if the backing store fails.
    fn shift_priority_up_open_end(&mut self, lane: Lane, low: u32) -> Result<()> {
        self.apply_shift(&RankShift::open_tail(lane, low))
    }
}

/// Final position of a reassigned client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub lane: Lane,
    pub priority: u32,
}

/// Ordered store writes that carry out one reassignment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReassignPlan {
    /// Shifts to apply, in order, before the point update.
    pub shifts: Vec<RankShift>,
    /// Where the client ends up; `None` means nothing changes.
    pub placement: Option<Placement>,
}

impl ReassignPlan {
    /// Whether the plan leaves the store untouched.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.placement.is_none()
    }
}

/// Decide which shifts a reassignment needs.
///
/// `destination_tail` is the highest priority in the requested lane and is
/// only consulted when the client changes lane.
///
/// # Errors
/// Returns `RankOverflow` if the destination lane has no rank left above
/// its tail to shift into.
pub fn plan(
    current: &Client,
    request: &Reassignment,
    destination_tail: Option<u32>,
) -> Result<ReassignPlan> {
    let old_lane = current.status;
    let old_priority = current.priority;
    let new_lane = request.lane.unwrap_or(old_lane);

    if new_lane == old_lane {
        let Some(new_priority) = request.priority.map(|p| p.get()) else {
            return Ok(ReassignPlan::default());
        };

        let shift = match new_priority.cmp(&old_priority) {
            std::cmp::Ordering::Equal => return Ok(ReassignPlan::default()),
            std::cmp::Ordering::Greater => {
                RankShift::close_range(old_lane, old_priority, new_priority)
            }
            std::cmp::Ordering::Less => RankShift::open_range(old_lane, new_priority, old_priority),
        };

        return Ok(ReassignPlan {
            shifts: vec![shift],
            placement: Some(Placement {
                lane: old_lane,
                priority: new_priority,
            }),
        });
    }

    let tail = destination_tail.unwrap_or(0);
    let above_tail = || tail.checked_add(1).ok_or(CoreError::RankOverflow(new_lane));

    let mut shifts = vec![RankShift::close_tail(old_lane, old_priority)];
    let priority = match request.priority {
        Some(priority) => {
            // The tail row itself moves up one when the insert lands at or below it.
            if priority.get() <= tail {
                above_tail()?;
            }
            shifts.push(RankShift::open_tail(new_lane, priority.get()));
            priority.get()
        }
        None => above_tail()?,
    };

    Ok(ReassignPlan {
        shifts,
        placement: Some(Placement {
            lane: new_lane,
            priority,
        }),
    })
}

/// Move a client and return the full, refreshed client set.
///
/// # Errors
/// Returns `NotFound` if no client has the requested id, `RankOverflow` if
/// the destination lane cannot take another rank, or `Storage` if the store
/// fails. Nothing is written unless the plan succeeds.
pub fn reassign<S: LaneStore + ?Sized>(store: &mut S, request: &Reassignment) -> Result<Vec<Client>> {
    let current = store
        .get_by_id(request.id)?
        .ok_or(CoreError::NotFound(request.id))?;

    let destination_tail = match request.lane {
        Some(lane) if lane != current.status => store.max_priority(lane)?,
        _ => None,
    };

    let plan = plan(&current, request, destination_tail)?;
    let Some(placement) = plan.placement else {
        debug!(id = request.id, "Reassignment is a no-op");
        return store.get_all();
    };

    for shift in &plan.shifts {
        debug!(
            lane = %shift.lane,
            direction = ?shift.direction,
            low = shift.low,
            high = ?shift.high,
            "Applying rank shift"
        );
        store.apply_shift(shift)?;
    }
    store.set_item(request.id, placement.lane, placement.priority)?;

    info!(
        id = request.id,
        from_lane = %current.status,
        from_priority = current.priority,
        to_lane = %placement.lane,
        to_priority = placement.priority,
        "Reassigned client"
    );

    store.get_all()
}
