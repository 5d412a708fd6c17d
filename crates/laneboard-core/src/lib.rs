//! laneboard-core: Lane model and priority reassignment engine.
//!
//! This crate provides:
//! - `Lane`: The closed set of workflow stages a client can occupy
//! - `Client`: A client record with its lane and 1-based priority
//! - `LaneStore`: The storage interface the engine is written against
//! - `reassign`: Moves a client within or across lanes, keeping every lane densely ranked

pub mod client;
pub mod engine;
pub mod error;
pub mod lane;
pub mod ranking;
pub mod shift;

pub use client::{Client, ClientId, Priority, Reassignment};
pub use engine::{plan, reassign, LaneStore, Placement, ReassignPlan};
pub use error::{CoreError, Result};
pub use lane::Lane;
pub use ranking::{density_violations, LaneGap};
pub use shift::{RankShift, ShiftDirection};
