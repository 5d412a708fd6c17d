//! Dense-ranking checks over a set of clients.

use crate::client::Client;
use crate::lane::Lane;
use serde::Serialize;
use std::collections::BTreeMap;

/// A lane whose priorities are not exactly `1..=n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaneGap {
    /// The offending lane.
    pub lane: Lane,
    /// Priorities found in the lane, sorted ascending.
    pub priorities: Vec<u32>,
}

impl LaneGap {
    /// Ranks in `1..=n` that no client holds.
    #[must_use]
    pub fn missing(&self) -> Vec<u32> {
        (1..=self.len())
            .filter(|rank| self.priorities.binary_search(rank).is_err())
            .collect()
    }

    /// Ranks held by more than one client.
    #[must_use]
    pub fn duplicates(&self) -> Vec<u32> {
        let mut dups: Vec<u32> = self
            .priorities
            .windows(2)
            .filter(|w| w[0] == w[1])
            .map(|w| w[0])
            .collect();
        dups.dedup();
        dups
    }

    fn len(&self) -> u32 {
        u32::try_from(self.priorities.len()).unwrap_or(u32::MAX)
    }
}

/// Report every lane whose priorities are not a contiguous run starting at 1.
#[must_use]
pub fn density_violations(clients: &[Client]) -> Vec<LaneGap> {
    let mut by_lane: BTreeMap<Lane, Vec<u32>> = BTreeMap::new();
    for client in clients {
        by_lane.entry(client.status).or_default().push(client.priority);
    }

    by_lane
        .into_iter()
        .filter_map(|(lane, mut priorities)| {
            priorities.sort_unstable();
            let dense = priorities
                .iter()
                .zip(1u32..)
                .all(|(priority, rank)| *priority == rank);
            (!dense).then_some(LaneGap { lane, priorities })
        })
        .collect()
}
