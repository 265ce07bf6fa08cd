//! Frontier state for flood discovery.
//!
//! Every admitted position has exactly one [`TileState`]. Positions move
//! `Pending → InProgress → Complete` and are never admitted twice, which
//! together with the search radius bounds the run.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};

use crate::coord::{DiscoveryKernel, TilePosition};

/// Lifecycle state of an admitted position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileState {
    /// Admitted, not yet dispatched.
    Pending,
    /// Dispatched, awaiting its fetch outcome.
    InProgress,
    /// Settled, regardless of outcome.
    Complete,
}

/// Position counts per state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub complete: usize,
}

impl FrontierCounts {
    /// Total admitted positions.
    pub fn admitted(&self) -> usize {
        self.pending + self.in_progress + self.complete
    }
}

/// Pending, in-progress and complete positions of one discovery run.
#[derive(Debug, Default)]
pub struct Frontier {
    states: HashMap<TilePosition, TileState>,
    pending: VecDeque<TilePosition>,
    in_progress: usize,
}

impl Frontier {
    /// Creates a frontier holding only `seed` as pending.
    pub fn seeded(seed: TilePosition) -> Self {
        let mut frontier = Self::default();
        frontier.admit(seed);
        frontier
    }

    /// Admits a position as pending. Returns false if it was already known.
    pub fn admit(&mut self, position: TilePosition) -> bool {
        match self.states.entry(position) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(TileState::Pending);
                self.pending.push_back(position);
                true
            }
        }
    }

    /// Admits every kernel neighbor of `center` lying within `search_radius`
    /// of `seed`. Returns the number of newly admitted positions.
    pub fn admit_neighbors(
        &mut self,
        center: TilePosition,
        kernel: &DiscoveryKernel,
        seed: TilePosition,
        search_radius: f64,
    ) -> usize {
        kernel
            .iter()
            .map(|offset| center.translate(*offset))
            .filter(|candidate| candidate.distance(&seed) <= search_radius)
            .filter(|candidate| self.admit(*candidate))
            .count()
    }

    /// Moves one pending position to in-progress.
    pub fn take_pending(&mut self) -> Option<TilePosition> {
        let position = self.pending.pop_front()?;
        self.states.insert(position, TileState::InProgress);
        self.in_progress += 1;
        Some(position)
    }

    /// Marks an in-progress position complete.
    ///
    /// Returns false (and changes nothing) if it was not in progress.
    pub fn complete(&mut self, position: TilePosition) -> bool {
        match self.states.get_mut(&position) {
            Some(state) if *state == TileState::InProgress => {
                *state = TileState::Complete;
                self.in_progress -= 1;
                true
            }
            _ => false,
        }
    }

    /// State of a position, if admitted.
    pub fn state(&self, position: &TilePosition) -> Option<TileState> {
        self.states.get(position).copied()
    }

    /// True when nothing is pending or in progress.
    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty() && self.in_progress == 0
    }

    /// Position counts per state.
    pub fn counts(&self) -> FrontierCounts {
        FrontierCounts {
            pending: self.pending.len(),
            in_progress: self.in_progress,
            complete: self.states.len() - self.pending.len() - self.in_progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i64, y: i64) -> TilePosition {
        TilePosition::wrap(x, y)
    }

    #[test]
    fn test_seeded() {
        let frontier = Frontier::seeded(p(5, 5));
        assert_eq!(frontier.state(&p(5, 5)), Some(TileState::Pending));
        assert_eq!(frontier.counts().pending, 1);
        assert!(!frontier.is_exhausted());
    }

    #[test]
    fn test_lifecycle() {
        let mut frontier = Frontier::seeded(p(5, 5));

        assert_eq!(frontier.take_pending(), Some(p(5, 5)));
        assert_eq!(frontier.state(&p(5, 5)), Some(TileState::InProgress));
        assert_eq!(frontier.take_pending(), None);
        assert!(!frontier.is_exhausted());

        assert!(frontier.complete(p(5, 5)));
        assert_eq!(frontier.state(&p(5, 5)), Some(TileState::Complete));
        assert!(frontier.is_exhausted());
        assert_eq!(
            frontier.counts(),
            FrontierCounts {
                pending: 0,
                in_progress: 0,
                complete: 1
            }
        );
    }

    #[test]
    fn test_never_admits_twice() {
        let mut frontier = Frontier::seeded(p(1, 1));
        assert!(!frontier.admit(p(1, 1)));

        frontier.take_pending();
        assert!(!frontier.admit(p(1, 1)));

        frontier.complete(p(1, 1));
        assert!(!frontier.admit(p(1, 1)));
        assert_eq!(frontier.counts().admitted(), 1);
    }

    #[test]
    fn test_complete_requires_in_progress() {
        let mut frontier = Frontier::seeded(p(1, 1));
        assert!(!frontier.complete(p(1, 1)));
        assert!(!frontier.complete(p(9, 9)));
        assert_eq!(frontier.state(&p(1, 1)), Some(TileState::Pending));
    }

    #[test]
    fn test_admit_neighbors_around_seed() {
        let seed = p(100, 100);
        let kernel = DiscoveryKernel::new(1.5);
        let mut frontier = Frontier::seeded(seed);
        frontier.take_pending();
        frontier.complete(seed);

        assert_eq!(frontier.admit_neighbors(seed, &kernel, seed, 10.0), 8);
        // Repeating admits nothing new.
        assert_eq!(frontier.admit_neighbors(seed, &kernel, seed, 10.0), 0);
        assert_eq!(frontier.counts().pending, 8);
    }

    #[test]
    fn test_admit_neighbors_respects_search_radius() {
        let seed = p(100, 100);
        let kernel = DiscoveryKernel::new(1.5);
        let mut frontier = Frontier::default();

        // Only the 4 orthogonal neighbors are within 1.0 of the seed.
        assert_eq!(frontier.admit_neighbors(seed, &kernel, seed, 1.0), 4);

        // Around (101,100) with radius 1.0: (100,100) and the neighbors of the
        // seed already admitted; nothing farther qualifies.
        assert_eq!(frontier.admit_neighbors(p(101, 100), &kernel, seed, 1.0), 1);
        assert_eq!(frontier.state(&seed), Some(TileState::Pending));
    }

    #[test]
    fn test_states_are_disjoint_under_churn() {
        let seed = p(50, 50);
        let kernel = DiscoveryKernel::new(1.5);
        let mut frontier = Frontier::seeded(seed);

        while let Some(position) = frontier.take_pending() {
            frontier.complete(position);
            frontier.admit_neighbors(position, &kernel, seed, 3.0);

            let counts = frontier.counts();
            assert_eq!(counts.admitted(), frontier.states.len());
        }
        assert!(frontier.is_exhausted());
        // Every integer point within distance 3 of the seed: 29 points.
        assert_eq!(frontier.counts().complete, 29);
    }
}
