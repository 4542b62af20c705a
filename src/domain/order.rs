//! Circular slot order and z-rank derivation
//!
//! The pile owns a fixed set of slots. Their order is a permutation that only
//! ever rotates by one step, and the stacking rank of every slot is derived
//! from its position in that permutation. Nothing here reads rendered state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::PileError;

/// Stable identity of one visual position in the pile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

/// Direction of a tilt and of the rotation it finalizes
///
/// `Forward` is the tilt sent to the top card (it leaves to the left and
/// returns at the back). `Backward` is sent to the bottom card, which comes
/// back at the front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "left" => Ok(Direction::Forward),
            "backward" | "right" => Ok(Direction::Backward),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

/// Stacking priority of a slot; larger is nearer the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZRank(usize);

impl ZRank {
    pub fn value(self) -> usize {
        self.0
    }
}

impl fmt::Display for ZRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "z{}", self.0)
    }
}

/// Z-ranks of every slot, indexed by slot identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZRanks {
    ranks: Vec<ZRank>,
}

impl ZRanks {
    /// Rank of `slot`, or None if the slot is not part of this pile
    pub fn get(&self, slot: SlotId) -> Option<ZRank> {
        self.ranks.get(slot.index()).copied()
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Iterates `(slot, rank)` in slot order
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, ZRank)> + '_ {
        self.ranks
            .iter()
            .enumerate()
            .map(|(index, rank)| (SlotId::new(index), *rank))
    }
}

/// Permutation of slots, front (highest z) first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PileOrder {
    slots: Vec<SlotId>,
}

impl PileOrder {
    /// Creates the identity order `[slot-0, slot-1, ..]`
    pub fn new(capacity: usize) -> Result<Self, PileError> {
        if capacity == 0 {
            return Err(PileError::EmptyPile);
        }
        Ok(Self {
            slots: (0..capacity).map(SlotId::new).collect(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slots from front to back
    pub fn slots(&self) -> &[SlotId] {
        &self.slots
    }

    pub fn slot_at(&self, position: usize) -> Option<SlotId> {
        self.slots.get(position).copied()
    }

    pub fn position_of(&self, slot: SlotId) -> Option<usize> {
        self.slots.iter().position(|s| *s == slot)
    }

    /// Slot with the highest z-rank
    pub fn top_slot(&self) -> SlotId {
        self.slots[0]
    }

    /// Slot with the lowest z-rank
    pub fn bottom_slot(&self) -> SlotId {
        self.slots[self.slots.len() - 1]
    }

    /// The card a tilt in `direction` is sent to
    pub fn extreme_for(&self, direction: Direction) -> SlotId {
        match direction {
            Direction::Forward => self.top_slot(),
            Direction::Backward => self.bottom_slot(),
        }
    }

    /// Finalizes one rotation step in place
    pub fn rotate(&mut self, direction: Direction) {
        match direction {
            Direction::Forward => self.slots.rotate_left(1),
            Direction::Backward => self.slots.rotate_right(1),
        }
        debug_assert!(self.is_permutation());
    }

    /// Returns the order one rotation step later, leaving `self` untouched
    pub fn rotated(&self, direction: Direction) -> Self {
        let mut next = self.clone();
        next.rotate(direction);
        next
    }

    /// Z-rank of `slot`: `N - position`
    pub fn z_rank_of(&self, slot: SlotId) -> Option<ZRank> {
        self.position_of(slot)
            .map(|position| ZRank(self.capacity() - position))
    }

    /// Ranks for every slot, front = N down to back = 1
    pub fn z_ranks(&self) -> ZRanks {
        let capacity = self.capacity();
        let mut ranks = vec![ZRank(0); capacity];
        for (position, slot) in self.slots.iter().enumerate() {
            ranks[slot.index()] = ZRank(capacity - position);
        }
        ZRanks { ranks }
    }

    /// True when every slot `0..N` appears exactly once
    pub fn is_permutation(&self) -> bool {
        let mut seen = vec![false; self.slots.len()];
        for slot in &self.slots {
            match seen.get_mut(slot.index()) {
                Some(flag) if !*flag => *flag = true,
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn slots(ids: &[usize]) -> Vec<SlotId> {
        ids.iter().copied().map(SlotId::new).collect()
    }

    #[test]
    fn identity_order_on_creation() {
        let order = PileOrder::new(3).unwrap();
        assert_eq!(order.slots(), slots(&[0, 1, 2]).as_slice());
        assert_eq!(order.top_slot(), SlotId::new(0));
        assert_eq!(order.bottom_slot(), SlotId::new(2));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(PileOrder::new(0), Err(PileError::EmptyPile));
    }

    #[test]
    fn forward_moves_front_to_back() {
        let mut order = PileOrder::new(3).unwrap();
        order.rotate(Direction::Forward);
        assert_eq!(order.slots(), slots(&[1, 2, 0]).as_slice());
    }

    #[test]
    fn backward_moves_back_to_front() {
        let mut order = PileOrder::new(3).unwrap();
        order.rotate(Direction::Backward);
        assert_eq!(order.slots(), slots(&[2, 0, 1]).as_slice());
    }

    #[test]
    fn z_ranks_follow_position() {
        let mut order = PileOrder::new(3).unwrap();
        order.rotate(Direction::Forward);
        let ranks = order.z_ranks();
        assert_eq!(ranks.get(SlotId::new(1)).map(ZRank::value), Some(3));
        assert_eq!(ranks.get(SlotId::new(2)).map(ZRank::value), Some(2));
        assert_eq!(ranks.get(SlotId::new(0)).map(ZRank::value), Some(1));
        assert_eq!(order.z_rank_of(SlotId::new(1)), ranks.get(SlotId::new(1)));
    }

    #[test]
    fn extreme_slot_per_direction() {
        let order = PileOrder::new(4).unwrap();
        assert_eq!(order.extreme_for(Direction::Forward), SlotId::new(0));
        assert_eq!(order.extreme_for(Direction::Backward), SlotId::new(3));
    }

    #[test]
    fn rotated_leaves_original_untouched() {
        let order = PileOrder::new(3).unwrap();
        let next = order.rotated(Direction::Forward);
        assert_eq!(order.top_slot(), SlotId::new(0));
        assert_eq!(next.top_slot(), SlotId::new(1));
    }

    #[test]
    fn random_rotations_keep_permutation_and_distinct_ranks() {
        let mut rng = StdRng::seed_from_u64(7);
        for capacity in 1..=6 {
            let mut order = PileOrder::new(capacity).unwrap();
            for _ in 0..200 {
                let direction = if rng.gen_bool(0.5) {
                    Direction::Forward
                } else {
                    Direction::Backward
                };
                order.rotate(direction);
                assert!(order.is_permutation());

                let mut values: Vec<usize> =
                    order.z_ranks().iter().map(|(_, r)| r.value()).collect();
                values.sort_unstable();
                assert_eq!(values, (1..=capacity).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn rotation_round_trip_restores_order() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut order = PileOrder::new(5).unwrap();
        for _ in 0..50 {
            let direction = if rng.gen_bool(0.5) {
                Direction::Forward
            } else {
                Direction::Backward
            };
            let before = order.clone();
            order.rotate(direction);
            order.rotate(direction.reversed());
            assert_eq!(order, before);
            order.rotate(direction);
        }
    }

    #[test]
    fn direction_parses_original_names() {
        assert_eq!("left".parse::<Direction>(), Ok(Direction::Forward));
        assert_eq!("Right".parse::<Direction>(), Ok(Direction::Backward));
        assert!("up".parse::<Direction>().is_err());
    }
}
