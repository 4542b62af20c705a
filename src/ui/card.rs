//! Card collaborator interface
//!
//! A card owns its own tilt animation. The pile only commands it and later
//! hears back through `PileController::on_tilt_finished`.

use tracing::debug;

use crate::domain::order::{Direction, SlotId, ZRank};

/// A visual card the pile can command
pub trait Card {
    type Record;

    /// Starts the exit/return animation. Fire-and-forget.
    fn tilt(&mut self, direction: Direction);

    /// Shows `record` (index `index` in the source)
    fn bind(&mut self, index: usize, record: &Self::Record);

    /// Applies a new stacking rank
    fn set_z_rank(&mut self, rank: ZRank);
}

/// Calls a `RecordingCard` received, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardCall {
    Tilt(Direction),
    Bind(usize),
    ZRank(ZRank),
}

/// Card that remembers what it was told and logs it
///
/// Used by the demo driver and by tests as a stand-in for a real widget.
#[derive(Debug, Clone)]
pub struct RecordingCard<R> {
    slot: SlotId,
    record: Option<R>,
    record_index: Option<usize>,
    z_rank: Option<ZRank>,
    calls: Vec<CardCall>,
}

impl<R> RecordingCard<R> {
    pub fn new(slot: SlotId) -> Self {
        Self {
            slot,
            record: None,
            record_index: None,
            z_rank: None,
            calls: Vec::new(),
        }
    }

    /// One card per slot, `slot-0` first
    pub fn pile(capacity: usize) -> Vec<Self> {
        (0..capacity).map(|i| Self::new(SlotId::new(i))).collect()
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn record(&self) -> Option<&R> {
        self.record.as_ref()
    }

    pub fn record_index(&self) -> Option<usize> {
        self.record_index
    }

    pub fn z_rank(&self) -> Option<ZRank> {
        self.z_rank
    }

    pub fn calls(&self) -> &[CardCall] {
        &self.calls
    }

    /// Tilts received so far
    pub fn tilts(&self) -> Vec<Direction> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                CardCall::Tilt(direction) => Some(*direction),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl<R: Clone> Card for RecordingCard<R> {
    type Record = R;

    fn tilt(&mut self, direction: Direction) {
        debug!(slot = %self.slot, %direction, "card tilt");
        self.calls.push(CardCall::Tilt(direction));
    }

    fn bind(&mut self, index: usize, record: &R) {
        debug!(slot = %self.slot, index, "card bind");
        self.record = Some(record.clone());
        self.record_index = Some(index);
        self.calls.push(CardCall::Bind(index));
    }

    fn set_z_rank(&mut self, rank: ZRank) {
        self.z_rank = Some(rank);
        self.calls.push(CardCall::ZRank(rank));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_card_tracks_calls() {
        let mut card: RecordingCard<&str> = RecordingCard::new(SlotId::new(1));
        card.bind(4, &"four");
        card.tilt(Direction::Forward);

        assert_eq!(card.slot(), SlotId::new(1));
        assert_eq!(card.record(), Some(&"four"));
        assert_eq!(card.record_index(), Some(4));
        assert_eq!(card.tilts(), vec![Direction::Forward]);
        assert_eq!(card.calls().len(), 2);

        card.clear_calls();
        assert!(card.calls().is_empty());
        assert_eq!(card.record_index(), Some(4));
    }

    #[test]
    fn pile_builds_one_card_per_slot() {
        let cards: Vec<RecordingCard<u32>> = RecordingCard::pile(3);
        let slots: Vec<SlotId> = cards.iter().map(RecordingCard::slot).collect();
        assert_eq!(slots, vec![SlotId::new(0), SlotId::new(1), SlotId::new(2)]);
    }
}
