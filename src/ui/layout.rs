//! Pile layout: where each card sits and in which order it is painted
//!
//! Layout is derived purely from applied z-ranks. Deeper cards are nudged
//! right and down by a fixed fraction of the card size so the pile reads as a
//! stack.

use crate::app::controller::PileController;
use crate::config::PileConfig;
use crate::domain::core::Rect;
use crate::domain::order::{SlotId, ZRank, ZRanks};
use crate::domain::window::DataSource;
use crate::ui::card::Card;

/// Card size and per-depth offsets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub card_width: u32,
    pub card_height: u32,
    /// Horizontal offset per depth step, percent of card width
    pub step_x_pct: f32,
    /// Vertical offset per depth step, percent of card height
    pub step_y_pct: f32,
}

impl LayoutMetrics {
    pub fn from_config(config: &PileConfig) -> Self {
        Self {
            card_width: config.card_width,
            card_height: config.card_height,
            ..Self::default()
        }
    }

    fn offset_for_depth(&self, depth: usize) -> (i32, i32) {
        let depth = depth as f32;
        let dx = depth * self.card_width as f32 * self.step_x_pct / 100.0;
        let dy = depth * self.card_height as f32 * self.step_y_pct / 100.0;
        (dx.round() as i32, dy.round() as i32)
    }
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            card_width: 220,
            card_height: 240,
            step_x_pct: 4.0,
            step_y_pct: 2.0,
        }
    }
}

/// One card's position in the pile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardPlacement {
    pub slot: SlotId,
    pub z_rank: ZRank,
    /// 0 for the front card
    pub depth: usize,
    pub rect: Rect,
}

/// Pre-calculated pile layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PileLayout {
    /// Placements in slot order
    placements: Vec<CardPlacement>,
    canvas: Rect,
}

impl PileLayout {
    pub fn from_ranks(ranks: &ZRanks, metrics: &LayoutMetrics) -> Self {
        let capacity = ranks.len();
        let card = Rect::new(0, 0, metrics.card_width as i32, metrics.card_height as i32);

        let placements: Vec<CardPlacement> = ranks
            .iter()
            .map(|(slot, z_rank)| {
                let depth = capacity.saturating_sub(z_rank.value());
                let (dx, dy) = metrics.offset_for_depth(depth);
                CardPlacement {
                    slot,
                    z_rank,
                    depth,
                    rect: card.translated(dx, dy),
                }
            })
            .collect();

        let canvas = placements
            .iter()
            .fold(card, |bounds, placement| bounds.union(&placement.rect));

        Self { placements, canvas }
    }

    /// Layout for the ranks a controller has applied
    pub fn from_controller<S, C>(controller: &PileController<S, C>, metrics: &LayoutMetrics) -> Self
    where
        S: DataSource,
        C: Card<Record = S::Record>,
    {
        Self::from_ranks(controller.applied_ranks(), metrics)
    }

    pub fn placements(&self) -> &[CardPlacement] {
        &self.placements
    }

    pub fn placement_for(&self, slot: SlotId) -> Option<&CardPlacement> {
        self.placements.get(slot.index())
    }

    /// Bounding box of the whole pile
    pub fn canvas(&self) -> Rect {
        self.canvas
    }

    /// Placements back to front
    pub fn paint_order(&self) -> Vec<&CardPlacement> {
        let mut ordered: Vec<&CardPlacement> = self.placements.iter().collect();
        ordered.sort_by_key(|placement| placement.z_rank);
        ordered
    }

    pub fn front(&self) -> Option<&CardPlacement> {
        self.placements.iter().max_by_key(|placement| placement.z_rank)
    }
}
