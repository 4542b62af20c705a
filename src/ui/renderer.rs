//! Pile rendering using tiny-skia
//!
//! Paints a [`PileLayout`] back to front so the highest z-rank ends up on
//! top. Each slot gets an accent color so rotations are visible in output.

use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Rect as SkiaRect, Stroke, Transform};

use crate::domain::order::SlotId;
use crate::ui::layout::{CardPlacement, PileLayout};

/// Rendering errors
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Failed to create pixmap for rendering")]
    PixmapCreationFailed,

    #[error("Invalid card geometry for {slot}: {width}x{height}")]
    InvalidCardGeometry { slot: SlotId, width: i32, height: i32 },
}

const DEFAULT_PALETTE: [[u8; 3]; 6] = [
    [231, 76, 60],
    [52, 152, 219],
    [46, 204, 113],
    [241, 196, 15],
    [155, 89, 182],
    [230, 126, 34],
];

/// Renders pile layouts into pixmaps
#[derive(Debug, Clone)]
pub struct PileRenderer {
    palette: Vec<[u8; 3]>,
    outline_width: f32,
}

impl PileRenderer {
    pub fn new() -> Self {
        Self {
            palette: DEFAULT_PALETTE.to_vec(),
            outline_width: 2.0,
        }
    }

    /// Accent color for a slot as opaque RGB
    pub fn accent_for(&self, slot: SlotId) -> [u8; 3] {
        self.palette[slot.index() % self.palette.len()]
    }

    /// Render a pile layout to a pixmap sized to the layout canvas
    pub fn render(&self, layout: &PileLayout) -> Result<Pixmap, RendererError> {
        let canvas = layout.canvas();
        let mut pixmap = Pixmap::new(canvas.w.max(0) as u32, canvas.h.max(0) as u32)
            .ok_or(RendererError::PixmapCreationFailed)?;
        pixmap.fill(Color::TRANSPARENT);

        for placement in layout.paint_order() {
            self.render_card(&mut pixmap, placement, canvas.x, canvas.y)?;
        }

        Ok(pixmap)
    }

    fn render_card(
        &self,
        pixmap: &mut Pixmap,
        placement: &CardPlacement,
        origin_x: i32,
        origin_y: i32,
    ) -> Result<(), RendererError> {
        let rect = placement.rect;
        let invalid = || RendererError::InvalidCardGeometry {
            slot: placement.slot,
            width: rect.w,
            height: rect.h,
        };
        if rect.is_empty() {
            return Err(invalid());
        }
        let card = SkiaRect::from_xywh(
            (rect.x - origin_x) as f32,
            (rect.y - origin_y) as f32,
            rect.w as f32,
            rect.h as f32,
        )
        .ok_or_else(invalid)?;

        let [r, g, b] = self.accent_for(placement.slot);
        let mut fill = Paint::default();
        fill.set_color(Color::from_rgba8(r, g, b, 255));
        pixmap.fill_rect(card, &fill, Transform::identity(), None);

        let outline = PathBuilder::from_rect(card);
        let mut pen = Paint::default();
        pen.set_color(Color::from_rgba8(30, 30, 30, 255));
        let stroke = Stroke {
            width: self.outline_width,
            ..Stroke::default()
        };
        pixmap.stroke_path(&outline, &pen, &stroke, Transform::identity(), None);

        Ok(())
    }

    /// Raw RGBA bytes of a rendered pile
    pub fn pixmap_to_rgba(&self, pixmap: &Pixmap) -> Vec<u8> {
        pixmap.data().to_vec()
    }
}

impl Default for PileRenderer {
    fn default() -> Self {
        Self::new()
    }
}
