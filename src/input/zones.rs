//! Click zones beside the pile
//!
//! The pile sits between two activation strips. The left strip sends the top
//! card away (forward), the right strip brings the bottom card to the front
//! (backward). Zones are plain rectangles so hit-testing needs no platform.

use crate::domain::core::Rect;

/// Commands the pile accepts from user interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PileCommand {
    RotateForward,
    RotateBackward,
    AdvancePage,
    RetreatPage,
}

impl PileCommand {
    /// Keyboard shortcut for a command, if any
    ///
    /// Arrow keys are passed as their names ("ArrowLeft", "ArrowRight").
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "a" | "A" => Some(PileCommand::RotateForward),
            "ArrowRight" | "d" | "D" => Some(PileCommand::RotateBackward),
            "PageDown" => Some(PileCommand::AdvancePage),
            "PageUp" => Some(PileCommand::RetreatPage),
            _ => None,
        }
    }
}

/// The two activation strips of a pile container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationZones {
    forward: Rect,
    backward: Rect,
}

impl ActivationZones {
    /// Builds zones covering `fraction` of the container width on each side
    ///
    /// `fraction` is clamped to `0.0..=0.5` so the zones never overlap.
    pub fn from_container(container: Rect, fraction: f32) -> Self {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 0.5)
        } else {
            0.0
        };
        let zone_width = ((container.w.max(0) as f32) * fraction).floor() as i32;

        Self {
            forward: Rect::new(container.x, container.y, zone_width, container.h),
            backward: Rect::new(
                container.right() - zone_width,
                container.y,
                zone_width,
                container.h,
            ),
        }
    }

    pub fn forward_zone(&self) -> Rect {
        self.forward
    }

    pub fn backward_zone(&self) -> Rect {
        self.backward
    }

    /// Command for a click at `(x, y)`, or None outside both zones
    pub fn command_at(&self, x: i32, y: i32) -> Option<PileCommand> {
        if self.forward.contains_point(x, y) {
            Some(PileCommand::RotateForward)
        } else if self.backward.contains_point(x, y) {
            Some(PileCommand::RotateBackward)
        } else {
            None
        }
    }
}
