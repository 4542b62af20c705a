//! Core geometry shared by the pile layout and activation zones
//!
//! Everything here is in logical pixels relative to the pile container.
//! Nothing in this module knows about slots, records or cards.

/// Rectangle in container pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    /// Creates a new rectangle
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Returns the right edge coordinate
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Returns the bottom edge coordinate
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Returns true if this rectangle contains the given point
    pub fn contains_point(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Returns the same rectangle moved by `(dx, dy)`
    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// Returns the bounding box that contains both rectangles
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());

        Rect::new(left, top, right - left, bottom - top)
    }

    /// True when the rectangle has no drawable area
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }
}
