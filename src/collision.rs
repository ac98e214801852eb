use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

/// Centre-based axis-aligned box in world units (y up).
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::new(center.x, center.y, size.x, size.y)
    }

    /// Box spanning two corners.
    pub fn from_corners(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self::new(
            (min_x + max_x) / 2.0,
            (min_y + max_y) / 2.0,
            max_x - min_x,
            max_y - min_y,
        )
    }

    pub fn min_x(&self) -> f32 {
        self.x - self.w / 2.0
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    pub fn min_y(&self) -> f32 {
        self.y - self.h / 2.0
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.h / 2.0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// Strict overlap: boxes that only share an edge do not collide.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.max_x() > other.min_x()
            && self.min_x() < other.max_x()
            && self.max_y() > other.min_y()
            && self.min_y() < other.max_y()
    }
}
