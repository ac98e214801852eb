use bevy::prelude::*;

use crate::level::RegionCategory;

/// Marks the player entity
#[derive(Component)]
pub struct Player;

/// Position in world units, mirrored from the session's player body.
#[derive(Component, Clone, Copy, Default, PartialEq, Debug)]
pub struct GamePosition {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for GamePosition {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

/// Sprite drawn for one region of the current world.
#[derive(Component)]
pub struct RegionSprite(pub RegionCategory);

#[derive(Component)]
pub struct HudText;

/// Whether the app runs without a window
#[derive(Resource, Clone, Copy, Default)]
pub struct HeadlessMode(pub bool);
