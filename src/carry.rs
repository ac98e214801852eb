use bevy::math::Vec2;
use serde::Serialize;

/// Position restored when a world is entered after a timeline swap.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize)]
pub struct PlayerCarryState {
    pub x: f32,
    pub y: f32,
    pub has_carry: bool,
}

impl PlayerCarryState {
    pub fn save(&mut self, position: Vec2) {
        self.x = position.x;
        self.y = position.y;
        self.has_carry = true;
    }

    pub fn discard(&mut self) {
        *self = Self::default();
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Where the player appears when the world is (re)entered.
#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SpawnPolicy {
    FixedStart,
    Carried { x: f32, y: f32 },
}

impl SpawnPolicy {
    /// Fixed start while no swap happened since the level (re)started,
    /// carried position otherwise.
    pub fn for_entry(timeline_changes: u32, carry: &PlayerCarryState) -> Self {
        if timeline_changes == 0 || !carry.has_carry {
            SpawnPolicy::FixedStart
        } else {
            SpawnPolicy::Carried {
                x: carry.x,
                y: carry.y,
            }
        }
    }

    pub fn resolve(self, level_start: Vec2) -> Vec2 {
        match self {
            SpawnPolicy::FixedStart => level_start,
            SpawnPolicy::Carried { x, y } => Vec2::new(x, y),
        }
    }
}
