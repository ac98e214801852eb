use bevy::math::Vec2;
use serde::Serialize;

use crate::ledger::{CollectibleKind, CollectibleLedger};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Spend a potion to jump `distance` units forward. The destination is not
/// checked against any geometry. Returns false (and does nothing) without potions.
pub fn try_teleport(
    ledger: &mut CollectibleLedger,
    position: &mut Vec2,
    facing: Facing,
    distance: f32,
) -> bool {
    if !ledger.consume(CollectibleKind::Potion) {
        return false;
    }
    position.x += facing.sign() * distance;
    true
}
