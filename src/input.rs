use bevy::prelude::*;
use std::collections::HashSet;

use crate::session::MovementIntent;

/// Abstraction layer between raw input and game systems.
/// Both keyboard (windowed) and scripted runs (headless) write to this.
#[derive(Resource, Default, Clone)]
pub struct VirtualInput {
    pub active: HashSet<String>,
    pub just_pressed: HashSet<String>,
    pub just_released: HashSet<String>,
}

impl VirtualInput {
    pub fn pressed(&self, action: &str) -> bool {
        self.active.contains(action)
    }

    pub fn just_pressed(&self, action: &str) -> bool {
        self.just_pressed.contains(action)
    }

    /// Hold an action down, registering the press edge if it is new.
    #[cfg(test)]
    pub fn press(&mut self, action: &str) {
        if self.active.insert(action.to_string()) {
            self.just_pressed.insert(action.to_string());
        }
    }

    pub fn clear_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }

    pub fn movement_intent(&self) -> MovementIntent {
        MovementIntent {
            left: self.pressed("left"),
            right: self.pressed("right"),
            up: self.pressed("up"),
            down: self.pressed("down"),
        }
    }
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(VirtualInput::default())
            .add_systems(
                PreUpdate,
                keyboard_to_virtual.run_if(resource_exists::<ButtonInput<KeyCode>>),
            )
            .add_systems(Last, clear_virtual_input);
    }
}

const BINDINGS: &[(&str, &[KeyCode])] = &[
    ("left", &[KeyCode::KeyA, KeyCode::ArrowLeft]),
    ("right", &[KeyCode::KeyD, KeyCode::ArrowRight]),
    ("up", &[KeyCode::Space, KeyCode::KeyW, KeyCode::ArrowUp]),
    ("down", &[KeyCode::KeyS, KeyCode::ArrowDown]),
    ("swap", &[KeyCode::KeyQ, KeyCode::KeyZ]),
    ("restart", &[KeyCode::KeyR]),
    ("teleport", &[KeyCode::KeyE]),
];

/// Translate keyboard input to VirtualInput action names
fn keyboard_to_virtual(keyboard: Res<ButtonInput<KeyCode>>, mut vinput: ResMut<VirtualInput>) {
    vinput.active.clear();
    vinput.just_pressed.clear();
    vinput.just_released.clear();

    for (action, keys) in BINDINGS {
        if keyboard.any_pressed(keys.iter().copied()) {
            vinput.active.insert((*action).into());
        }
        if keyboard.any_just_pressed(keys.iter().copied()) {
            vinput.just_pressed.insert((*action).into());
        }
        if keyboard.any_just_released(keys.iter().copied()) {
            vinput.just_released.insert((*action).into());
        }
    }
}

fn clear_virtual_input(mut vinput: ResMut<VirtualInput>) {
    vinput.clear_frame();
}
