use std::collections::HashMap;

use bevy::audio::Volume;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::events::{EventCursor, GameEventBus};

const MAX_AUDIO_EVENTS: usize = 256;

fn default_volume() -> f32 {
    1.0
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SfxDefinition {
    pub path: String,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct AudioEventLog {
    pub frame: u64,
    pub name: String,
    pub volume: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_event: Option<String>,
}

/// Sound effects keyed by name, and which notice plays which effect.
#[derive(Resource)]
pub struct AudioManager {
    pub sfx: HashMap<String, SfxDefinition>,
    pub triggers: HashMap<String, String>,
    pub master_volume: f32,
    pub recent_events: Vec<AudioEventLog>,
}

impl Default for AudioManager {
    fn default() -> Self {
        let triggers = [
            ("jumped", "jump"),
            ("collectible_claimed", "pickup"),
            ("teleported", "teleport"),
        ]
        .into_iter()
        .map(|(notice, sfx)| (notice.to_string(), sfx.to_string()))
        .collect();
        Self {
            sfx: HashMap::new(),
            triggers,
            master_volume: 1.0,
            recent_events: Vec::new(),
        }
    }
}

impl AudioManager {
    /// Records the play and returns the asset path with its final volume.
    pub fn play_sfx(
        &mut self,
        name: &str,
        frame: u64,
        source_event: Option<String>,
    ) -> Result<(String, f32), String> {
        let Some(def) = self.sfx.get(name) else {
            return Err(format!("Unknown sfx: {name}"));
        };
        let volume = def.volume * self.master_volume;
        let path = def.path.clone();
        self.push_event(AudioEventLog {
            frame,
            name: name.to_string(),
            volume,
            source_event,
        });
        Ok((path, volume))
    }

    fn push_event(&mut self, event: AudioEventLog) {
        self.recent_events.push(event);
        if self.recent_events.len() > MAX_AUDIO_EVENTS {
            let excess = self.recent_events.len() - MAX_AUDIO_EVENTS;
            self.recent_events.drain(0..excess);
        }
    }
}

#[derive(Resource, Default)]
struct AudioEventCursor(EventCursor);

pub struct AudioPlugin {
    pub sfx: HashMap<String, SfxDefinition>,
}

impl Plugin for AudioPlugin {
    fn build(&self, app: &mut App) {
        let audio = AudioManager {
            sfx: self.sfx.clone(),
            ..AudioManager::default()
        };
        app.insert_resource(audio)
            .insert_resource(AudioEventCursor::default())
            .add_systems(Update, auto_audio_from_events);
    }
}

/// Plays the mapped effect for every new notice. Without an asset server
/// (headless) the play is only logged.
fn auto_audio_from_events(
    mut commands: Commands,
    mut audio: ResMut<AudioManager>,
    bus: Res<GameEventBus>,
    mut cursor: ResMut<AudioEventCursor>,
    asset_server: Option<Res<AssetServer>>,
) {
    for ev in cursor.0.read(&bus) {
        let trigger = ev.notice.name();
        let Some(mapped) = audio.triggers.get(trigger).cloned() else {
            continue;
        };
        match audio.play_sfx(&mapped, ev.frame, Some(trigger.to_string())) {
            Ok((path, volume)) => {
                if let Some(server) = asset_server.as_ref() {
                    commands.spawn((
                        AudioPlayer::<AudioSource>::new(server.load(path)),
                        PlaybackSettings::DESPAWN.with_volume(Volume::new(volume)),
                    ));
                }
            }
            Err(e) => debug!("[Timeswap audio] {e}"),
        }
    }
}
