use std::collections::HashMap;
use std::path::Path;

use bevy::math::Vec2;

use crate::audio::SfxDefinition;

/// Progression and movement tuning. Speeds are per 60 Hz frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Clearing this level ends the session.
    pub max_level: u32,
    /// Spawn used when a level asset carries none.
    pub start_position: [f32; 2],
    /// Falling below this height counts as a death.
    pub fall_threshold: f32,
    pub gravity: f32,
    pub move_speed: f32,
    pub jump_speed: f32,
    pub jump_probe_distance: f32,
    pub bounce_speed: f32,
    pub teleport_distance: f32,
    pub player_size: [f32; 2],
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_level: 3,
            start_position: [128.0, 286.0],
            fall_threshold: 1.0,
            gravity: 1.2,
            move_speed: 10.0,
            jump_speed: 20.0,
            jump_probe_distance: 10.0,
            bounce_speed: 30.0,
            teleport_distance: 200.0,
            player_size: [48.0, 64.0],
        }
    }
}

impl GameConfig {
    pub fn start_position(&self) -> Vec2 {
        Vec2::from(self.start_position)
    }

    pub fn player_size(&self) -> Vec2 {
        Vec2::from(self.player_size)
    }
}

#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct StartupConfig {
    pub window_title: Option<String>,
    pub window_width: Option<f32>,
    pub window_height: Option<f32>,
    pub background_color: Option<[f32; 3]>,
    pub levels_dir: Option<String>,
    #[serde(default)]
    pub game: GameConfig,
    /// Named sound effects, e.g. `"jump": {"path": "audio/jump.ogg"}`.
    #[serde(default)]
    pub sfx: HashMap<String, SfxDefinition>,
}

impl StartupConfig {
    /// Levels directory; env var wins over `game.json`.
    pub fn levels_dir(&self) -> String {
        std::env::var("TIMESWAP_LEVELS_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.levels_dir.clone())
            .unwrap_or_else(|| "levels".to_string())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(max) = std::env::var("TIMESWAP_MAX_LEVEL")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
        {
            self.game.max_level = max;
        }
    }
}

pub fn load_startup_config() -> StartupConfig {
    let path = std::env::var("TIMESWAP_GAME_CONFIG")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "game.json".to_string());
    let mut cfg = load_startup_config_from(Path::new(&path));
    cfg.apply_env_overrides();
    cfg
}

/// Missing file means defaults; a malformed file is reported and ignored.
pub fn load_startup_config_from(path: &Path) -> StartupConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<StartupConfig>(&contents) {
            Ok(cfg) => {
                println!("[Timeswap] Loaded startup config from {}", path.display());
                cfg
            }
            Err(e) => {
                eprintln!("[Timeswap] Failed to parse {}: {}", path.display(), e);
                StartupConfig::default()
            }
        },
        Err(_) => StartupConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("game.json");
        std::fs::write(
            &path,
            r#"{
                "window_title": "Swap",
                "game": {"max_level": 5, "teleport_distance": 150},
                "sfx": {"jump": {"path": "audio/jump.ogg"}}
            }"#,
        )
        .expect("write config");

        let cfg = load_startup_config_from(&path);
        assert_eq!(cfg.window_title.as_deref(), Some("Swap"));
        assert_eq!(cfg.game.max_level, 5);
        assert_eq!(cfg.game.teleport_distance, 150.0);
        assert_eq!(cfg.game.start_position(), Vec2::new(128.0, 286.0));
        assert_eq!(cfg.game.gravity, 1.2);
        assert_eq!(cfg.sfx["jump"].path, "audio/jump.ogg");
        assert_eq!(cfg.sfx["jump"].volume, 1.0);
    }

    #[test]
    fn missing_or_malformed_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = load_startup_config_from(&dir.path().join("nope.json"));
        assert_eq!(missing.game, GameConfig::default());

        let path = dir.path().join("game.json");
        std::fs::write(&path, "{ broken").expect("write config");
        let malformed = load_startup_config_from(&path);
        assert!(malformed.window_title.is_none());
        assert_eq!(malformed.game.max_level, 3);
    }
}
