#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

mod audio;
mod carry;
mod collision;
mod components;
mod config;
mod error;
mod events;
#[cfg(not(target_arch = "wasm32"))]
mod file_watcher;
mod game_runtime;
mod input;
mod ledger;
mod level;
mod lock_gate;
mod physics;
mod player;
mod progression;
mod render;
mod session;
mod telemetry;
mod teleport;
mod transition;
mod world;

use bevy::prelude::*;
use components::HeadlessMode;
use level::{BuiltinLevels, JsonLevelLoader, RegionLoader};
use progression::{ActiveSession, FrameBudget};
use session::Session;

fn parse_frames(args: &[String]) -> Option<u64> {
    args.iter()
        .position(|a| a == "--frames")
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse::<u64>().ok())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let headless = args.iter().any(|a| a == "--headless");
    let frames = parse_frames(&args);

    let startup_config = config::load_startup_config();
    let levels_dir = std::path::PathBuf::from(startup_config.levels_dir());
    let levels_on_disk = levels_dir.is_dir();
    let loader: Box<dyn RegionLoader> = if levels_on_disk {
        println!("[Timeswap] Loading levels from {}", levels_dir.display());
        Box::new(JsonLevelLoader::new(levels_dir.clone()))
    } else {
        println!(
            "[Timeswap] No levels dir at {}, using the built-in pack",
            levels_dir.display()
        );
        Box::new(BuiltinLevels::demo())
    };

    let session = match Session::start(startup_config.game.clone(), loader) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[Timeswap] {e}");
            std::process::exit(2);
        }
    };

    let mut app = App::new();
    app.insert_resource(HeadlessMode(headless));

    if headless {
        // Headless mode: no window, no rendering, just the fixed-step loop
        app.add_plugins(MinimalPlugins);
        app.add_plugins(bevy::state::app::StatesPlugin);
        println!("[Timeswap] Starting in HEADLESS mode");
    } else {
        let window_title = startup_config
            .window_title
            .clone()
            .unwrap_or_else(|| "Timeswap".to_string());
        let window_width = startup_config.window_width.unwrap_or(1000.0);
        let window_height = startup_config.window_height.unwrap_or(650.0);

        app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: window_title,
                resolution: (window_width, window_height).into(),
                present_mode: bevy::window::PresentMode::AutoVsync,
                ..default()
            }),
            ..default()
        }));
        let bg = startup_config
            .background_color
            .unwrap_or([0.47, 0.53, 0.67]);
        app.insert_resource(ClearColor(Color::srgb(bg[0], bg[1], bg[2])));
        app.add_plugins(render::RenderPlugin);
        println!("[Timeswap] Starting in WINDOWED mode");
    }

    if let Some(n) = frames {
        app.insert_resource(FrameBudget { remaining: n.max(1) });
    }

    app.insert_resource(ActiveSession(session))
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .add_plugins(events::GameEventsPlugin)
        .add_plugins(input::InputPlugin)
        .add_plugins(game_runtime::RuntimeStatePlugin)
        .add_plugins(progression::ProgressionPlugin)
        .add_plugins(player::PlayerPlugin)
        .add_plugins(telemetry::TelemetryPlugin)
        .add_plugins(audio::AudioPlugin {
            sfx: startup_config.sfx.clone(),
        });

    #[cfg(not(target_arch = "wasm32"))]
    if levels_on_disk {
        app.add_plugins(file_watcher::FileWatcherPlugin { levels_dir });
    }

    app.run();
}
