use bevy::prelude::*;
use crossbeam_channel::{Receiver, Sender};
use notify::{Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};

use crate::events::GameEventBus;
use crate::progression::{settle, ActiveSession, ProgressionSet};

/// Watches the levels directory and restarts the current world when its file
/// changes on disk.
pub struct FileWatcherPlugin {
    pub levels_dir: PathBuf,
}

#[derive(Debug, PartialEq)]
pub enum FileWatchEvent {
    LevelChanged(PathBuf),
}

#[derive(Resource)]
pub struct FileWatcherReceiver(pub Receiver<FileWatchEvent>);

impl Plugin for FileWatcherPlugin {
    fn build(&self, app: &mut App) {
        let (tx, rx) = crossbeam_channel::unbounded::<FileWatchEvent>();
        app.insert_resource(FileWatcherReceiver(rx));

        let levels_dir = self.levels_dir.clone();
        std::thread::spawn(move || {
            run_watcher(tx, levels_dir);
        });

        app.add_systems(
            Update,
            process_file_watch_events
                .before(ProgressionSet)
                .run_if(crate::game_runtime::gameplay_systems_enabled),
        );
    }
}

fn run_watcher(tx: Sender<FileWatchEvent>, levels_dir: PathBuf) {
    let tx_clone = tx.clone();
    let mut watcher: RecommendedWatcher =
        match notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                handle_fs_event(event, &tx_clone);
            }
        }) {
            Ok(w) => w,
            Err(e) => {
                eprintln!("[Timeswap FileWatcher] Failed to create watcher: {e}");
                return;
            }
        };

    if let Err(e) = watcher.watch(&levels_dir, RecursiveMode::NonRecursive) {
        eprintln!("[Timeswap FileWatcher] Failed to watch levels dir: {e}");
        return;
    }
    println!("[Timeswap FileWatcher] Watching levels: {}", levels_dir.display());

    // Keep thread alive; the watcher is dropped when the thread exits
    loop {
        std::thread::sleep(std::time::Duration::from_secs(60));
    }
}

fn handle_fs_event(event: NotifyEvent, tx: &Sender<FileWatchEvent>) {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return;
    }
    for path in event.paths {
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            let _ = tx.send(FileWatchEvent::LevelChanged(path));
        }
    }
}

fn path_matches(a: &Path, b: &Path) -> bool {
    let ca = std::fs::canonicalize(a).unwrap_or_else(|_| a.to_path_buf());
    let cb = std::fs::canonicalize(b).unwrap_or_else(|_| b.to_path_buf());
    ca == cb
}

fn process_file_watch_events(
    watcher: Option<Res<FileWatcherReceiver>>,
    mut session: ResMut<ActiveSession>,
    mut bus: ResMut<GameEventBus>,
    mut exit: EventWriter<AppExit>,
) {
    let Some(watcher) = watcher else { return };
    let Some(current) = session.0.source_path() else {
        watcher.0.try_iter().for_each(drop);
        return;
    };

    // Editors often emit several events per save; restart at most once.
    let changed = watcher
        .0
        .try_iter()
        .take(64)
        .filter(|FileWatchEvent::LevelChanged(path)| path_matches(path, &current))
        .count();
    if changed > 0 {
        println!("[Timeswap FileWatcher] Reloading {}", current.display());
        let result = session.0.restart();
        settle(result, &mut session.0, &mut bus, &mut exit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::game_runtime::RuntimeState;
    use crate::level::{JsonLevelLoader, RegionCategory};
    use crate::session::Session;

    const ONE_PLATFORM: &str =
        r#"{"regions": [{"type": "platform", "x": 500, "y": 200, "w": 1000, "h": 100}]}"#;
    const WITH_HAZARD: &str = r#"{"regions": [
        {"type": "platform", "x": 500, "y": 200, "w": 1000, "h": 100},
        {"type": "hazard", "x": 900, "y": 260, "w": 40, "h": 20}
    ]}"#;

    #[test]
    fn editing_the_current_level_restarts_it() {
        let dir = tempfile::tempdir().expect("tempdir");
        let level_path = dir.path().join("level_1_1.json");
        std::fs::write(&level_path, ONE_PLATFORM).expect("write level");
        let session = Session::start(
            GameConfig::default(),
            Box::new(JsonLevelLoader::new(dir.path())),
        )
        .expect("level loads");

        let (tx, rx) = crossbeam_channel::unbounded();
        let mut app = App::new();
        app.add_event::<AppExit>()
            .insert_resource(RuntimeState::default())
            .insert_resource(GameEventBus::default())
            .insert_resource(ActiveSession(session))
            .insert_resource(FileWatcherReceiver(rx))
            .add_systems(Update, process_file_watch_events);

        tx.send(FileWatchEvent::LevelChanged(dir.path().join("level_2_1.json")))
            .expect("send");
        app.update();
        assert_eq!(app.world().resource::<ActiveSession>().0.reload_count(), 1);

        std::fs::write(&level_path, WITH_HAZARD).expect("rewrite level");
        tx.send(FileWatchEvent::LevelChanged(level_path.clone()))
            .expect("send");
        tx.send(FileWatchEvent::LevelChanged(level_path))
            .expect("send");
        app.update();

        let session = &app.world().resource::<ActiveSession>().0;
        assert_eq!(session.reload_count(), 2);
        assert_eq!(session.regions().of(RegionCategory::Hazard).count(), 1);
    }
}
