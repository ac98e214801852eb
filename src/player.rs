use crate::components::*;
use crate::progression::{ActiveSession, ProgressionSet};
use bevy::prelude::*;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_player).add_systems(
            FixedUpdate,
            sync_player_position.after(ProgressionSet),
        );
    }
}

fn spawn_player(
    mut commands: Commands,
    session: Res<ActiveSession>,
    headless: Res<HeadlessMode>,
) {
    let body = session.0.body();
    let mut entity = commands.spawn((
        Player,
        GamePosition::from(body.position),
        Transform::from_xyz(body.position.x, body.position.y, 10.0),
    ));

    if !headless.0 {
        entity.insert(Sprite::from_color(Color::srgb(0.2, 0.4, 0.9), body.size));
    }
}

fn sync_player_position(
    session: Res<ActiveSession>,
    mut query: Query<&mut GamePosition, With<Player>>,
) {
    let next = GamePosition::from(session.0.body().position);
    for mut pos in query.iter_mut() {
        if *pos != next {
            *pos = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::level::BuiltinLevels;
    use crate::session::Session;

    #[test]
    fn player_follows_session_body() {
        let session = Session::start(GameConfig::default(), Box::new(BuiltinLevels::demo()))
            .expect("demo pack loads");
        let mut app = App::new();
        app.insert_resource(ActiveSession(session))
            .insert_resource(HeadlessMode(true))
            .add_plugins(PlayerPlugin);
        app.update();

        let mut query = app.world_mut().query_filtered::<&GamePosition, With<Player>>();
        let pos = *query.single(app.world());
        assert_eq!(pos, GamePosition { x: 128.0, y: 286.0 });

        app.world_mut()
            .resource_mut::<ActiveSession>()
            .0
            .body_mut()
            .position = Vec2::new(300.0, 400.0);
        app.world_mut().run_schedule(FixedUpdate);

        let pos = *query.single(app.world());
        assert_eq!(pos, GamePosition { x: 300.0, y: 400.0 });
    }
}
