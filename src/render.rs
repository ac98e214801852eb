use crate::components::*;
use crate::level::{RegionCategory, RegionSet};
use crate::ledger::CollectibleKind;
use crate::progression::ActiveSession;
use bevy::prelude::*;

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(CameraFollow::default())
            .insert_resource(RegionSpriteStamp::default())
            .add_systems(Startup, (spawn_camera, spawn_hud))
            .add_systems(
                Update,
                (
                    sync_game_position_to_transform,
                    camera_follow,
                    rebuild_region_sprites,
                    update_hud,
                )
                    .chain(),
            );
    }
}

#[derive(Component)]
pub struct MainCamera;

#[derive(Resource, Clone)]
pub struct CameraFollow {
    pub follow_speed: f32,
    pub offset: Vec2,
    base: Vec2,
}

impl Default for CameraFollow {
    fn default() -> Self {
        Self {
            follow_speed: 0.1,
            offset: Vec2::new(0.0, 120.0),
            base: Vec2::ZERO,
        }
    }
}

/// Reload count and region revision the sprites were built from.
#[derive(Resource, Default, PartialEq, Clone, Copy)]
struct RegionSpriteStamp(Option<(u64, u64)>);

fn spawn_camera(mut commands: Commands) {
    commands.spawn((MainCamera, Camera2d, Transform::from_xyz(0.0, 0.0, 100.0)));
}

fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        HudText,
        Text::new(""),
        TextFont {
            font_size: 20.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(12.0),
            top: Val::Px(8.0),
            ..default()
        },
    ));
}

/// Sync GamePosition → Transform for all entities that have both
fn sync_game_position_to_transform(
    mut query: Query<(&GamePosition, &mut Transform), Changed<GamePosition>>,
) {
    for (pos, mut transform) in query.iter_mut() {
        transform.translation.x = pos.x;
        transform.translation.y = pos.y;
    }
}

fn camera_follow(
    time: Res<Time>,
    mut follow: ResMut<CameraFollow>,
    player_query: Query<&GamePosition, With<Player>>,
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
) {
    let Ok(mut cam_transform) = camera_query.get_single_mut() else {
        return;
    };
    let Ok(player) = player_query.get_single() else {
        return;
    };

    // Levels start at the origin; never show what lies left of or below it.
    let target = (Vec2::new(player.x, player.y) + follow.offset).max(Vec2::ZERO);
    let alpha = (follow.follow_speed * time.delta_secs() * 60.0).clamp(0.0, 1.0);
    follow.base = follow.base.lerp(target, alpha);
    cam_transform.translation.x = follow.base.x;
    cam_transform.translation.y = follow.base.y;
}

fn region_color(category: RegionCategory, gate_unlocked: bool) -> Color {
    match category {
        RegionCategory::Platform => Color::srgb(0.35, 0.3, 0.25),
        RegionCategory::Hazard => Color::srgb(0.85, 0.2, 0.15),
        RegionCategory::Exit => Color::srgb(0.95, 0.85, 0.2),
        RegionCategory::Lock if gate_unlocked => Color::srgba(0.6, 0.4, 0.8, 0.35),
        RegionCategory::Lock => Color::srgb(0.55, 0.35, 0.75),
        RegionCategory::Ladder => Color::srgb(0.6, 0.45, 0.2),
        RegionCategory::Bounce => Color::srgb(0.2, 0.8, 0.4),
        RegionCategory::Collectible(CollectibleKind::Key) => Color::srgb(1.0, 0.75, 0.1),
        RegionCategory::Collectible(CollectibleKind::Potion) => Color::srgb(0.3, 0.8, 0.95),
    }
}

fn spawn_region_sprites(commands: &mut Commands, regions: &RegionSet, gate_unlocked: bool) {
    for region in regions.iter() {
        let category = region.kind.category();
        let center = region.bounds.center();
        let z = match category {
            RegionCategory::Collectible(_) => 2.0,
            RegionCategory::Lock => 1.0,
            _ => 0.0,
        };
        commands.spawn((
            RegionSprite(category),
            Sprite::from_color(
                region_color(category, gate_unlocked),
                Vec2::new(region.bounds.w, region.bounds.h),
            ),
            Transform::from_xyz(center.x, center.y, z),
        ));
    }
}

/// Rebuilds on reload, pickup removal, lock removal and gate changes.
fn rebuild_region_sprites(
    mut commands: Commands,
    session: Res<ActiveSession>,
    mut stamp: ResMut<RegionSpriteStamp>,
    mut last_gate: Local<bool>,
    sprites: Query<Entity, With<RegionSprite>>,
) {
    let session = &session.0;
    let gate_unlocked = session.state().gate().unlocked;
    let current = RegionSpriteStamp(Some((
        session.reload_count(),
        session.regions().revision(),
    )));
    if *stamp == current && *last_gate == gate_unlocked {
        return;
    }
    for entity in sprites.iter() {
        commands.entity(entity).despawn();
    }
    spawn_region_sprites(&mut commands, session.regions(), gate_unlocked);
    *stamp = current;
    *last_gate = gate_unlocked;
}

fn update_hud(session: Res<ActiveSession>, mut query: Query<&mut Text, With<HudText>>) {
    let Ok(mut text) = query.get_single_mut() else {
        return;
    };
    let hud = session.0.hud();
    let mut line = format!(
        "Level {}{}   Keys {}   Potions {}",
        hud.level, hud.timeline, hud.keys, hud.potions
    );
    if hud.gate_unlocked {
        line.push_str("   Gate open");
    }
    if session.0.is_finished() {
        line.push_str("   Complete!");
    }
    if text.0 != line {
        text.0 = line;
    }
}
