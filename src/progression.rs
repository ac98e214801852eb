use bevy::prelude::*;

use crate::error::ProgressionResult;
use crate::events::GameEventBus;
use crate::input::VirtualInput;
use crate::session::{FrameResult, Session};

/// The running session. Every gameplay system goes through this.
#[derive(Resource)]
pub struct ActiveSession(pub Session);

/// Systems that mutate the session. Readers order themselves after it.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressionSet;

/// Stops the app after this many fixed frames (`--frames N`).
#[derive(Resource, Clone, Copy, Debug)]
pub struct FrameBudget {
    pub remaining: u64,
}

pub struct ProgressionPlugin;

impl Plugin for ProgressionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            apply_action_input
                .in_set(ProgressionSet)
                .run_if(crate::game_runtime::gameplay_systems_enabled),
        )
        .add_systems(
            FixedUpdate,
            (
                step_session
                    .in_set(ProgressionSet)
                    .run_if(crate::game_runtime::gameplay_systems_enabled),
                spend_frame_budget
                    .after(ProgressionSet)
                    .run_if(resource_exists::<FrameBudget>),
            ),
        );
    }
}

/// Discrete intents act on their press edge, once per rendered frame.
fn apply_action_input(
    input: Res<VirtualInput>,
    mut session: ResMut<ActiveSession>,
    mut bus: ResMut<GameEventBus>,
    mut exit: EventWriter<AppExit>,
) {
    let session = &mut session.0;
    if input.just_pressed("restart") {
        let result = session.restart();
        settle(result, session, &mut bus, &mut exit);
    } else if input.just_pressed("swap") {
        let result = session.swap_timeline();
        settle(result, session, &mut bus, &mut exit);
    }
    if input.just_pressed("teleport") && !session.try_teleport() {
        debug!("[Timeswap] Teleport ignored: no potions");
    }
    publish(session, &mut bus);
}

fn step_session(
    time: Res<Time<Fixed>>,
    input: Res<VirtualInput>,
    mut session: ResMut<ActiveSession>,
    mut bus: ResMut<GameEventBus>,
    mut exit: EventWriter<AppExit>,
) {
    let dt = time.timestep().as_secs_f32();
    let session = &mut session.0;
    let result = session.update(dt, input.movement_intent());
    settle(result, session, &mut bus, &mut exit);
}

fn spend_frame_budget(mut budget: ResMut<FrameBudget>, mut exit: EventWriter<AppExit>) {
    budget.remaining = budget.remaining.saturating_sub(1);
    if budget.remaining == 0 {
        info!("[Timeswap] Frame budget spent, exiting");
        exit.send(AppExit::Success);
    }
}

/// Publish notices and turn the frame result into app control flow.
pub(crate) fn settle(
    result: ProgressionResult<FrameResult>,
    session: &mut Session,
    bus: &mut GameEventBus,
    exit: &mut EventWriter<AppExit>,
) {
    publish(session, bus);
    match result {
        Ok(FrameResult::SessionComplete { .. }) => {
            exit.send(AppExit::Success);
        }
        Ok(FrameResult::Continued | FrameResult::Reloaded(_)) => {}
        Err(e) => {
            error!("[Timeswap] {e}");
            exit.send(AppExit::error());
        }
    }
}

fn publish(session: &mut Session, bus: &mut GameEventBus) {
    for notice in session.drain_notices() {
        bus.emit(notice);
    }
}
