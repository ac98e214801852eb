use bevy::prelude::*;

use crate::events::{EventCursor, GameEventBus, ProgressionNotice};

#[derive(States, Default, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum SessionFlowState {
    #[default]
    Playing,
    /// The last level was cleared; gameplay systems stop.
    Complete,
}

#[derive(Resource, Clone, Default)]
pub struct RuntimeState {
    pub state: SessionFlowState,
}

impl RuntimeState {
    pub fn set_state(&mut self, to: SessionFlowState) {
        if self.state != to {
            debug!("[Timeswap] Runtime state {:?} -> {:?}", self.state, to);
            self.state = to;
        }
    }

    pub fn is_gameplay_active(&self) -> bool {
        self.state == SessionFlowState::Playing
    }
}

pub fn gameplay_systems_enabled(
    state: Option<Res<State<SessionFlowState>>>,
    runtime: Option<Res<RuntimeState>>,
) -> bool {
    if let Some(state) = state {
        return *state.get() == SessionFlowState::Playing;
    }
    runtime.map(|r| r.is_gameplay_active()).unwrap_or(false)
}

#[derive(Resource, Default)]
struct RuntimeEventCursor(EventCursor);

fn apply_runtime_events(
    bus: Res<GameEventBus>,
    mut runtime: ResMut<RuntimeState>,
    mut cursor: ResMut<RuntimeEventCursor>,
) {
    for ev in cursor.0.read(&bus) {
        if let ProgressionNotice::SessionComplete { levels_cleared } = ev.notice {
            info!("[Timeswap] Session complete after {levels_cleared} level(s)");
            runtime.set_state(SessionFlowState::Complete);
        }
    }
}

fn sync_bevy_state_from_runtime(
    runtime: Res<RuntimeState>,
    state: Res<State<SessionFlowState>>,
    mut next_state: ResMut<NextState<SessionFlowState>>,
) {
    if state.get() != &runtime.state {
        next_state.set(runtime.state);
    }
}

pub struct RuntimeStatePlugin;

impl Plugin for RuntimeStatePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(RuntimeState::default())
            .insert_resource(RuntimeEventCursor::default())
            .init_state::<SessionFlowState>()
            .add_systems(
                Update,
                (apply_runtime_events, sync_bevy_state_from_runtime).chain(),
            );
    }
}
