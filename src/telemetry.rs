use std::collections::HashMap;

use bevy::prelude::*;
use serde::Serialize;

use crate::events::{EventCursor, GameEvent, GameEventBus, ProgressionNotice};
use crate::input::VirtualInput;
use crate::ledger::CollectibleKind;
use crate::transition::TransitionEvent;

#[derive(Resource, Serialize, Clone, Default, Debug)]
pub struct ProgressionTelemetry {
    pub total_frames: u64,
    pub deaths: u64,
    /// `[x, y, frame]` for every hazard contact or fall.
    pub death_locations: Vec<[f32; 3]>,
    pub restarts: u64,
    pub timeline_swaps: u64,
    pub levels_cleared: u32,
    pub keys_claimed: u64,
    pub potions_claimed: u64,
    pub teleports: u64,
    pub jumps: u64,
    pub locks_removed: u64,
    pub reloads: u64,
    pub input_counts: HashMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,
}

impl ProgressionTelemetry {
    pub fn record(&mut self, event: &GameEvent) {
        match &event.notice {
            ProgressionNotice::Transition {
                event: cause, x, y, ..
            } => {
                if cause.is_death() {
                    self.deaths += 1;
                    self.death_locations.push([*x, *y, event.frame as f32]);
                }
                match cause {
                    TransitionEvent::RestartRequested => self.restarts += 1,
                    TransitionEvent::TimelineSwapRequested => self.timeline_swaps += 1,
                    TransitionEvent::ExitReached => self.levels_cleared += 1,
                    _ => {}
                }
            }
            ProgressionNotice::WorldReloaded { .. } => self.reloads += 1,
            ProgressionNotice::CollectibleClaimed { kind, .. } => match kind {
                CollectibleKind::Key => self.keys_claimed += 1,
                CollectibleKind::Potion => self.potions_claimed += 1,
            },
            ProgressionNotice::LocksRemoved { count, .. } => self.locks_removed += *count as u64,
            ProgressionNotice::Teleported { .. } => self.teleports += 1,
            ProgressionNotice::Jumped { .. } => self.jumps += 1,
            ProgressionNotice::SessionComplete { .. } => {
                if self.completed_at.is_none() {
                    self.completed_at = Some(event.frame);
                }
            }
            ProgressionNotice::GateOpened { .. } => {}
        }
    }
}

#[derive(Resource, Default)]
struct TelemetryCursor(EventCursor);

pub struct TelemetryPlugin;

impl Plugin for TelemetryPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ProgressionTelemetry::default())
            .insert_resource(TelemetryCursor::default())
            .add_systems(
                FixedUpdate,
                count_frames.run_if(crate::game_runtime::gameplay_systems_enabled),
            )
            .add_systems(PostUpdate, (count_inputs, collect_events))
            .add_systems(Last, report_on_exit);
    }
}

fn count_frames(mut telemetry: ResMut<ProgressionTelemetry>) {
    telemetry.total_frames += 1;
}

fn count_inputs(mut telemetry: ResMut<ProgressionTelemetry>, input: Res<VirtualInput>) {
    for action in &input.just_pressed {
        *telemetry.input_counts.entry(action.clone()).or_insert(0) += 1;
    }
}

fn collect_events(
    mut telemetry: ResMut<ProgressionTelemetry>,
    bus: Res<GameEventBus>,
    mut cursor: ResMut<TelemetryCursor>,
) {
    for event in cursor.0.read(&bus) {
        telemetry.record(&event);
    }
}

/// Prints the run summary once the app is asked to exit.
fn report_on_exit(
    mut exits: EventReader<AppExit>,
    mut telemetry: ResMut<ProgressionTelemetry>,
    bus: Res<GameEventBus>,
    mut cursor: ResMut<TelemetryCursor>,
) {
    if exits.read().next().is_none() {
        return;
    }
    exits.clear();
    for event in cursor.0.read(&bus) {
        telemetry.record(&event);
    }
    match serde_json::to_string_pretty(&*telemetry) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("[Timeswap] Failed to serialize telemetry: {e}"),
    }
}
