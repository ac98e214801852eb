use std::collections::VecDeque;

use bevy::prelude::*;
use serde::Serialize;

use crate::ledger::{CollectibleId, CollectibleKind};
use crate::transition::TransitionEvent;
use crate::world::WorldKey;

const MAX_EVENTS: usize = 500;

/// Something the progression core reports to its collaborators.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ProgressionNotice {
    /// A transition fired at this position, before the reload.
    Transition {
        event: TransitionEvent,
        world: WorldKey,
        x: f32,
        y: f32,
    },
    WorldReloaded {
        world: WorldKey,
        cause: Option<TransitionEvent>,
        spawn: [f32; 2],
    },
    CollectibleClaimed {
        world: WorldKey,
        id: CollectibleId,
        kind: CollectibleKind,
    },
    GateOpened {
        world: WorldKey,
    },
    LocksRemoved {
        world: WorldKey,
        count: usize,
    },
    Teleported {
        world: WorldKey,
        from: [f32; 2],
        to: [f32; 2],
    },
    Jumped {
        world: WorldKey,
    },
    SessionComplete {
        levels_cleared: u32,
    },
}

impl ProgressionNotice {
    /// The serialized `name` tag.
    pub fn name(&self) -> &'static str {
        match self {
            ProgressionNotice::Transition { .. } => "transition",
            ProgressionNotice::WorldReloaded { .. } => "world_reloaded",
            ProgressionNotice::CollectibleClaimed { .. } => "collectible_claimed",
            ProgressionNotice::GateOpened { .. } => "gate_opened",
            ProgressionNotice::LocksRemoved { .. } => "locks_removed",
            ProgressionNotice::Teleported { .. } => "teleported",
            ProgressionNotice::Jumped { .. } => "jumped",
            ProgressionNotice::SessionComplete { .. } => "session_complete",
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct GameEvent {
    #[serde(flatten)]
    pub notice: ProgressionNotice,
    pub frame: u64,
    /// Position in the bus since startup; never reused.
    pub seq: u64,
}

#[derive(Resource, Default)]
pub struct GameEventBus {
    pub recent: VecDeque<GameEvent>,
    pub frame: u64,
    pub dropped_events: u64,
    next_seq: u64,
    last_overflow_log_frame: u64,
}

impl GameEventBus {
    pub fn emit(&mut self, notice: ProgressionNotice) {
        self.recent.push_back(GameEvent {
            notice,
            frame: self.frame,
            seq: self.next_seq,
        });
        self.next_seq = self.next_seq.saturating_add(1);
        if self.recent.len() > MAX_EVENTS {
            let excess = self.recent.len() - MAX_EVENTS;
            for _ in 0..excess {
                self.recent.pop_front();
            }
            self.dropped_events = self.dropped_events.saturating_add(excess as u64);
            if self.frame.saturating_sub(self.last_overflow_log_frame) >= 60 {
                self.last_overflow_log_frame = self.frame;
                warn!(
                    "[Timeswap events] Dropped {} buffered events (total dropped: {})",
                    excess, self.dropped_events
                );
            }
        }
    }
}

/// Read position of one consumer in the bus.
#[derive(Resource, Default)]
pub struct EventCursor {
    next_seq: u64,
}

impl EventCursor {
    /// Events emitted since the last read. Events the bus dropped before they
    /// were read are skipped.
    pub fn read(&mut self, bus: &GameEventBus) -> Vec<GameEvent> {
        let unread: Vec<GameEvent> = bus
            .recent
            .iter()
            .filter(|ev| ev.seq >= self.next_seq)
            .cloned()
            .collect();
        if let Some(last) = unread.last() {
            self.next_seq = last.seq.saturating_add(1);
        }
        unread
    }
}

pub struct GameEventsPlugin;

impl Plugin for GameEventsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(GameEventBus::default()).add_systems(
            FixedPreUpdate,
            tick_event_frame.run_if(crate::game_runtime::gameplay_systems_enabled),
        );
    }
}

fn tick_event_frame(mut bus: ResMut<GameEventBus>) {
    bus.frame = bus.frame.saturating_add(1);
}
