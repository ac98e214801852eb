use std::collections::HashMap;

use bevy::log::{debug, info};
use bevy::math::Vec2;
use serde::Serialize;

use crate::carry::{PlayerCarryState, SpawnPolicy};
use crate::error::{ProgressionError, ProgressionResult};
use crate::ledger::{CollectibleKind, CollectibleLedger};
use crate::lock_gate::{LockGateSelector, LockGateState, RegionLayer};
use crate::world::{Timeline, WorldKey};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionEvent {
    HazardContact,
    FallBelowThreshold,
    RestartRequested,
    ExitReached,
    TimelineSwapRequested,
}

impl TransitionEvent {
    /// Everything except a timeline swap wipes the level's progress.
    pub fn is_full_reset(self) -> bool {
        !matches!(self, TransitionEvent::TimelineSwapRequested)
    }

    pub fn is_death(self) -> bool {
        matches!(
            self,
            TransitionEvent::HazardContact | TransitionEvent::FallBelowThreshold
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum ControllerPhase {
    Playing,
    /// A transition has been applied and the world is being rebuilt.
    Reloading,
    /// The last level was cleared.
    Finished,
}

/// What the environment has to rebuild after a transition.
#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub struct ReloadRequest {
    pub world: WorldKey,
    pub spawn: SpawnPolicy,
    pub cause: Option<TransitionEvent>,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum TransitionOutcome {
    Reload(ReloadRequest),
    SessionComplete { levels_cleared: u32 },
}

/// Authoritative progression model. Only the transition controller and the
/// frame loop that owns it write to this.
#[derive(Clone, Debug)]
pub struct ProgressionState {
    world: WorldKey,
    ledger: CollectibleLedger,
    /// Ledgers of the other timeline of the current level, kept across swaps.
    stashed: HashMap<WorldKey, CollectibleLedger>,
    carry: PlayerCarryState,
    timeline_changes: u32,
    phase: ControllerPhase,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressionState {
    /// Fresh session state. Starts in `Reloading` until the first world is built.
    pub fn new() -> Self {
        let world = WorldKey::start();
        Self {
            world,
            ledger: CollectibleLedger::new(world),
            stashed: HashMap::new(),
            carry: PlayerCarryState::default(),
            timeline_changes: 0,
            phase: ControllerPhase::Reloading,
        }
    }

    /// The entry check for the first world of the session.
    pub fn begin(&mut self, max_level: u32) -> TransitionOutcome {
        self.phase = ControllerPhase::Reloading;
        self.enter(None, max_level)
    }

    pub fn apply(
        &mut self,
        event: TransitionEvent,
        position: Vec2,
        max_level: u32,
    ) -> TransitionOutcome {
        if self.phase == ControllerPhase::Finished {
            return self.completion();
        }
        self.phase = ControllerPhase::Reloading;

        if event.is_full_reset() {
            self.hard_reset();
        }
        match event {
            TransitionEvent::HazardContact
            | TransitionEvent::FallBelowThreshold
            | TransitionEvent::RestartRequested => {}
            TransitionEvent::ExitReached => {
                self.world = self.world.next_level();
                self.ledger = CollectibleLedger::new(self.world);
            }
            TransitionEvent::TimelineSwapRequested => {
                self.carry.save(position);
                self.timeline_changes += 1;
                let next = self.world.swapped();
                let incoming = self
                    .stashed
                    .remove(&next)
                    .unwrap_or_else(|| CollectibleLedger::new(next));
                let outgoing = std::mem::replace(&mut self.ledger, incoming);
                self.stashed.insert(outgoing.world(), outgoing);
                self.world = next;
            }
        }

        self.enter(Some(event), max_level)
    }

    /// Pure form of [`apply`](Self::apply): leaves `self` untouched.
    pub fn transitioned(
        &self,
        event: TransitionEvent,
        position: Vec2,
        max_level: u32,
    ) -> (Self, TransitionOutcome) {
        let mut next = self.clone();
        let outcome = next.apply(event, position, max_level);
        (next, outcome)
    }

    /// Called once the environment has rebuilt the requested world.
    pub fn finish_reload(&mut self) {
        debug_assert_eq!(self.phase, ControllerPhase::Reloading);
        if self.phase == ControllerPhase::Reloading {
            self.phase = ControllerPhase::Playing;
        }
    }

    fn hard_reset(&mut self) {
        self.ledger.reset();
        self.stashed.clear();
        self.carry.discard();
        self.timeline_changes = 0;
    }

    fn enter(&mut self, cause: Option<TransitionEvent>, max_level: u32) -> TransitionOutcome {
        if self.world.level.exceeds(max_level) {
            self.phase = ControllerPhase::Finished;
            info!(
                "[Timeswap] Level {} exceeds max level {}, session complete",
                self.world.level, max_level
            );
            return self.completion();
        }
        let spawn = SpawnPolicy::for_entry(self.timeline_changes, &self.carry);
        debug!(
            "[Timeswap] {:?} -> reload {} with {:?}",
            cause, self.world, spawn
        );
        TransitionOutcome::Reload(ReloadRequest {
            world: self.world,
            spawn,
            cause,
        })
    }

    fn completion(&self) -> TransitionOutcome {
        TransitionOutcome::SessionComplete {
            levels_cleared: self.world.level.get().saturating_sub(1),
        }
    }

    pub fn world(&self) -> WorldKey {
        self.world
    }

    pub fn ledger(&self) -> &CollectibleLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut CollectibleLedger {
        &mut self.ledger
    }

    pub fn stashed_ledger(&self, timeline: Timeline) -> Option<&CollectibleLedger> {
        self.stashed.get(&WorldKey::new(self.world.level, timeline))
    }

    pub fn carry(&self) -> &PlayerCarryState {
        &self.carry
    }

    /// Swaps since the level was last (re)started.
    pub fn timeline_changes(&self) -> u32 {
        self.timeline_changes
    }

    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    pub fn gate(&self) -> LockGateState {
        LockGateState::from_ledger(&self.ledger)
    }

    pub fn obstruction_layer(&self) -> RegionLayer {
        LockGateSelector::current_obstruction_set(&self.ledger)
    }

    pub fn check_invariants(&self) -> ProgressionResult<()> {
        let violation = |msg: String| Err(ProgressionError::InvariantViolation(msg));

        if self.ledger.world() != self.world {
            return violation(format!(
                "active ledger scoped to {} while in {}",
                self.ledger.world(),
                self.world
            ));
        }
        for (key, ledger) in &self.stashed {
            if key.level != self.world.level || *key == self.world || ledger.world() != *key {
                return violation(format!(
                    "stashed ledger {} does not belong beside {}",
                    key, self.world
                ));
            }
        }
        if let Some(id) = self.ledger.claimed_ids().find(|id| !self.ledger.is_defined(id)) {
            return violation(format!("claim record for undefined {id} in {}", self.world));
        }
        let inventory = self.ledger.inventory();
        for kind in [CollectibleKind::Key, CollectibleKind::Potion] {
            let claimed = self.ledger.claimed_count(kind) as u32;
            if inventory.count(kind) > claimed {
                return violation(format!(
                    "{:?} available {} exceeds {} claimed in {}",
                    kind,
                    inventory.count(kind),
                    claimed,
                    self.world
                ));
            }
        }
        if self.timeline_changes > 0 && !self.carry.has_carry {
            return violation("timeline swapped without a carried position".to_string());
        }
        Ok(())
    }
}
