use std::path::PathBuf;

use bevy::log::{debug, info, warn};
use serde::Serialize;

use crate::config::GameConfig;
use crate::error::ProgressionResult;
use crate::events::ProgressionNotice;
use crate::ledger::{ClaimOutcome, CollectibleId, CollectibleKind};
use crate::level::{RegionCategory, RegionLoader, RegionSet};
use crate::lock_gate::RegionLayer;
use crate::physics::{PlatformerPhysics, PlayerBody};
use crate::teleport::{self, Facing};
use crate::transition::{
    ControllerPhase, ProgressionState, ReloadRequest, TransitionEvent, TransitionOutcome,
};
use crate::world::{Timeline, WorldKey};

/// Held directions for one frame.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct MovementIntent {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FrameResult {
    Continued,
    Reloaded(ReloadRequest),
    SessionComplete { levels_cleared: u32 },
}

/// What the HUD shows.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub level: u32,
    pub timeline: Timeline,
    pub keys: u32,
    pub potions: u32,
    pub gate_unlocked: bool,
    pub timeline_changes: u32,
}

/// The frame loop. Owns the progression state together with the collaborators
/// rebuilt on every reload: the active region set, the physics wiring and the
/// player body.
pub struct Session {
    config: GameConfig,
    loader: Box<dyn RegionLoader>,
    state: ProgressionState,
    regions: RegionSet,
    physics: PlatformerPhysics,
    body: PlayerBody,
    facing: Facing,
    jump_needs_reset: bool,
    reloads: u64,
    notices: Vec<ProgressionNotice>,
}

impl Session {
    /// Load the first world. Fails if its asset cannot be loaded.
    pub fn start(config: GameConfig, loader: Box<dyn RegionLoader>) -> ProgressionResult<Self> {
        let start = config.start_position();
        let mut session = Self {
            physics: PlatformerPhysics::new(config.gravity, RegionLayer::Locks),
            body: PlayerBody::new(start, config.player_size()),
            config,
            loader,
            state: ProgressionState::new(),
            regions: RegionSet::default(),
            facing: Facing::default(),
            jump_needs_reset: false,
            reloads: 0,
            notices: Vec::new(),
        };
        let outcome = session.state.begin(session.config.max_level);
        session.resolve(outcome)?;
        Ok(session)
    }

    fn resolve(&mut self, outcome: TransitionOutcome) -> ProgressionResult<FrameResult> {
        match outcome {
            TransitionOutcome::Reload(request) => {
                self.reload(request)?;
                Ok(FrameResult::Reloaded(request))
            }
            TransitionOutcome::SessionComplete { levels_cleared } => {
                self.notices
                    .push(ProgressionNotice::SessionComplete { levels_cleared });
                Ok(FrameResult::SessionComplete { levels_cleared })
            }
        }
    }

    /// Rebuild regions, physics and the player for the requested world.
    pub fn reload(&mut self, request: ReloadRequest) -> ProgressionResult<()> {
        let def = self.loader.load(request.world)?;
        let level_start = def.spawn_or(self.config.start_position());
        let mut regions = RegionSet::new(def.regions);

        let definitions = regions.collectible_definitions(request.world);
        self.state.ledger_mut().bind(&definitions);
        let hidden = regions.prune_claimed(self.state.ledger());

        self.physics = PlatformerPhysics::new(self.config.gravity, self.state.obstruction_layer());
        self.body = PlayerBody::new(request.spawn.resolve(level_start), self.config.player_size());
        self.regions = regions;
        self.state.finish_reload();
        self.reloads += 1;

        if let Err(e) = self.state.check_invariants() {
            debug_assert!(false, "{e}");
            warn!("[Timeswap] {e}");
        }
        info!(
            "[Timeswap] Entered {} ({} regions, {} claimed pickups hidden, walls {:?})",
            request.world,
            self.regions.len(),
            hidden,
            self.physics.walls()
        );
        self.notices.push(ProgressionNotice::WorldReloaded {
            world: request.world,
            cause: request.cause,
            spawn: self.body.position.to_array(),
        });
        Ok(())
    }

    /// Apply a transition event and rebuild the world it leads to.
    pub fn fire(&mut self, event: TransitionEvent) -> ProgressionResult<FrameResult> {
        let world = self.state.world();
        if self.state.phase() != ControllerPhase::Finished {
            info!("[Timeswap] {:?} in {}", event, world);
            self.notices.push(ProgressionNotice::Transition {
                event,
                world,
                x: self.body.position.x,
                y: self.body.position.y,
            });
        }
        let outcome = self
            .state
            .apply(event, self.body.position, self.config.max_level);
        self.resolve(outcome)
    }

    pub fn swap_timeline(&mut self) -> ProgressionResult<FrameResult> {
        self.fire(TransitionEvent::TimelineSwapRequested)
    }

    pub fn restart(&mut self) -> ProgressionResult<FrameResult> {
        self.fire(TransitionEvent::RestartRequested)
    }

    /// Spend a potion to jump forward. No-op without potions.
    pub fn try_teleport(&mut self) -> bool {
        if self.state.phase() != ControllerPhase::Playing {
            return false;
        }
        let from = self.body.position;
        let moved = teleport::try_teleport(
            self.state.ledger_mut(),
            &mut self.body.position,
            self.facing,
            self.config.teleport_distance,
        );
        if moved {
            self.notices.push(ProgressionNotice::Teleported {
                world: self.state.world(),
                from: from.to_array(),
                to: self.body.position.to_array(),
            });
        }
        moved
    }

    /// One frame: movement, then hazard, fall, exit, collectibles and locks in
    /// that order. The first transition ends the frame.
    pub fn update(&mut self, dt: f32, intent: MovementIntent) -> ProgressionResult<FrameResult> {
        match self.state.phase() {
            ControllerPhase::Playing => {}
            ControllerPhase::Finished => {
                return Ok(FrameResult::SessionComplete {
                    levels_cleared: self.state.world().level.get().saturating_sub(1),
                })
            }
            ControllerPhase::Reloading => return Ok(FrameResult::Continued),
        }

        self.apply_movement(intent);
        self.physics.step(&mut self.body, &self.regions, dt * 60.0);

        let bounds = self.body.bounds();
        if self.regions.any_overlapping(&bounds, RegionCategory::Bounce) {
            self.body.velocity.y = self.config.bounce_speed;
        }
        if self.regions.any_overlapping(&bounds, RegionCategory::Hazard) {
            return self.fire(TransitionEvent::HazardContact);
        }
        if self.body.position.y < self.config.fall_threshold {
            return self.fire(TransitionEvent::FallBelowThreshold);
        }
        if self.regions.any_overlapping(&bounds, RegionCategory::Exit) {
            return self.fire(TransitionEvent::ExitReached);
        }

        for kind in [CollectibleKind::Key, CollectibleKind::Potion] {
            for id in self.regions.overlapping_collectibles(&bounds, kind) {
                self.collect(&id, kind);
            }
        }

        let removed = self.regions.remove_overlapping(&bounds, RegionCategory::Lock);
        if removed > 0 {
            debug!("[Timeswap] Removed {} lock(s) in {}", removed, self.state.world());
            self.notices.push(ProgressionNotice::LocksRemoved {
                world: self.state.world(),
                count: removed,
            });
        }

        Ok(FrameResult::Continued)
    }

    fn collect(&mut self, id: &CollectibleId, kind: CollectibleKind) {
        let gate_before = self.state.gate();
        let outcome = self.state.ledger_mut().claim(id);
        self.regions.remove_collectible(id);
        if outcome == ClaimOutcome::Granted {
            self.notices.push(ProgressionNotice::CollectibleClaimed {
                world: self.state.world(),
                id: id.clone(),
                kind,
            });
        }
        if self.state.gate() != gate_before {
            self.physics.rearm(self.state.obstruction_layer());
            info!("[Timeswap] Lock gate opened in {}", self.state.world());
            self.notices.push(ProgressionNotice::GateOpened {
                world: self.state.world(),
            });
        }
    }

    fn apply_movement(&mut self, intent: MovementIntent) {
        let on_ladder = self.physics.on_ladder(&self.body, &self.regions);
        let speed = self.config.move_speed;

        if !intent.up {
            self.jump_needs_reset = false;
        }
        if intent.up && !intent.down {
            if on_ladder {
                self.body.velocity.y = speed;
            } else if !self.jump_needs_reset
                && self.physics.can_jump(
                    &self.body,
                    &self.regions,
                    self.config.jump_probe_distance,
                )
            {
                self.body.velocity.y = self.config.jump_speed;
                self.jump_needs_reset = true;
                self.notices.push(ProgressionNotice::Jumped {
                    world: self.state.world(),
                });
            }
        } else if intent.down && !intent.up && on_ladder {
            self.body.velocity.y = -speed;
        }
        if on_ladder && intent.up == intent.down {
            self.body.velocity.y = 0.0;
        }

        self.body.velocity.x = match (intent.left, intent.right) {
            (false, true) => {
                self.facing = Facing::Right;
                speed
            }
            (true, false) => {
                self.facing = Facing::Left;
                -speed
            }
            _ => 0.0,
        };
    }

    pub fn hud(&self) -> HudSnapshot {
        let world = self.state.world();
        let inventory = self.state.ledger().inventory();
        HudSnapshot {
            level: world.level.get(),
            timeline: world.timeline,
            keys: inventory.keys_available,
            potions: inventory.potions_available,
            gate_unlocked: self.state.gate().unlocked,
            timeline_changes: self.state.timeline_changes(),
        }
    }

    pub fn drain_notices(&mut self) -> Vec<ProgressionNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn state(&self) -> &ProgressionState {
        &self.state
    }

    pub fn world(&self) -> WorldKey {
        self.state.world()
    }

    pub fn is_finished(&self) -> bool {
        self.state.phase() == ControllerPhase::Finished
    }

    pub fn regions(&self) -> &RegionSet {
        &self.regions
    }

    pub fn physics(&self) -> &PlatformerPhysics {
        &self.physics
    }

    pub fn body(&self) -> &PlayerBody {
        &self.body
    }

    /// Direct access for collaborators that move the player outside a frame.
    pub fn body_mut(&mut self) -> &mut PlayerBody {
        &mut self.body
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Number of completed reloads, including the initial load.
    pub fn reload_count(&self) -> u64 {
        self.reloads
    }

    /// File backing the current world, when the loader reads from disk.
    pub fn source_path(&self) -> Option<PathBuf> {
        self.loader.source_path(self.state.world())
    }
}
