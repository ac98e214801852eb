use std::collections::HashMap;
use std::path::PathBuf;

use bevy::log::debug;
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::collision::Aabb;
use crate::error::{ProgressionError, ProgressionResult};
use crate::ledger::{CollectibleDefinition, CollectibleId, CollectibleKind, CollectibleLedger};
use crate::world::{Level, Timeline, WorldKey};

/// What a region of a level is.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegionKind {
    Platform,
    Hazard,
    Exit,
    Lock,
    Ladder,
    Bounce,
    Collectible {
        id: CollectibleId,
        kind: CollectibleKind,
    },
}

/// Region categories the collision collaborator is queried with.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RegionCategory {
    Platform,
    Hazard,
    Exit,
    Lock,
    Ladder,
    Bounce,
    Collectible(CollectibleKind),
}

impl RegionKind {
    pub fn category(&self) -> RegionCategory {
        match self {
            RegionKind::Platform => RegionCategory::Platform,
            RegionKind::Hazard => RegionCategory::Hazard,
            RegionKind::Exit => RegionCategory::Exit,
            RegionKind::Lock => RegionCategory::Lock,
            RegionKind::Ladder => RegionCategory::Ladder,
            RegionKind::Bounce => RegionCategory::Bounce,
            RegionKind::Collectible { kind, .. } => RegionCategory::Collectible(*kind),
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Region {
    #[serde(flatten)]
    pub kind: RegionKind,
    #[serde(flatten)]
    pub bounds: Aabb,
}

impl Region {
    pub fn new(kind: RegionKind, bounds: Aabb) -> Self {
        Self { kind, bounds }
    }

    pub fn collectible_id(&self) -> Option<&CollectibleId> {
        match &self.kind {
            RegionKind::Collectible { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Level asset as delivered by a [`RegionLoader`].
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct LevelDef {
    /// Fixed start coordinates; the configured default applies when absent.
    #[serde(default)]
    pub spawn: Option<[f32; 2]>,
    pub regions: Vec<Region>,
}

impl LevelDef {
    pub fn spawn_or(&self, default: Vec2) -> Vec2 {
        self.spawn.map(Vec2::from).unwrap_or(default)
    }
}

/// Regions active during one world visit. Collectibles and locks are removed
/// from it as the player touches them.
#[derive(Clone, Debug, Default)]
pub struct RegionSet {
    regions: Vec<Region>,
    revision: u64,
}

impl RegionSet {
    pub fn new(regions: Vec<Region>) -> Self {
        Self {
            regions,
            revision: 0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Bumped on every removal so renderers know to rebuild.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn of(&self, category: RegionCategory) -> impl Iterator<Item = &Region> {
        self.regions
            .iter()
            .filter(move |r| r.kind.category() == category)
    }

    pub fn any_overlapping(&self, bounds: &Aabb, category: RegionCategory) -> bool {
        self.of(category).any(|r| r.bounds.overlaps(bounds))
    }

    pub fn overlapping_collectibles(
        &self,
        bounds: &Aabb,
        kind: CollectibleKind,
    ) -> Vec<CollectibleId> {
        self.of(RegionCategory::Collectible(kind))
            .filter(|r| r.bounds.overlaps(bounds))
            .filter_map(|r| r.collectible_id().cloned())
            .collect()
    }

    pub fn remove_collectible(&mut self, id: &CollectibleId) -> bool {
        let before = self.regions.len();
        self.regions.retain(|r| r.collectible_id() != Some(id));
        self.note_removed(before)
    }

    pub fn remove_overlapping(&mut self, bounds: &Aabb, category: RegionCategory) -> usize {
        let before = self.regions.len();
        self.regions
            .retain(|r| r.kind.category() != category || !r.bounds.overlaps(bounds));
        let removed = before - self.regions.len();
        self.note_removed(before);
        removed
    }

    /// Drop pickups the ledger already holds, for a world re-entered after a swap.
    pub fn prune_claimed(&mut self, ledger: &CollectibleLedger) -> usize {
        let before = self.regions.len();
        self.regions
            .retain(|r| r.collectible_id().map_or(true, |id| !ledger.is_claimed(id)));
        let removed = before - self.regions.len();
        self.note_removed(before);
        removed
    }

    pub fn collectible_definitions(&self, world: WorldKey) -> Vec<CollectibleDefinition> {
        self.regions
            .iter()
            .filter_map(|r| match &r.kind {
                RegionKind::Collectible { id, kind } => Some(CollectibleDefinition {
                    id: id.clone(),
                    kind: *kind,
                    scope: world,
                }),
                _ => None,
            })
            .collect()
    }

    fn note_removed(&mut self, before: usize) -> bool {
        let changed = self.regions.len() != before;
        if changed {
            self.revision = self.revision.wrapping_add(1);
        }
        changed
    }
}

/// Provides the level asset for a world. Called once per reload.
pub trait RegionLoader: Send + Sync {
    fn load(&self, world: WorldKey) -> ProgressionResult<LevelDef>;

    /// File backing `world`, for loaders that read from disk.
    fn source_path(&self, _world: WorldKey) -> Option<PathBuf> {
        None
    }
}

/// Reads `level_{n}_{t}.json` files from a directory.
pub struct JsonLevelLoader {
    dir: PathBuf,
}

impl JsonLevelLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, world: WorldKey) -> PathBuf {
        self.dir.join(format!("{}.json", world.asset_stem()))
    }
}

impl RegionLoader for JsonLevelLoader {
    fn load(&self, world: WorldKey) -> ProgressionResult<LevelDef> {
        let path = self.path_for(world);
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            ProgressionError::ConfigurationError {
                world,
                reason: format!("{}: {e}", path.display()),
            }
        })?;
        let def = serde_json::from_str::<LevelDef>(&contents).map_err(|e| {
            ProgressionError::ConfigurationError {
                world,
                reason: format!("{}: {e}", path.display()),
            }
        })?;
        debug!(
            "[Timeswap] Loaded {} ({} regions) from {}",
            world,
            def.regions.len(),
            path.display()
        );
        Ok(def)
    }

    fn source_path(&self, world: WorldKey) -> Option<PathBuf> {
        Some(self.path_for(world))
    }
}

/// In-memory level pack.
#[derive(Clone, Default)]
pub struct BuiltinLevels {
    levels: HashMap<WorldKey, LevelDef>,
}

impl BuiltinLevels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, world: WorldKey, def: LevelDef) -> Self {
        self.levels.insert(world, def);
        self
    }

    /// Three short levels, each with two timelines.
    pub fn demo() -> Self {
        let w = |level: u32, timeline| {
            WorldKey::new(Level::new(level).unwrap_or(Level::FIRST), timeline)
        };
        Self::new()
            // Level 1: the key is in A, but A has a spiked gap that only B bridges.
            .with(
                w(1, Timeline::A),
                level(vec![
                    ground(0.0, 1000.0),
                    ground(1200.0, 2200.0),
                    rect(RegionKind::Hazard, 1000.0, 100.0, 1200.0, 200.0),
                    pickup("key1", CollectibleKind::Key, 600.0, 290.0),
                    rect(RegionKind::Lock, 1600.0, 250.0, 1640.0, 450.0),
                    rect(RegionKind::Exit, 2000.0, 250.0, 2060.0, 330.0),
                ]),
            )
            .with(
                w(1, Timeline::B),
                level(vec![
                    ground(0.0, 2200.0),
                    pickup("potion1", CollectibleKind::Potion, 800.0, 290.0),
                    rect(RegionKind::Lock, 1600.0, 250.0, 1640.0, 450.0),
                    rect(RegionKind::Exit, 2000.0, 250.0, 2060.0, 330.0),
                ]),
            )
            // Level 2: a ladder to the key in A, a bounce pad in B.
            .with(
                w(2, Timeline::A),
                level(vec![
                    ground(0.0, 2400.0),
                    rect(RegionKind::Ladder, 700.0, 250.0, 740.0, 560.0),
                    rect(RegionKind::Platform, 740.0, 520.0, 1100.0, 560.0),
                    pickup("key1", CollectibleKind::Key, 1000.0, 600.0),
                    rect(RegionKind::Lock, 1700.0, 250.0, 1740.0, 600.0),
                    rect(RegionKind::Hazard, 1300.0, 250.0, 1400.0, 270.0),
                    rect(RegionKind::Exit, 2200.0, 250.0, 2260.0, 330.0),
                ]),
            )
            .with(
                w(2, Timeline::B),
                level(vec![
                    ground(0.0, 2400.0),
                    rect(RegionKind::Bounce, 500.0, 250.0, 560.0, 260.0),
                    rect(RegionKind::Platform, 560.0, 700.0, 1000.0, 740.0),
                    pickup("key1", CollectibleKind::Key, 900.0, 780.0),
                    pickup("potion1", CollectibleKind::Potion, 300.0, 290.0),
                    rect(RegionKind::Lock, 1700.0, 250.0, 1740.0, 600.0),
                    rect(RegionKind::Exit, 2200.0, 250.0, 2260.0, 330.0),
                ]),
            )
            // Level 3: a wall too tall to climb; a potion teleports past it.
            .with(
                w(3, Timeline::A),
                level(vec![
                    ground(0.0, 2000.0),
                    pickup("potion1", CollectibleKind::Potion, 400.0, 290.0),
                    rect(RegionKind::Platform, 900.0, 250.0, 940.0, 900.0),
                    rect(RegionKind::Exit, 1600.0, 250.0, 1660.0, 330.0),
                ]),
            )
            .with(
                w(3, Timeline::B),
                level(vec![
                    ground(0.0, 2000.0),
                    pickup("key1", CollectibleKind::Key, 1200.0, 290.0),
                    rect(RegionKind::Lock, 1400.0, 250.0, 1440.0, 900.0),
                    rect(RegionKind::Platform, 900.0, 250.0, 940.0, 900.0),
                    rect(RegionKind::Exit, 1600.0, 250.0, 1660.0, 330.0),
                ]),
            )
    }
}

impl RegionLoader for BuiltinLevels {
    fn load(&self, world: WorldKey) -> ProgressionResult<LevelDef> {
        self.levels
            .get(&world)
            .cloned()
            .ok_or_else(|| ProgressionError::ConfigurationError {
                world,
                reason: "not in the built-in level pack".to_string(),
            })
    }
}

fn level(regions: Vec<Region>) -> LevelDef {
    LevelDef {
        spawn: None,
        regions,
    }
}

fn rect(kind: RegionKind, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Region {
    Region::new(kind, Aabb::from_corners(min_x, min_y, max_x, max_y))
}

/// Floor slab whose top surface is y = 250.
fn ground(min_x: f32, max_x: f32) -> Region {
    rect(RegionKind::Platform, min_x, 150.0, max_x, 250.0)
}

fn pickup(id: &str, kind: CollectibleKind, x: f32, y: f32) -> Region {
    Region::new(
        RegionKind::Collectible {
            id: CollectibleId::new(id),
            kind,
        },
        Aabb::new(x, y, 32.0, 32.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_level_json() {
        let json = r#"{
            "spawn": [64, 300],
            "regions": [
                {"type": "platform", "x": 500, "y": 200, "w": 1000, "h": 100},
                {"type": "collectible", "id": "key1", "kind": "key", "x": 300, "y": 290, "w": 32, "h": 32},
                {"type": "lock", "x": 800.5, "y": 350, "w": 40, "h": 200}
            ]
        }"#;
        let def: LevelDef = serde_json::from_str(json).expect("valid level json");
        assert_eq!(def.spawn, Some([64.0, 300.0]));
        assert_eq!(def.regions.len(), 3);
        assert_eq!(
            def.regions[1].kind,
            RegionKind::Collectible {
                id: CollectibleId::new("key1"),
                kind: CollectibleKind::Key,
            }
        );
        assert_eq!(def.regions[2].bounds.x, 800.5);
    }

    #[test]
    fn json_loader_reads_timeline_specific_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("level_1_2.json"),
            r#"{"regions": [{"type": "exit", "x": 10, "y": 10, "w": 4, "h": 4}]}"#,
        )
        .expect("write level");

        let loader = JsonLevelLoader::new(dir.path());
        let world = WorldKey::start().swapped();
        let def = loader.load(world).expect("level loads");
        assert_eq!(def.regions[0].kind, RegionKind::Exit);
        assert_eq!(def.spawn_or(Vec2::new(1.0, 2.0)), Vec2::new(1.0, 2.0));

        let missing = loader.load(WorldKey::start());
        assert!(matches!(
            missing,
            Err(ProgressionError::ConfigurationError { world, .. }) if world == WorldKey::start()
        ));
    }

    #[test]
    fn json_loader_reports_malformed_assets() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("level_1_1.json"), "{ not json").expect("write level");
        let err = JsonLevelLoader::new(dir.path())
            .load(WorldKey::start())
            .expect_err("malformed asset");
        assert!(err.to_string().contains("level_1_1.json"));
    }

    #[test]
    fn demo_pack_covers_three_levels_in_both_timelines() {
        let pack = BuiltinLevels::demo();
        for level in 1..=3 {
            for timeline in [Timeline::A, Timeline::B] {
                let world = WorldKey::new(Level::new(level).unwrap(), timeline);
                let def = pack.load(world).expect("demo level");
                let set = RegionSet::new(def.regions);
                assert_eq!(set.of(RegionCategory::Exit).count(), 1, "{world}");
            }
        }
        assert!(pack
            .load(WorldKey::new(Level::new(4).unwrap(), Timeline::A))
            .is_err());
    }

    #[test]
    fn region_set_removal_bumps_revision() {
        let mut set = RegionSet::new(vec![
            rect(RegionKind::Lock, 0.0, 0.0, 10.0, 10.0),
            rect(RegionKind::Lock, 100.0, 0.0, 110.0, 10.0),
            pickup("key1", CollectibleKind::Key, 50.0, 5.0),
        ]);
        let probe = Aabb::new(5.0, 5.0, 4.0, 4.0);

        assert_eq!(set.remove_overlapping(&probe, RegionCategory::Lock), 1);
        assert_eq!(set.revision(), 1);
        assert_eq!(set.remove_overlapping(&probe, RegionCategory::Lock), 0);
        assert_eq!(set.revision(), 1);
        assert!(set.remove_collectible(&CollectibleId::new("key1")));
        assert_eq!(set.len(), 1);
        assert_eq!(set.revision(), 2);
    }

    #[test]
    fn prune_claimed_hides_taken_pickups() {
        let world = WorldKey::start();
        let mut set = RegionSet::new(vec![
            pickup("key1", CollectibleKind::Key, 50.0, 5.0),
            pickup("potion1", CollectibleKind::Potion, 80.0, 5.0),
        ]);
        let mut ledger =
            CollectibleLedger::with_definitions(world, &set.collectible_definitions(world));
        ledger.claim(&CollectibleId::new("potion1"));

        assert_eq!(set.prune_claimed(&ledger), 1);
        let probe = Aabb::new(80.0, 5.0, 10.0, 10.0);
        assert!(set
            .overlapping_collectibles(&probe, CollectibleKind::Potion)
            .is_empty());
        assert_eq!(set.of(RegionCategory::Collectible(CollectibleKind::Key)).count(), 1);
    }
}
