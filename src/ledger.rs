use std::collections::{HashMap, HashSet};
use std::fmt;

use bevy::log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::world::WorldKey;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectibleKind {
    Key,
    Potion,
}

/// Slot id of a pickup within one world, e.g. `"key1"`.
#[derive(Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectibleId(pub String);

impl CollectibleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for CollectibleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A physical pickup. Belongs to exactly one world; the same slot id in the
/// other timeline is a different definition.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct CollectibleDefinition {
    pub id: CollectibleId,
    pub kind: CollectibleKind,
    pub scope: WorldKey,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClaimOutcome {
    Granted,
    AlreadyClaimed,
}

/// Currently usable items.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Serialize)]
pub struct Inventory {
    pub keys_available: u32,
    pub potions_available: u32,
}

impl Inventory {
    pub fn count(&self, kind: CollectibleKind) -> u32 {
        match kind {
            CollectibleKind::Key => self.keys_available,
            CollectibleKind::Potion => self.potions_available,
        }
    }

    fn counter_mut(&mut self, kind: CollectibleKind) -> &mut u32 {
        match kind {
            CollectibleKind::Key => &mut self.keys_available,
            CollectibleKind::Potion => &mut self.potions_available,
        }
    }
}

/// Claim records and inventory for one visit to one world.
#[derive(Clone, Debug)]
pub struct CollectibleLedger {
    world: WorldKey,
    definitions: HashMap<CollectibleId, CollectibleKind>,
    claimed: HashSet<CollectibleId>,
    inventory: Inventory,
}

impl CollectibleLedger {
    /// An empty ledger with no definitions bound yet.
    pub fn new(world: WorldKey) -> Self {
        Self {
            world,
            definitions: HashMap::new(),
            claimed: HashSet::new(),
            inventory: Inventory::default(),
        }
    }

    pub fn with_definitions(world: WorldKey, definitions: &[CollectibleDefinition]) -> Self {
        let mut ledger = Self::new(world);
        ledger.bind(definitions);
        ledger
    }

    /// Install the definitions of a freshly loaded world. Claims on ids the
    /// world no longer defines (or now defines as another kind) are dropped
    /// and their counters given back.
    pub fn bind(&mut self, definitions: &[CollectibleDefinition]) {
        let bound: HashMap<CollectibleId, CollectibleKind> = definitions
            .iter()
            .filter(|d| {
                if d.scope != self.world {
                    warn!(
                        "[Timeswap ledger] Ignoring definition {} scoped to {} while binding {}",
                        d.id, d.scope, self.world
                    );
                    return false;
                }
                true
            })
            .map(|d| (d.id.clone(), d.kind))
            .collect();
        let previous = std::mem::replace(&mut self.definitions, bound);

        let mut stale = Vec::new();
        for id in &self.claimed {
            let before = previous.get(id);
            if before != self.definitions.get(id) {
                if let Some(kind) = before {
                    stale.push((id.clone(), *kind));
                }
            }
        }
        for (id, kind) in stale {
            self.claimed.remove(&id);
            let counter = self.inventory.counter_mut(kind);
            *counter = counter.saturating_sub(1);
            warn!(
                "[Timeswap ledger] Dropped claim on {} in {}: no longer defined as {:?}",
                id, self.world, kind
            );
        }
    }

    pub fn claim(&mut self, id: &CollectibleId) -> ClaimOutcome {
        let Some(kind) = self.definitions.get(id).copied() else {
            debug_assert!(false, "claim of unknown collectible {id} in {}", self.world);
            warn!(
                "[Timeswap ledger] Claim of unknown collectible {} in {} ignored",
                id, self.world
            );
            return ClaimOutcome::AlreadyClaimed;
        };
        if !self.claimed.insert(id.clone()) {
            return ClaimOutcome::AlreadyClaimed;
        }
        *self.inventory.counter_mut(kind) += 1;
        debug!("[Timeswap ledger] Claimed {:?} {} in {}", kind, id, self.world);
        ClaimOutcome::Granted
    }

    pub fn reset(&mut self) {
        self.claimed.clear();
        self.inventory = Inventory::default();
    }

    pub fn consume(&mut self, kind: CollectibleKind) -> bool {
        let counter = self.inventory.counter_mut(kind);
        if *counter == 0 {
            return false;
        }
        *counter -= 1;
        true
    }

    pub fn world(&self) -> WorldKey {
        self.world
    }

    pub fn inventory(&self) -> Inventory {
        self.inventory
    }

    pub fn is_claimed(&self, id: &CollectibleId) -> bool {
        self.claimed.contains(id)
    }

    pub fn is_defined(&self, id: &CollectibleId) -> bool {
        self.definitions.contains_key(id)
    }

    pub fn claimed_count(&self, kind: CollectibleKind) -> usize {
        self.claimed
            .iter()
            .filter(|id| self.definitions.get(*id) == Some(&kind))
            .count()
    }

    pub fn any_key_claimed(&self) -> bool {
        self.claimed_count(CollectibleKind::Key) > 0
    }

    pub fn claimed_ids(&self) -> impl Iterator<Item = &CollectibleId> {
        self.claimed.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs(world: WorldKey) -> Vec<CollectibleDefinition> {
        vec![
            CollectibleDefinition {
                id: CollectibleId::new("key1"),
                kind: CollectibleKind::Key,
                scope: world,
            },
            CollectibleDefinition {
                id: CollectibleId::new("potion1"),
                kind: CollectibleKind::Potion,
                scope: world,
            },
            CollectibleDefinition {
                id: CollectibleId::new("potion2"),
                kind: CollectibleKind::Potion,
                scope: world,
            },
        ]
    }

    #[test]
    fn claim_is_idempotent_within_a_visit() {
        let world = WorldKey::start();
        let mut ledger = CollectibleLedger::with_definitions(world, &defs(world));
        let key = CollectibleId::new("key1");

        let outcomes: Vec<ClaimOutcome> = (0..5).map(|_| ledger.claim(&key)).collect();
        assert_eq!(outcomes[0], ClaimOutcome::Granted);
        assert!(outcomes[1..]
            .iter()
            .all(|o| *o == ClaimOutcome::AlreadyClaimed));
        assert_eq!(ledger.inventory().keys_available, 1);
        assert_eq!(ledger.inventory().potions_available, 0);
        assert!(ledger.any_key_claimed());
    }

    #[test]
    fn reset_clears_records_and_counters() {
        let world = WorldKey::start();
        let mut ledger = CollectibleLedger::with_definitions(world, &defs(world));
        ledger.claim(&CollectibleId::new("key1"));
        ledger.claim(&CollectibleId::new("potion1"));

        ledger.reset();

        assert_eq!(ledger.inventory(), Inventory::default());
        assert!(!ledger.is_claimed(&CollectibleId::new("key1")));
        assert!(!ledger.any_key_claimed());
        // A fresh visit may claim again.
        assert_eq!(
            ledger.claim(&CollectibleId::new("key1")),
            ClaimOutcome::Granted
        );
    }

    #[test]
    fn consume_stops_at_zero() {
        let world = WorldKey::start();
        let mut ledger = CollectibleLedger::with_definitions(world, &defs(world));
        ledger.claim(&CollectibleId::new("potion1"));

        assert!(ledger.consume(CollectibleKind::Potion));
        assert!(!ledger.consume(CollectibleKind::Potion));
        assert!(!ledger.consume(CollectibleKind::Key));
        assert_eq!(ledger.inventory().potions_available, 0);
        // Consumption does not re-open the claim.
        assert_eq!(
            ledger.claim(&CollectibleId::new("potion1")),
            ClaimOutcome::AlreadyClaimed
        );
    }

    #[test]
    fn rebinding_drops_records_for_removed_definitions() {
        let world = WorldKey::start();
        let mut ledger = CollectibleLedger::with_definitions(world, &defs(world));
        ledger.claim(&CollectibleId::new("key1"));
        ledger.claim(&CollectibleId::new("potion2"));

        let remaining: Vec<_> = defs(world)
            .into_iter()
            .filter(|d| d.id.0 != "potion2")
            .collect();
        ledger.bind(&remaining);

        assert!(ledger.is_claimed(&CollectibleId::new("key1")));
        assert!(!ledger.is_claimed(&CollectibleId::new("potion2")));
        assert_eq!(ledger.claimed_count(CollectibleKind::Potion), 0);
        assert_eq!(ledger.inventory().potions_available, 0);
        assert_eq!(ledger.inventory().keys_available, 1);
    }

    #[test]
    fn bind_ignores_definitions_from_other_worlds() {
        let world = WorldKey::start();
        let ledger = CollectibleLedger::with_definitions(world, &defs(world.swapped()));
        assert!(!ledger.is_defined(&CollectibleId::new("key1")));
    }

    #[test]
    fn rebinding_without_a_claimed_id_returns_its_counter() {
        let world = WorldKey::start();
        let mut ledger = CollectibleLedger::with_definitions(world, &defs(world));
        ledger.claim(&CollectibleId::new("key1"));
        ledger.claim(&CollectibleId::new("potion1"));
        ledger.claim(&CollectibleId::new("potion2"));
        assert!(ledger.consume(CollectibleKind::Potion));

        // key1 is gone and potion2 became a key.
        let edited = vec![
            CollectibleDefinition {
                id: CollectibleId::new("potion1"),
                kind: CollectibleKind::Potion,
                scope: world,
            },
            CollectibleDefinition {
                id: CollectibleId::new("potion2"),
                kind: CollectibleKind::Key,
                scope: world,
            },
        ];
        ledger.bind(&edited);

        assert!(!ledger.is_claimed(&CollectibleId::new("key1")));
        assert!(!ledger.is_claimed(&CollectibleId::new("potion2")));
        assert!(ledger.is_claimed(&CollectibleId::new("potion1")));
        assert_eq!(
            ledger.inventory(),
            Inventory {
                keys_available: 0,
                potions_available: 0,
            }
        );
        assert!(!ledger.any_key_claimed());

        // Rebinding the same definitions keeps everything.
        ledger.bind(&edited);
        assert!(ledger.is_claimed(&CollectibleId::new("potion1")));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "unknown collectible")]
    fn unknown_claim_fails_fast_in_debug() {
        let world = WorldKey::start();
        let mut ledger = CollectibleLedger::with_definitions(world, &defs(world));
        ledger.claim(&CollectibleId::new("key9"));
    }
}
