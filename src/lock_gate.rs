use serde::Serialize;

use crate::ledger::CollectibleLedger;

/// Obstruction layer handed to the physics collaborator as its wall set.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionLayer {
    /// Lock regions are solid.
    Locks,
    /// Empty stand-in; nothing extra is solid.
    Placeholder,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct LockGateState {
    pub unlocked: bool,
}

impl LockGateState {
    pub fn from_ledger(ledger: &CollectibleLedger) -> Self {
        Self {
            unlocked: ledger.any_key_claimed(),
        }
    }
}

pub struct LockGateSelector;

impl LockGateSelector {
    pub fn current_obstruction_set(ledger: &CollectibleLedger) -> RegionLayer {
        if LockGateState::from_ledger(ledger).unlocked {
            RegionLayer::Placeholder
        } else {
            RegionLayer::Locks
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{CollectibleDefinition, CollectibleId, CollectibleKind};
    use crate::world::WorldKey;

    fn ledger() -> CollectibleLedger {
        let world = WorldKey::start();
        let defs = [
            CollectibleDefinition {
                id: CollectibleId::new("key1"),
                kind: CollectibleKind::Key,
                scope: world,
            },
            CollectibleDefinition {
                id: CollectibleId::new("key2"),
                kind: CollectibleKind::Key,
                scope: world,
            },
            CollectibleDefinition {
                id: CollectibleId::new("potion1"),
                kind: CollectibleKind::Potion,
                scope: world,
            },
        ];
        CollectibleLedger::with_definitions(world, &defs)
    }

    #[test]
    fn locks_are_solid_until_a_key_is_claimed() {
        let mut ledger = ledger();
        assert_eq!(
            LockGateSelector::current_obstruction_set(&ledger),
            RegionLayer::Locks
        );

        ledger.claim(&CollectibleId::new("potion1"));
        assert_eq!(
            LockGateSelector::current_obstruction_set(&ledger),
            RegionLayer::Locks
        );

        ledger.claim(&CollectibleId::new("key1"));
        assert_eq!(
            LockGateSelector::current_obstruction_set(&ledger),
            RegionLayer::Placeholder
        );
    }

    #[test]
    fn gate_opens_at_most_once_and_only_closes_on_reset() {
        let mut ledger = ledger();
        let mut flips = 0;
        let mut last = LockGateState::from_ledger(&ledger);
        for id in ["key1", "key1", "key2", "potion1"] {
            ledger.claim(&CollectibleId::new(id));
            let now = LockGateState::from_ledger(&ledger);
            assert!(now.unlocked || !last.unlocked, "gate closed without a reset");
            if now != last {
                flips += 1;
            }
            last = now;
        }
        assert_eq!(flips, 1);

        // Spending keys does not relock; the gate follows claims.
        ledger.consume(CollectibleKind::Key);
        ledger.consume(CollectibleKind::Key);
        assert!(LockGateState::from_ledger(&ledger).unlocked);

        ledger.reset();
        assert!(!LockGateState::from_ledger(&ledger).unlocked);
    }
}
