use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two parallel variants of a level layout.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Timeline {
    A,
    B,
}

impl Timeline {
    pub fn toggled(self) -> Self {
        match self {
            Timeline::A => Timeline::B,
            Timeline::B => Timeline::A,
        }
    }

    /// Numeric suffix used in level asset names (`level_3_2.json` is level 3, timeline B).
    pub fn asset_index(self) -> u8 {
        match self {
            Timeline::A => 1,
            Timeline::B => 2,
        }
    }
}

impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeline::A => f.write_str("A"),
            Timeline::B => f.write_str("B"),
        }
    }
}

/// Level number, always >= 1.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(u32);

impl Level {
    pub const FIRST: Level = Level(1);

    pub fn new(n: u32) -> Option<Self> {
        (n >= 1).then_some(Level(n))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn next(self) -> Self {
        Level(self.0.saturating_add(1))
    }

    pub fn exceeds(self, max_level: u32) -> bool {
        self.0 > max_level
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Selects the map, region set and collectible set that are active.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct WorldKey {
    pub level: Level,
    pub timeline: Timeline,
}

impl WorldKey {
    pub fn new(level: Level, timeline: Timeline) -> Self {
        Self { level, timeline }
    }

    pub fn start() -> Self {
        Self::new(Level::FIRST, Timeline::A)
    }

    pub fn swapped(self) -> Self {
        Self::new(self.level, self.timeline.toggled())
    }

    /// The exit keeps the timeline the player left from.
    pub fn next_level(self) -> Self {
        Self::new(self.level.next(), self.timeline)
    }

    pub fn asset_stem(self) -> String {
        format!("level_{}_{}", self.level, self.timeline.asset_index())
    }
}

impl fmt::Display for WorldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.level, self.timeline)
    }
}
