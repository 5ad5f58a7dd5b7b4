use serde::{Deserialize, Serialize};

/// Fog-of-war state of a single tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TileState {
    /// Never seen by any hero.
    #[default]
    NotDiscovered,
    /// Currently inside some hero's field of view.
    Highlighted,
    /// Seen before, not currently visible.
    FogOfWar,
}

/// Lifecycle of a match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EngineState {
    #[default]
    Init,
    PlayerRegistered,
    Playing,
    /// Terminal: a hero died and no further orders are accepted.
    Death,
}

/// Per-hero position in the lock-step order cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderState {
    #[default]
    WaitingForOrder,
    OrderGiven,
    /// The hero currently prompted for an order.
    OrderInProgress,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CharacterType {
    Hero,
    Mob,
}

/// Which character types a skill may hit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetAudience {
    #[default]
    All,
    Hero,
    Mob,
}

impl TargetAudience {
    pub fn admits(self, kind: CharacterType) -> bool {
        match self {
            TargetAudience::All => true,
            TargetAudience::Hero => kind == CharacterType::Hero,
            TargetAudience::Mob => kind == CharacterType::Mob,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layout {
    #[default]
    Square,
    Hex,
}
