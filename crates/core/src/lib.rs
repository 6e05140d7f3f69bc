#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod asset;
pub mod block;
pub mod stack;
pub mod tool;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use asset::{AssetId, AssetIdError, VANILLA_NAMESPACE};
pub use block::{BlockPos, BlockStateId, BlockStateProperties, BlockTraits};
pub use stack::{Stack, StackComponents};
pub use tool::{destroy_speed, Tool, ToolRule};

/// Entity identifier assigned by the host simulation.
pub type EntityId = u32;

/// Game mode of a player, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// Normal play: blocks take time to break.
    Survival,
    /// Creative play: instant breaking, free items.
    Creative,
    /// Adventure: interaction restricted by item components.
    Adventure,
    /// Spectator: no interaction at all.
    Spectator,
}

/// Equipment slot on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentSlot {
    /// Main hand.
    MainHand,
    /// Off hand.
    OffHand,
    /// Feet armor slot.
    Feet,
    /// Legs armor slot.
    Legs,
    /// Chest armor slot.
    Chest,
    /// Head armor slot.
    Head,
    /// Body slot (animal armor).
    Body,
}
