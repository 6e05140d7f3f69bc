//! Traits the host simulation implements for the gateway.
//!
//! The gateway never reaches into host state directly; everything it needs
//! about the player, the world, or the client's identity comes through these
//! seams, which keeps the transforms testable against synthetic hosts.

use crate::protocol::ConnectionId;
use crate::session::ClientKind;
use veilcraft_core::{BlockPos, BlockStateId, EntityId, GameMode, Stack};

/// Best-effort, out-of-band client identity check.
pub trait ClientKindDetector: Send + Sync {
    /// Classify the client behind a connection. `None` means "unknown yet";
    /// the gateway treats unknown as [`ClientKind::Standard`] (always
    /// disguise) and retries on a later frame.
    fn detect(&self, connection: ConnectionId) -> Option<ClientKind>;
}

/// Read access to the player bound to a connection.
///
/// All methods reflect live server-side truth; the gateway only reads.
pub trait PlayerView {
    /// Entity id of the player.
    fn entity_id(&self) -> EntityId;

    /// Current game mode.
    fn game_mode(&self) -> GameMode;

    /// Currently selected hotbar slot.
    fn selected_slot(&self) -> u8;

    /// Number of slots in the player inventory.
    fn container_size(&self) -> u16;

    /// True (server-side) stack in an inventory slot.
    fn stack_in_slot(&self, slot: u16) -> Stack;

    /// Whether the player cannot act (dead, frozen, teleporting).
    fn is_immobile(&self) -> bool;

    /// Block state at a world position.
    fn block_state_at(&self, pos: BlockPos) -> BlockStateId;

    /// Base value of the player's break-speed attribute.
    fn break_speed_base(&self) -> f64;
}
