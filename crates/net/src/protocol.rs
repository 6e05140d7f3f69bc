//! Frame definitions for both wire directions.
//!
//! Frames are the in-memory form the host I/O layer hands to the gateway.
//! The set of variants is deliberately closed: every frame category the
//! gateway rewrites is enumerated, and everything else travels in the
//! [`OpaqueFrame`] arm, which is forwarded untouched by contract.

use serde::{Deserialize, Serialize};

use veilcraft_core::{BlockPos, BlockStateId, EntityId, EquipmentSlot, Stack};
use veilcraft_disguise::ChatNode;

/// Connection identifier assigned by the host I/O layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

/// Level event id for "block broken" (break particles + sound).
pub const LEVEL_EVENT_BLOCK_BREAK: u32 = 2001;

/// Level event id for "brushing finished".
pub const LEVEL_EVENT_BRUSH_FINISH: u32 = 3008;

/// Maximum items in one container snapshot.
pub const MAX_CONTAINER_ITEMS: usize = 1024;

/// Maximum encoded section payload per chunk frame (bytes).
pub const MAX_SECTION_DATA_LEN: usize = 2 * 1024 * 1024;

/// Maximum nesting depth of a chat tree.
pub const MAX_CHAT_DEPTH: usize = 64;

/// A frame kind the gateway does not interpret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpaqueFrame {
    /// Host protocol frame id.
    pub kind: u32,
    /// Raw payload, forwarded verbatim.
    pub payload: Vec<u8>,
}

/// One changed block inside a section-relative batch update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockStateUpdate {
    /// Absolute block position.
    pub pos: BlockPos,
    /// New block state.
    pub state: BlockStateId,
}

/// A single entry of an entity metadata frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDataValue {
    /// Metadata index on the entity.
    pub index: u8,
    /// Typed payload.
    pub value: EntityDataField,
}

/// Typed payload of an entity metadata entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityDataField {
    /// An item stack (e.g. item display entities, dropped items).
    Stack(Stack),
    /// A block state (e.g. falling blocks, block displays).
    BlockState(BlockStateId),
    /// Anything else, forwarded verbatim.
    Raw(Vec<u8>),
}

/// Particle parameterization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParticleOption {
    /// Particle textured by an item stack.
    Item {
        /// Particle type id.
        particle: u32,
        /// Source stack.
        stack: Stack,
    },
    /// Particle textured by a block state.
    Block {
        /// Particle type id.
        particle: u32,
        /// Source block state.
        state: BlockStateId,
    },
    /// Any other particle.
    Other {
        /// Particle type id.
        particle: u32,
    },
}

/// Attribute targeted by an attribute update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeId {
    /// Block break speed multiplier.
    BlockBreakSpeed,
    /// Any other attribute, by host id.
    Other(u32),
}

/// One attribute base-value update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeUpdate {
    /// Target attribute.
    pub attribute: AttributeId,
    /// New base value.
    pub base: f64,
}

/// Client response to a resource bundle push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourcePackAction {
    /// Pack accepted, download starting.
    Accepted,
    /// Pack declined.
    Declined,
    /// Pack downloaded and applied.
    SuccessfullyLoaded,
    /// Download failed.
    FailedDownload,
}

/// Player block interaction intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerActionKind {
    /// Started breaking a block.
    StartDestroyBlock,
    /// Gave up breaking.
    AbortDestroyBlock,
    /// Finished breaking.
    StopDestroyBlock,
    /// Any other action, by host id.
    Other(u8),
}

/// Frames flowing server → client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientboundFrame {
    /// Replace one slot of the player's own inventory.
    SetPlayerInventory {
        /// Inventory slot index.
        slot: u16,
        /// New contents.
        stack: Stack,
    },
    /// Single block change.
    BlockUpdate {
        /// Block position.
        pos: BlockPos,
        /// New state.
        state: BlockStateId,
    },
    /// Batched block changes within one section.
    SectionBlocksUpdate {
        /// Changed blocks.
        updates: Vec<BlockStateUpdate>,
    },
    /// Full chunk payload with light data.
    LevelChunkWithLight {
        /// Chunk X coordinate.
        chunk_x: i32,
        /// Chunk Z coordinate.
        chunk_z: i32,
        /// Number of sections encoded in `section_data`.
        section_count: u32,
        /// Concatenated encoded sections (see [`crate::section`]).
        section_data: Vec<u8>,
    },
    /// Full container snapshot.
    ContainerSetContent {
        /// Container id (0 is the player inventory).
        container_id: u8,
        /// Server state counter.
        state_id: u32,
        /// All slots in order.
        items: Vec<Stack>,
        /// Stack on the cursor.
        carried: Stack,
    },
    /// Single container slot update.
    ContainerSetSlot {
        /// Container id (0 is the player inventory).
        container_id: u8,
        /// Server state counter.
        state_id: u32,
        /// Slot index.
        slot: u16,
        /// New contents.
        stack: Stack,
    },
    /// Equipment changes on an entity.
    SetEquipment {
        /// Target entity.
        entity: EntityId,
        /// Changed equipment slots.
        slots: Vec<(EquipmentSlot, Stack)>,
    },
    /// Stack attached to the player's cursor.
    SetCursorItem {
        /// New cursor contents.
        stack: Stack,
    },
    /// System chat message.
    SystemChat {
        /// Message tree.
        content: ChatNode,
        /// Render above the hotbar instead of in chat.
        overlay: bool,
    },
    /// Entity metadata update.
    SetEntityData {
        /// Target entity.
        entity: EntityId,
        /// Changed metadata entries.
        values: Vec<EntityDataValue>,
    },
    /// Spawn particles.
    LevelParticles {
        /// Particle parameterization.
        particle: ParticleOption,
        /// Spawn position.
        x: f64,
        /// Spawn position.
        y: f64,
        /// Spawn position.
        z: f64,
        /// Particle count.
        count: u32,
    },
    /// World event keyed by an event id and block-state data.
    LevelEvent {
        /// Event id.
        event: u32,
        /// Event position.
        pos: BlockPos,
        /// Event data (a block state id for break/brush events).
        data: u32,
        /// Whether the event plays globally.
        global: bool,
    },
    /// Composite frame delivered atomically.
    Bundle(Vec<ClientboundFrame>),
    /// End of the configuration phase.
    FinishConfiguration,
    /// Resource bundle push.
    ResourcePackPush {
        /// Push id, echoed back by the client response.
        id: String,
        /// Download URL.
        url: String,
        /// Content hash of the bundle.
        hash: String,
        /// Whether the client must accept to stay connected.
        required: bool,
        /// Optional prompt text shown to the player.
        prompt: Option<String>,
    },
    /// Authoritative hotbar slot change.
    SetHeldSlot {
        /// New hotbar slot.
        slot: u8,
    },
    /// Attribute base-value updates for an entity.
    UpdateAttributes {
        /// Target entity.
        entity: EntityId,
        /// Changed attributes.
        attributes: Vec<AttributeUpdate>,
    },
    /// Unrecognized frame, forwarded untouched.
    Opaque(OpaqueFrame),
}

/// Frames flowing client → server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerboundFrame {
    /// Creative-mode direct slot edit.
    SetCreativeModeSlot {
        /// Target slot.
        slot: u16,
        /// New contents as the client sees them.
        stack: Stack,
    },
    /// Container click echo.
    ContainerClick {
        /// Container id.
        container_id: u8,
        /// Client's last known state counter.
        state_id: u32,
        /// Clicked slot.
        slot: i16,
        /// Mouse button.
        button: u8,
        /// Stack the client believes is on the cursor.
        carried: Stack,
    },
    /// Block interaction intent.
    PlayerAction {
        /// Intent kind.
        action: PlayerActionKind,
        /// Target block.
        pos: BlockPos,
    },
    /// Response to a resource bundle push.
    ResourcePack {
        /// Push id being answered.
        id: String,
        /// Client verdict.
        action: ResourcePackAction,
    },
    /// Hotbar slot change intent.
    SetCarriedItem {
        /// New hotbar slot.
        slot: u16,
    },
    /// Unrecognized frame, forwarded untouched.
    Opaque(OpaqueFrame),
}

impl ClientboundFrame {
    /// Verify frame limits.
    ///
    /// The gateway sits on the server side, but bundles recurse and chunk
    /// payloads are attacker-influenced in proxy deployments, so limits are
    /// checked before any allocation-heavy work.
    pub fn verify(&self) -> Result<(), &'static str> {
        match self {
            ClientboundFrame::ContainerSetContent { items, .. } => {
                if items.len() > MAX_CONTAINER_ITEMS {
                    return Err("Too many container items");
                }
            }
            ClientboundFrame::LevelChunkWithLight { section_data, .. } => {
                if section_data.len() > MAX_SECTION_DATA_LEN {
                    return Err("Section payload too large");
                }
            }
            ClientboundFrame::SystemChat { content, .. } => {
                if chat_depth(content) > MAX_CHAT_DEPTH {
                    return Err("Chat tree too deep");
                }
            }
            ClientboundFrame::Bundle(frames) => {
                for frame in frames {
                    if matches!(frame, ClientboundFrame::Bundle(_)) {
                        return Err("Nested bundles are not allowed");
                    }
                    frame.verify()?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn chat_depth(node: &ChatNode) -> usize {
    1 + node.children.iter().map(chat_depth).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use veilcraft_core::AssetId;

    fn stack(id: &str, count: u32) -> Stack {
        Stack::new(AssetId::parse(id).unwrap(), count)
    }

    #[test]
    fn clientbound_frame_serialization_roundtrips() {
        let frame = ClientboundFrame::ContainerSetSlot {
            container_id: 0,
            state_id: 7,
            slot: 36,
            stack: stack("minecraft:stone", 64),
        };

        let encoded = postcard::to_allocvec(&frame).expect("Failed to encode");
        let decoded: ClientboundFrame = postcard::from_bytes(&encoded).expect("Failed to decode");
        assert_eq!(frame, decoded);
    }

    #[test]
    fn serverbound_frame_serialization_roundtrips() {
        let frame = ServerboundFrame::PlayerAction {
            action: PlayerActionKind::StartDestroyBlock,
            pos: BlockPos::new(1, 64, -7),
        };

        let encoded = postcard::to_allocvec(&frame).expect("Failed to encode");
        let decoded: ServerboundFrame = postcard::from_bytes(&encoded).expect("Failed to decode");
        assert_eq!(frame, decoded);
    }

    #[test]
    fn container_item_limit_is_enforced() {
        let frame = ClientboundFrame::ContainerSetContent {
            container_id: 0,
            state_id: 0,
            items: vec![Stack::empty(); MAX_CONTAINER_ITEMS + 1],
            carried: Stack::empty(),
        };
        assert!(frame.verify().is_err());
    }

    #[test]
    fn nested_bundles_are_rejected() {
        let inner = ClientboundFrame::Bundle(vec![]);
        let frame = ClientboundFrame::Bundle(vec![inner]);
        assert_eq!(frame.verify(), Err("Nested bundles are not allowed"));
    }

    #[test]
    fn deep_chat_is_rejected() {
        let mut node = ChatNode::text("leaf");
        for _ in 0..(MAX_CHAT_DEPTH + 1) {
            node = ChatNode {
                text: String::new(),
                hover: None,
                children: vec![node],
            };
        }
        let frame = ClientboundFrame::SystemChat {
            content: node,
            overlay: false,
        };
        assert_eq!(frame.verify(), Err("Chat tree too deep"));
    }
}
