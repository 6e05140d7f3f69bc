//! The bidirectional packet transform dispatcher.
//!
//! One [`Gateway`] per connection. Every frame in either direction passes
//! through it exactly once, in arrival order; it consults the shared
//! registry, updates its own session state, and hands back the frame to
//! forward (possibly replaced, possibly suppressed) plus any corrective
//! frames to send to the client. Emitted frames are final: they are sent
//! as-is and do not re-enter the dispatcher.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::config::GatewayConfig;
use crate::host::{ClientKindDetector, PlayerView};
use crate::mining::{clear_break_correction, start_break_correction, BreakCorrection};
use crate::protocol::{
    ClientboundFrame, ConnectionId, EntityDataField, ParticleOption, PlayerActionKind,
    ResourcePackAction, ServerboundFrame, LEVEL_EVENT_BLOCK_BREAK, LEVEL_EVENT_BRUSH_FINISH,
};
use crate::section::{decode_sections, encode_sections, SectionCodecError};
use crate::session::{ClientKind, ConnectionSession, HandshakePhase};
use veilcraft_core::{BlockStateId, Stack};
use veilcraft_disguise::{
    disguise_stack, reveal_stack, sanitize_chat, DisguiseRegistry, Reveal,
};

/// Errors that close the connection.
///
/// Everything recoverable is handled inside the transforms (dropped stacks,
/// pass-throughs); an error at this level means forwarding would risk a
/// desynchronized or corrupted client, so the host must disconnect.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A chunk section failed to parse; partial reconstruction is unsafe.
    #[error("section codec failure: {0}")]
    Section(#[from] SectionCodecError),
    /// A frame exceeded protocol limits.
    #[error("frame limit violated: {0}")]
    FrameLimit(&'static str),
    /// A resource bundle push went unacknowledged for too long while a
    /// suppressed frame was held back.
    #[error("resource bundle acknowledgment timed out after {0:?}")]
    HandshakeTimeout(Duration),
}

/// Result of dispatching one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed<F> {
    /// Frame to forward in the original direction. `None` means the frame
    /// was consumed and nothing is forwarded in its place.
    pub frame: Option<F>,
    /// Corrective frames to send to the client, in order, after `frame`.
    pub emit: Vec<ClientboundFrame>,
}

impl<F> Transformed<F> {
    fn forward(frame: F) -> Self {
        Self {
            frame: Some(frame),
            emit: Vec::new(),
        }
    }

    fn suppress() -> Self {
        Self {
            frame: None,
            emit: Vec::new(),
        }
    }
}

/// Per-connection bidirectional frame transformer.
pub struct Gateway {
    registry: Arc<DisguiseRegistry>,
    config: GatewayConfig,
    detector: Arc<dyn ClientKindDetector>,
    connection: ConnectionId,
    session: ConnectionSession,
}

impl Gateway {
    /// Create the gateway for a freshly established connection.
    pub fn new(
        registry: Arc<DisguiseRegistry>,
        config: GatewayConfig,
        detector: Arc<dyn ClientKindDetector>,
        connection: ConnectionId,
    ) -> Self {
        Self {
            registry,
            config,
            detector,
            connection,
            session: ConnectionSession::new(),
        }
    }

    /// Session state, for host-side inspection.
    pub fn session(&self) -> &ConnectionSession {
        &self.session
    }

    /// Record that the resource bundle distributor pushed a bundle to this
    /// connection out-of-band.
    pub fn note_bundle_pushed(&mut self) {
        if !self.session.begin_bundle_push(Instant::now(), false) {
            warn!(connection = self.connection.0, "bundle push while already awaiting ack; ignored");
        }
    }

    /// Transform a frame flowing client → server.
    pub fn on_inbound(
        &mut self,
        frame: ServerboundFrame,
        player: Option<&dyn PlayerView>,
    ) -> Result<Transformed<ServerboundFrame>, GatewayError> {
        self.check_handshake_deadline()?;
        if self.client_kind() == ClientKind::Alternate {
            return Ok(Transformed::forward(frame));
        }
        self.transform_inbound(frame, player)
    }

    /// Transform a frame flowing server → client.
    pub fn on_outbound(
        &mut self,
        frame: ClientboundFrame,
        player: Option<&dyn PlayerView>,
    ) -> Result<Transformed<ClientboundFrame>, GatewayError> {
        self.check_handshake_deadline()?;
        frame.verify().map_err(GatewayError::FrameLimit)?;
        if self.client_kind() == ClientKind::Alternate {
            return Ok(Transformed::forward(frame));
        }
        self.transform_outbound(frame, player)
    }

    fn transform_inbound(
        &mut self,
        frame: ServerboundFrame,
        player: Option<&dyn PlayerView>,
    ) -> Result<Transformed<ServerboundFrame>, GatewayError> {
        let transformed = match frame {
            ServerboundFrame::SetCreativeModeSlot { slot, stack } => {
                Transformed::forward(ServerboundFrame::SetCreativeModeSlot {
                    slot,
                    stack: self.reveal_or_drop(stack),
                })
            }
            ServerboundFrame::ContainerClick {
                container_id,
                state_id,
                slot,
                button,
                carried,
            } => Transformed::forward(ServerboundFrame::ContainerClick {
                container_id,
                state_id,
                slot,
                button,
                carried: self.reveal_or_drop(carried),
            }),
            ServerboundFrame::PlayerAction { action, pos } => {
                let mut out = Transformed::forward(ServerboundFrame::PlayerAction { action, pos });
                if let Some(player) = player {
                    match action {
                        PlayerActionKind::StartDestroyBlock => {
                            match start_break_correction(&self.registry, player, pos) {
                                Some(BreakCorrection::InstantBreak(state)) => {
                                    out.emit.push(ClientboundFrame::LevelEvent {
                                        event: LEVEL_EVENT_BLOCK_BREAK,
                                        pos,
                                        data: state.0,
                                        global: false,
                                    });
                                }
                                Some(BreakCorrection::Override(update)) => {
                                    out.emit.push(ClientboundFrame::UpdateAttributes {
                                        entity: player.entity_id(),
                                        attributes: vec![update],
                                    });
                                }
                                None => {}
                            }
                        }
                        PlayerActionKind::AbortDestroyBlock
                        | PlayerActionKind::StopDestroyBlock => {
                            if let Some(update) =
                                clear_break_correction(&self.registry, player, pos)
                            {
                                out.emit.push(ClientboundFrame::UpdateAttributes {
                                    entity: player.entity_id(),
                                    attributes: vec![update],
                                });
                            }
                        }
                        PlayerActionKind::Other(_) => {}
                    }
                }
                out
            }
            ServerboundFrame::ResourcePack { id, action } => {
                let mut out = Transformed::forward(ServerboundFrame::ResourcePack {
                    id,
                    action,
                });
                if action == ResourcePackAction::SuccessfullyLoaded
                    && self.session.acknowledge_bundle()
                {
                    out.emit.push(ClientboundFrame::FinishConfiguration);
                }
                out
            }
            ServerboundFrame::SetCarriedItem { slot } => {
                let mut out = Transformed::forward(ServerboundFrame::SetCarriedItem { slot });
                if let Some(player) = player {
                    if !player.is_immobile() && slot < player.container_size() {
                        let new_slot = slot as u8;
                        out.emit = self.hotbar_corrections(player, new_slot);
                        self.session.last_hotbar_slot = new_slot;
                    }
                }
                out
            }
            other @ ServerboundFrame::Opaque(_) => Transformed::forward(other),
        };
        Ok(transformed)
    }

    fn transform_outbound(
        &mut self,
        frame: ClientboundFrame,
        player: Option<&dyn PlayerView>,
    ) -> Result<Transformed<ClientboundFrame>, GatewayError> {
        let transformed = match frame {
            ClientboundFrame::SetPlayerInventory { slot, stack } => {
                let held = player.is_some_and(|p| slot == u16::from(p.selected_slot()));
                let stack = self.disguise_or_keep(stack, held);
                Transformed::forward(ClientboundFrame::SetPlayerInventory { slot, stack })
            }
            ClientboundFrame::BlockUpdate { pos, state } => {
                Transformed::forward(ClientboundFrame::BlockUpdate {
                    pos,
                    state: self.client_state(state),
                })
            }
            ClientboundFrame::SectionBlocksUpdate { mut updates } => {
                for update in &mut updates {
                    update.state = self.client_state(update.state);
                }
                Transformed::forward(ClientboundFrame::SectionBlocksUpdate { updates })
            }
            ClientboundFrame::LevelChunkWithLight {
                chunk_x,
                chunk_z,
                section_count,
                section_data,
            } => {
                let mut sections = decode_sections(&section_data, section_count as usize)
                    .inspect_err(|err| {
                        error!(
                            connection = self.connection.0,
                            chunk_x, chunk_z, %err,
                            "chunk section decode failed; closing connection"
                        );
                    })?;
                let registry = &self.registry;
                let mut changed = false;
                for section in &mut sections {
                    changed |= section.map_states(|state| registry.client_block_state(state));
                }
                // Untouched chunks keep their original bytes.
                let section_data = if changed {
                    encode_sections(&sections)
                } else {
                    section_data
                };
                Transformed::forward(ClientboundFrame::LevelChunkWithLight {
                    chunk_x,
                    chunk_z,
                    section_count,
                    section_data,
                })
            }
            ClientboundFrame::ContainerSetContent {
                container_id,
                state_id,
                mut items,
                carried,
            } => {
                for (index, item) in items.iter_mut().enumerate() {
                    // Container 0 is the player inventory; hotbar slots sit
                    // at window offset 36, so index-36 addresses the hotbar.
                    let held = player.is_some_and(|p| {
                        container_id == 0
                            && index as i32 - 36 == i32::from(p.selected_slot())
                    });
                    if let Some(new) = disguise_stack(&self.registry, item, held) {
                        *item = new;
                    }
                }
                let carried = self.disguise_or_keep(carried, false);
                Transformed::forward(ClientboundFrame::ContainerSetContent {
                    container_id,
                    state_id,
                    items,
                    carried,
                })
            }
            ClientboundFrame::ContainerSetSlot {
                container_id,
                state_id,
                slot,
                stack,
            } => {
                let held = player.is_some_and(|p| {
                    container_id == 0 && i32::from(slot) - 36 == i32::from(p.selected_slot())
                });
                let stack = self.disguise_or_keep(stack, held);
                Transformed::forward(ClientboundFrame::ContainerSetSlot {
                    container_id,
                    state_id,
                    slot,
                    stack,
                })
            }
            ClientboundFrame::SetEquipment { entity, mut slots } => {
                for (_, stack) in &mut slots {
                    if let Some(new) = disguise_stack(&self.registry, stack, false) {
                        *stack = new;
                    }
                }
                Transformed::forward(ClientboundFrame::SetEquipment { entity, slots })
            }
            ClientboundFrame::SetCursorItem { stack } => {
                let stack = self.disguise_or_keep(stack, false);
                Transformed::forward(ClientboundFrame::SetCursorItem { stack })
            }
            ClientboundFrame::SystemChat { content, overlay } => {
                let content = sanitize_chat(&self.registry, &content).unwrap_or(content);
                Transformed::forward(ClientboundFrame::SystemChat { content, overlay })
            }
            ClientboundFrame::SetEntityData { entity, mut values } => {
                for value in &mut values {
                    match &mut value.value {
                        EntityDataField::Stack(stack) => {
                            if let Some(new) = disguise_stack(&self.registry, stack, false) {
                                *stack = new;
                            }
                        }
                        EntityDataField::BlockState(state) => {
                            *state = self.client_state(*state);
                        }
                        EntityDataField::Raw(_) => {}
                    }
                }
                Transformed::forward(ClientboundFrame::SetEntityData { entity, values })
            }
            ClientboundFrame::LevelParticles {
                mut particle,
                x,
                y,
                z,
                count,
            } => {
                match &mut particle {
                    ParticleOption::Item { stack, .. } => {
                        if let Some(new) = disguise_stack(&self.registry, stack, false) {
                            *stack = new;
                        }
                    }
                    ParticleOption::Block { state, .. } => {
                        *state = self.client_state(*state);
                    }
                    ParticleOption::Other { .. } => {}
                }
                Transformed::forward(ClientboundFrame::LevelParticles {
                    particle,
                    x,
                    y,
                    z,
                    count,
                })
            }
            ClientboundFrame::LevelEvent {
                event,
                pos,
                data,
                global,
            } => {
                let data = if event == LEVEL_EVENT_BLOCK_BREAK || event == LEVEL_EVENT_BRUSH_FINISH
                {
                    self.client_state(BlockStateId(data)).0
                } else {
                    data
                };
                Transformed::forward(ClientboundFrame::LevelEvent {
                    event,
                    pos,
                    data,
                    global,
                })
            }
            ClientboundFrame::Bundle(frames) => {
                let mut out = Vec::with_capacity(frames.len());
                let mut emit = Vec::new();
                for sub in frames {
                    let transformed = self.transform_outbound(sub, player)?;
                    if let Some(frame) = transformed.frame {
                        out.push(frame);
                    }
                    emit.extend(transformed.emit);
                }
                Transformed {
                    frame: Some(ClientboundFrame::Bundle(out)),
                    emit,
                }
            }
            ClientboundFrame::FinishConfiguration => self.handle_finish_configuration(),
            ClientboundFrame::ResourcePackPush {
                id,
                url,
                hash,
                required,
                prompt,
            } => {
                if self.session.begin_bundle_push(Instant::now(), false) {
                    Transformed::forward(ClientboundFrame::ResourcePackPush {
                        id,
                        url,
                        hash,
                        required,
                        prompt,
                    })
                } else {
                    warn!(
                        connection = self.connection.0,
                        "second bundle push while awaiting ack; suppressed"
                    );
                    Transformed::suppress()
                }
            }
            ClientboundFrame::SetHeldSlot { slot } => {
                let mut out = Transformed::forward(ClientboundFrame::SetHeldSlot { slot });
                if let Some(player) = player {
                    out.emit = self.hotbar_corrections(player, slot);
                    self.session.last_hotbar_slot = slot;
                }
                out
            }
            other @ (ClientboundFrame::UpdateAttributes { .. } | ClientboundFrame::Opaque(_)) => {
                Transformed::forward(other)
            }
        };
        Ok(transformed)
    }

    /// Replace a configuration-finished signal with the bundle push, hold it
    /// while awaiting acknowledgment, and pass it through otherwise.
    fn handle_finish_configuration(&mut self) -> Transformed<ClientboundFrame> {
        if let HandshakePhase::AwaitingAck { .. } = self.session.handshake() {
            if self.session.suppress_finish() {
                return Transformed::suppress();
            }
            return Transformed::forward(ClientboundFrame::FinishConfiguration);
        }
        let Some(bundle) = self.config.resource_bundle.clone() else {
            return Transformed::forward(ClientboundFrame::FinishConfiguration);
        };
        // The finish signal is consumed by the replacement and owed to the
        // client once the push is acknowledged.
        self.session.begin_bundle_push(Instant::now(), true);
        Transformed::forward(ClientboundFrame::ResourcePackPush {
            id: bundle.id,
            url: bundle.url,
            hash: bundle.hash,
            required: bundle.required,
            prompt: bundle.prompt,
        })
    }

    /// Corrective inventory frames for a hotbar slot change.
    ///
    /// The previously active slot falls back to its neutral disguise, the
    /// newly active one gets the full representation, so exactly one slot
    /// shows the active visual at a time.
    fn hotbar_corrections(
        &self,
        player: &dyn PlayerView,
        new_slot: u8,
    ) -> Vec<ClientboundFrame> {
        let old_slot = self.session.last_hotbar_slot;
        if old_slot == new_slot {
            return Vec::new();
        }
        let mut emit = Vec::new();
        let old_stack = player.stack_in_slot(u16::from(old_slot));
        if let Some(stack) = disguise_stack(&self.registry, &old_stack, false) {
            emit.push(ClientboundFrame::SetPlayerInventory {
                slot: u16::from(old_slot),
                stack,
            });
        }
        let new_stack = player.stack_in_slot(u16::from(new_slot));
        if let Some(stack) = disguise_stack(&self.registry, &new_stack, true) {
            emit.push(ClientboundFrame::SetPlayerInventory {
                slot: u16::from(new_slot),
                stack,
            });
        }
        emit
    }

    fn disguise_or_keep(&self, stack: Stack, full_representation: bool) -> Stack {
        disguise_stack(&self.registry, &stack, full_representation).unwrap_or(stack)
    }

    fn reveal_or_drop(&self, stack: Stack) -> Stack {
        match reveal_stack(&self.registry, &stack) {
            Reveal::Unchanged => stack,
            Reveal::Replaced(new) => new,
            Reveal::Dropped => Stack::empty(),
        }
    }

    fn client_state(&self, state: BlockStateId) -> BlockStateId {
        self.registry.client_block_state(state).unwrap_or(state)
    }

    fn client_kind(&mut self) -> ClientKind {
        if let Some(kind) = self.session.client_kind() {
            return kind;
        }
        match self.detector.detect(self.connection) {
            Some(kind) => {
                if kind == ClientKind::Alternate {
                    info!(connection = self.connection.0, "alternate client detected");
                }
                self.session.set_client_kind(kind);
                kind
            }
            // Unknown yet: disguise defensively, retry on a later frame.
            None => ClientKind::Standard,
        }
    }

    fn check_handshake_deadline(&self) -> Result<(), GatewayError> {
        if let Some(elapsed) = self.session.awaiting_for(Instant::now()) {
            if elapsed > self.config.handshake_timeout() {
                return Err(GatewayError::HandshakeTimeout(elapsed));
            }
        }
        Ok(())
    }
}
