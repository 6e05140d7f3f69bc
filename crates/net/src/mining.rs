//! Mining-speed reconciliation.
//!
//! A standard client predicts block-break progress from what it can see: the
//! disguise block state and the disguised held stack. The server computes
//! progress from the true state and stack. When the two speeds diverge, the
//! client's predicted completion drifts from server authority, so the
//! gateway pushes a transient break-speed attribute override scaled by the
//! divergence, and clears it again when breaking stops.

use tracing::debug;

use crate::host::PlayerView;
use crate::protocol::{AttributeId, AttributeUpdate};
use veilcraft_core::{destroy_speed, BlockPos, GameMode};
use veilcraft_disguise::{disguise_stack, DisguiseRegistry};

/// Correction the gateway must send for a start-break observation.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakCorrection {
    /// The server breaks the block within one tick; send the break event
    /// directly instead of an attribute override. Carries the client-visible
    /// state id for the event payload.
    InstantBreak(veilcraft_core::BlockStateId),
    /// Push a scaled break-speed attribute so the client's prediction lands
    /// on the server's completion time.
    Override(AttributeUpdate),
}

/// Ratio between true and client-visible break speed.
///
/// `None` when the client cannot break the block at all: its prediction
/// never completes, so there is nothing to reconcile.
pub fn speed_ratio(server_speed: f32, client_speed: f32) -> Option<f32> {
    if client_speed == 0.0 {
        return None;
    }
    Some(server_speed / client_speed)
}

/// Compute the correction for a start-break action, if any.
///
/// Only survival-mode players on custom or disguise-ambiguous blocks get
/// corrections; everything else breaks consistently without help.
pub fn start_break_correction(
    registry: &DisguiseRegistry,
    player: &dyn PlayerView,
    pos: BlockPos,
) -> Option<BreakCorrection> {
    if player.game_mode() != GameMode::Survival {
        return None;
    }
    let state = player.block_state_at(pos);
    if !registry.needs_break_reconciliation(state) {
        return None;
    }
    let true_traits = registry.block_traits(state)?;
    let true_stack = player.stack_in_slot(u16::from(player.selected_slot()));
    let server_speed = destroy_speed(true_traits, &true_stack);
    let client_state = registry.client_block_state(state).unwrap_or(state);
    if server_speed >= 1.0 {
        return Some(BreakCorrection::InstantBreak(client_state));
    }

    let client_traits = registry.block_traits(client_state).unwrap_or(true_traits);
    let client_stack = disguise_stack(registry, &true_stack, false).unwrap_or(true_stack);
    let client_speed = destroy_speed(client_traits, &client_stack);

    let ratio = speed_ratio(server_speed, client_speed)?;
    if ratio == 1.0 {
        return None;
    }
    debug!(?pos, server_speed, client_speed, ratio, "break speed divergence");
    Some(BreakCorrection::Override(AttributeUpdate {
        attribute: AttributeId::BlockBreakSpeed,
        base: f64::from(ratio) * player.break_speed_base(),
    }))
}

/// Correction for an abort/stop-break action: re-send the unmodified
/// attribute so any outstanding override is cleared.
pub fn clear_break_correction(
    registry: &DisguiseRegistry,
    player: &dyn PlayerView,
    pos: BlockPos,
) -> Option<AttributeUpdate> {
    if player.game_mode() != GameMode::Survival {
        return None;
    }
    let state = player.block_state_at(pos);
    if !registry.needs_break_reconciliation(state) {
        return None;
    }
    Some(AttributeUpdate {
        attribute: AttributeId::BlockBreakSpeed,
        base: player.break_speed_base(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_doubles_when_server_is_twice_as_fast() {
        assert_eq!(speed_ratio(2.0, 1.0), Some(2.0));
    }

    #[test]
    fn zero_client_speed_yields_no_correction() {
        assert_eq!(speed_ratio(2.0, 0.0), None);
        assert_eq!(speed_ratio(0.0, 0.0), None);
    }

    #[test]
    fn equal_speeds_keep_ratio_one() {
        assert_eq!(speed_ratio(0.5, 0.5), Some(1.0));
    }
}
