//! Pure forward/reverse stack substitution.
//!
//! Forward: replace a custom stack by its disguise template, stamping the
//! hidden marker. Reverse: restore the original stack from the marker.
//! Both are copy-on-write: callers get `None`/`Unchanged` when the input
//! needs no rewrite and must forward the original value then.

use tracing::warn;

use crate::registry::{
    ambiguous_natural_ids, full_faces_properties, is_ambiguous_natural, neutral_template,
    DisguiseRegistry,
};
use veilcraft_core::{Stack, Tool, ToolRule};

/// Mining speed of the synthetic rule appended to client-visible tools.
///
/// Deliberately slow: the client must never predict an instant break on a
/// disguise-canvas block, because the server-side block behind it may be
/// much harder.
pub const SYNTHETIC_RULE_SPEED: f32 = 0.01;

/// Outcome of a reverse substitution.
#[derive(Debug, Clone, PartialEq)]
pub enum Reveal {
    /// No rewrite needed; forward the original stack.
    Unchanged,
    /// Forward the rewritten stack instead.
    Replaced(Stack),
    /// The marker no longer resolves; drop the stack (replace with empty)
    /// rather than propagate an unrepresentable reference.
    Dropped,
}

/// Forward transform: disguise a stack for a standard client.
///
/// Returns `Some` only when something changed, so untouched frames can be
/// forwarded as-is. With `full_representation` the visually distinct active
/// template is used (for the held slot); otherwise the neutral template.
///
/// The transform is idempotent: applying it to its own output changes
/// nothing and yields `None`.
pub fn disguise_stack(
    registry: &DisguiseRegistry,
    stack: &Stack,
    full_representation: bool,
) -> Option<Stack> {
    if stack.is_empty() {
        return None;
    }

    let mut out = stack.clone();

    // Ambiguous natural items collide with disguise templates: stamp the
    // full-faces placement state so they render like the real block. The
    // marker guard keeps already-disguised stacks out of this branch.
    if is_ambiguous_natural(&out.item) && out.components.disguise_marker.is_none() {
        out.components.block_state = Some(full_faces_properties());
    }

    if let Some(entry) = registry.lookup_forward(&stack.item) {
        let mut built = if full_representation {
            entry.active_template.clone()
        } else {
            neutral_template()
        };
        built.count = stack.count;
        built.components.apply(&stack.components);
        built.components.disguise_marker = Some(stack.item.clone());
        // Repair eligibility leaks server-only semantics of the template item.
        built.components.repairable = None;
        out = built;
    }

    // Any stack that reaches the client with a tool component, and any stack
    // we rewrote, gets its rules scrubbed: references to hidden blocks are
    // filtered out and a slow catch-all rule over the disguise canvases is
    // appended so the client always predicts a slow break on them.
    if out.components.tool.is_some() || out != *stack {
        let tool = out.components.tool.take().unwrap_or_default();
        out.components.tool = Some(rewrite_tool(registry, tool));
    }

    if out == *stack {
        None
    } else {
        Some(out)
    }
}

/// Reverse transform: restore a stack received from a standard client.
pub fn reveal_stack(registry: &DisguiseRegistry, stack: &Stack) -> Reveal {
    if stack.is_empty() {
        return Reveal::Unchanged;
    }

    if let Some(marker) = stack.components.disguise_marker.clone() {
        let Some(defaults) = registry.resolve_marker(&marker) else {
            warn!(asset = %marker, "dropping stack with unresolvable disguise marker");
            return Reveal::Dropped;
        };
        let mut out = Stack::new(marker, stack.count);
        out.components = stack.components.clone();
        out.components.disguise_marker = None;
        // Map rendering metadata is generated client-side for the disguise
        // template and means nothing to the original item.
        out.components.map_color = None;
        out.components.map_decorations = None;
        out.components.tool = defaults.tool.clone();
        out.components.block_state = defaults.block_state.clone();
        return Reveal::Replaced(out);
    }

    // No marker: the stack may still carry synthetic tool/state overrides
    // from a defensive scrub. Restore the item's own defaults.
    let mut out = stack.clone();
    let defaults = registry.item_defaults(&out.item);
    if out.components.tool.is_some() {
        out.components.tool = defaults.and_then(|d| d.tool.clone());
    }
    if out.components.block_state.as_ref() == Some(&full_faces_properties()) {
        out.components.block_state = defaults.and_then(|d| d.block_state.clone());
    }
    if out == *stack {
        Reveal::Unchanged
    } else {
        Reveal::Replaced(out)
    }
}

/// Scrub a tool component for client eyes.
///
/// Rules lose references to hidden (custom or ambiguous) blocks; rules left
/// with no blocks are dropped entirely, which also makes repeated scrubbing
/// converge. The synthetic slow rule over the disguise canvases goes last so
/// earlier, more specific rules still win.
fn rewrite_tool(registry: &DisguiseRegistry, tool: Tool) -> Tool {
    let mut rules: Vec<ToolRule> = Vec::with_capacity(tool.rules.len() + 1);
    for mut rule in tool.rules {
        rule.blocks
            .retain(|block| !registry.is_hidden_block_asset(block));
        if !rule.blocks.is_empty() {
            rules.push(rule);
        }
    }
    rules.push(ToolRule {
        blocks: ambiguous_natural_ids().to_vec(),
        speed: Some(SYNTHETIC_RULE_SPEED),
        correct_for_drops: None,
    });
    Tool { rules, ..tool }
}
