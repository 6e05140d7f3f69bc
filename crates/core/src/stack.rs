//! Item stacks and their typed component bag.

use crate::asset::AssetId;
use crate::block::BlockStateProperties;
use crate::tool::Tool;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Asset id used for the empty stack.
pub const AIR: &str = "minecraft:air";

/// Typed, open-ended component bag attached to a stack.
///
/// Components the disguise layer needs to read or rewrite get typed fields;
/// anything else rides along untouched in `extra`. The disguise marker is a
/// first-class optional field rather than a string side channel, so its
/// presence can be checked without parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StackComponents {
    /// Hidden marker recording the true asset id of a disguised stack.
    /// Absent means "not disguised".
    pub disguise_marker: Option<AssetId>,
    /// Tool behavior (mining rules).
    pub tool: Option<Tool>,
    /// Block state property values pinned for placement.
    pub block_state: Option<BlockStateProperties>,
    /// Repair ingredient set, by item asset id.
    pub repairable: Option<Vec<AssetId>>,
    /// Map tint color, filled in client-side for map-like items.
    pub map_color: Option<u32>,
    /// Map decoration markers, filled in client-side for map-like items.
    pub map_decorations: Option<Vec<String>>,
    /// Components this layer does not interpret, keyed by component id.
    pub extra: BTreeMap<String, String>,
}

impl StackComponents {
    /// Whether no component is present at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay `other` onto `self`: components present in `other` win,
    /// everything else is kept. Mirrors applying a source stack's components
    /// on top of a template.
    pub fn apply(&mut self, other: &StackComponents) {
        if let Some(marker) = &other.disguise_marker {
            self.disguise_marker = Some(marker.clone());
        }
        if let Some(tool) = &other.tool {
            self.tool = Some(tool.clone());
        }
        if let Some(state) = &other.block_state {
            self.block_state = Some(state.clone());
        }
        if let Some(repairable) = &other.repairable {
            self.repairable = Some(repairable.clone());
        }
        if let Some(color) = other.map_color {
            self.map_color = Some(color);
        }
        if let Some(decorations) = &other.map_decorations {
            self.map_decorations = Some(decorations.clone());
        }
        for (key, value) in &other.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// A quantity of an asset plus its components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    /// Item asset id.
    pub item: AssetId,
    /// Stack size. Zero means empty.
    pub count: u32,
    /// Attached components.
    pub components: StackComponents,
}

impl Stack {
    /// Create a stack with default components.
    pub fn new(item: AssetId, count: u32) -> Self {
        Self {
            item,
            count,
            components: StackComponents::default(),
        }
    }

    /// The empty stack.
    pub fn empty() -> Self {
        Self::new(AssetId::parse(AIR).expect("air id is valid"), 0)
    }

    /// Whether this stack is empty (air or zero count).
    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.item.to_string() == AIR
    }

    /// Mining speed of this stack against a block, 1.0 without a tool.
    pub fn mining_speed(&self, block: &AssetId) -> f32 {
        match &self.components.tool {
            Some(tool) => tool.mining_speed(block),
            None => 1.0,
        }
    }

    /// Whether this stack is the correct tool for drops against a block.
    pub fn is_correct_tool_for(&self, block: &AssetId) -> bool {
        match &self.components.tool {
            Some(tool) => tool.is_correct_for(block),
            None => false,
        }
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stack_is_empty() {
        assert!(Stack::empty().is_empty());
        let zero = Stack::new(AssetId::parse("minecraft:stone").unwrap(), 0);
        assert!(zero.is_empty());
        let one = Stack::new(AssetId::parse("minecraft:stone").unwrap(), 1);
        assert!(!one.is_empty());
    }

    #[test]
    fn apply_overlays_present_components_only() {
        let mut base = StackComponents {
            map_color: Some(7),
            ..StackComponents::default()
        };
        base.extra.insert("existing".into(), "1".into());

        let mut overlay = StackComponents::default();
        overlay.disguise_marker = Some(AssetId::parse("veilcraft:gem").unwrap());
        overlay.extra.insert("added".into(), "2".into());

        base.apply(&overlay);
        assert_eq!(base.map_color, Some(7));
        assert_eq!(
            base.disguise_marker,
            Some(AssetId::parse("veilcraft:gem").unwrap())
        );
        assert_eq!(base.extra.len(), 2);
    }

    #[test]
    fn mining_speed_defaults_without_tool() {
        let stack = Stack::new(AssetId::parse("minecraft:stick").unwrap(), 1);
        assert_eq!(
            stack.mining_speed(&AssetId::parse("minecraft:stone").unwrap()),
            1.0
        );
        assert!(!stack.is_correct_tool_for(&AssetId::parse("minecraft:stone").unwrap()));
    }
}
