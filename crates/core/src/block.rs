//! Block state identifiers, positions, and per-block traits.

use crate::asset::AssetId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Numeric block state identifier as used on the wire.
///
/// Every concrete `(block, property values)` combination has exactly one id;
/// the mapping is positional and fixed by the protocol version.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct BlockStateId(pub u32);

/// Integer block position in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Create a block position.
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Named block state property values carried on an item stack.
///
/// Used for placement previews: a stack can pin specific property values that
/// the placed block will receive. Stored sorted for deterministic comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockStateProperties(pub BTreeMap<String, String>);

impl BlockStateProperties {
    /// Build a property map from `(name, value)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// Block traits consulted by break-speed computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTraits {
    /// Asset identifier of the owning block.
    pub asset: AssetId,
    /// Base hardness. Negative means unbreakable.
    pub hardness: f32,
    /// Whether drops require the correct tool.
    pub requires_correct_tool: bool,
}

impl BlockTraits {
    /// Traits for a block that can never be broken (e.g. bedrock).
    pub fn unbreakable(asset: AssetId) -> Self {
        Self {
            asset,
            hardness: -1.0,
            requires_correct_tool: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_compare_order_independent() {
        let a = BlockStateProperties::from_pairs([("up", "true"), ("down", "true")]);
        let b = BlockStateProperties::from_pairs([("down", "true"), ("up", "true")]);
        assert_eq!(a, b);
    }

    #[test]
    fn unbreakable_has_negative_hardness() {
        let traits = BlockTraits::unbreakable(AssetId::parse("minecraft:bedrock").unwrap());
        assert!(traits.hardness < 0.0);
    }
}
