//! Tool components and the block break-speed formula.

use crate::asset::AssetId;
use crate::block::BlockTraits;
use crate::stack::Stack;
use serde::{Deserialize, Serialize};

/// A single tool rule: a block set with optional speed and drop overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRule {
    /// Blocks this rule applies to, by block asset id.
    pub blocks: Vec<AssetId>,
    /// Mining speed when the rule matches. `None` leaves the default speed.
    pub speed: Option<f32>,
    /// Whether matching blocks drop as if mined with the correct tool.
    /// `None` leaves the block's own requirement in force.
    pub correct_for_drops: Option<bool>,
}

impl ToolRule {
    /// Whether this rule applies to the given block.
    pub fn matches(&self, block: &AssetId) -> bool {
        self.blocks.contains(block)
    }
}

/// Tool component on a stack: an ordered rule list plus defaults.
///
/// Rule order matters: the first matching rule wins, as the client evaluates
/// them the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Rules evaluated first-match-wins.
    pub rules: Vec<ToolRule>,
    /// Mining speed when no rule matches.
    pub default_mining_speed: f32,
    /// Durability damage per block broken.
    pub damage_per_block: u32,
    /// Whether the tool breaks blocks in creative mode.
    pub can_destroy_blocks_in_creative: bool,
}

impl Default for Tool {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default_mining_speed: 1.0,
            damage_per_block: 1,
            can_destroy_blocks_in_creative: true,
        }
    }
}

impl Tool {
    /// Mining speed this tool yields against the given block.
    pub fn mining_speed(&self, block: &AssetId) -> f32 {
        for rule in &self.rules {
            if rule.matches(block) {
                if let Some(speed) = rule.speed {
                    return speed;
                }
            }
        }
        self.default_mining_speed
    }

    /// Whether this tool is the correct tool for drops against the block.
    pub fn is_correct_for(&self, block: &AssetId) -> bool {
        for rule in &self.rules {
            if rule.matches(block) {
                if let Some(correct) = rule.correct_for_drops {
                    return correct;
                }
            }
        }
        false
    }
}

/// Per-tick block destroy progress for a stack against a block.
///
/// `speed = toolEfficiency / hardness / divisor`, where the divisor is 30
/// when the held stack counts as the correct tool (or the block does not
/// require one) and 100 otherwise. A result of `0.0` means the block cannot
/// be broken at all. A result `>= 1.0` means it breaks within one tick.
pub fn destroy_speed(traits: &BlockTraits, stack: &Stack) -> f32 {
    if traits.hardness < 0.0 {
        return 0.0;
    }
    if traits.hardness == 0.0 {
        // Instant-break blocks never produce a finite ratio; treat as one tick.
        return 1.0;
    }
    let correct = !traits.requires_correct_tool || stack.is_correct_tool_for(&traits.asset);
    let divisor = if correct { 30.0 } else { 100.0 };
    stack.mining_speed(&traits.asset) / traits.hardness / divisor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockTraits;

    fn block(id: &str) -> AssetId {
        AssetId::parse(id).unwrap()
    }

    fn pickaxe_tool(speed: f32) -> Tool {
        Tool {
            rules: vec![ToolRule {
                blocks: vec![block("minecraft:stone")],
                speed: Some(speed),
                correct_for_drops: Some(true),
            }],
            ..Tool::default()
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        let tool = Tool {
            rules: vec![
                ToolRule {
                    blocks: vec![block("minecraft:stone")],
                    speed: Some(8.0),
                    correct_for_drops: Some(true),
                },
                ToolRule {
                    blocks: vec![block("minecraft:stone")],
                    speed: Some(2.0),
                    correct_for_drops: Some(false),
                },
            ],
            ..Tool::default()
        };
        assert_eq!(tool.mining_speed(&block("minecraft:stone")), 8.0);
        assert!(tool.is_correct_for(&block("minecraft:stone")));
    }

    #[test]
    fn unmatched_block_uses_default_speed() {
        let tool = pickaxe_tool(8.0);
        assert_eq!(tool.mining_speed(&block("minecraft:dirt")), 1.0);
        assert!(!tool.is_correct_for(&block("minecraft:dirt")));
    }

    #[test]
    fn destroy_speed_uses_correct_tool_divisor() {
        let traits = BlockTraits {
            asset: block("minecraft:stone"),
            hardness: 1.5,
            requires_correct_tool: true,
        };
        let mut stack = Stack::new(block("minecraft:iron_pickaxe"), 1);
        stack.components.tool = Some(pickaxe_tool(6.0));

        // Correct tool: 6.0 / 1.5 / 30
        let speed = destroy_speed(&traits, &stack);
        assert!((speed - 6.0 / 1.5 / 30.0).abs() < 1e-6);

        // Bare hand against a correct-tool block: 1.0 / 1.5 / 100
        let hand = Stack::new(block("minecraft:stick"), 1);
        let speed = destroy_speed(&traits, &hand);
        assert!((speed - 1.0 / 1.5 / 100.0).abs() < 1e-6);
    }

    #[test]
    fn destroy_speed_zero_for_unbreakable() {
        let traits = BlockTraits::unbreakable(block("minecraft:bedrock"));
        let stack = Stack::new(block("minecraft:iron_pickaxe"), 1);
        assert_eq!(destroy_speed(&traits, &stack), 0.0);
    }
}
