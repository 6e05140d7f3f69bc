//! Chat tree sanitization.
//!
//! Chat payloads are trees of styled text nodes. A node can carry interactive
//! hover metadata referencing an item by asset id; standard clients terminate
//! the connection on an id they cannot resolve, so hovers referencing custom
//! assets are stripped. Traversal is total and order-preserving: no node is
//! ever dropped, only its metadata removed.

use serde::{Deserialize, Serialize};

use crate::registry::DisguiseRegistry;
use veilcraft_core::AssetId;

/// Interactive hover metadata on a chat node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HoverEvent {
    /// Item preview, by item asset id.
    ShowItem {
        /// Previewed item.
        id: AssetId,
    },
    /// Plain text tooltip.
    ShowText {
        /// Tooltip text.
        text: String,
    },
}

/// A node in a chat message tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChatNode {
    /// Literal text content.
    pub text: String,
    /// Optional interactive metadata.
    pub hover: Option<HoverEvent>,
    /// Child nodes, rendered in order after this node's text.
    pub children: Vec<ChatNode>,
}

impl ChatNode {
    /// A plain text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Strip hover metadata referencing custom assets, recursively.
///
/// Returns `Some(rewritten)` only when at least one hover was removed, so
/// untouched messages forward without reallocation.
pub fn sanitize_chat(registry: &DisguiseRegistry, node: &ChatNode) -> Option<ChatNode> {
    let mut out = node.clone();
    if sanitize_in_place(registry, &mut out) {
        Some(out)
    } else {
        None
    }
}

fn sanitize_in_place(registry: &DisguiseRegistry, node: &mut ChatNode) -> bool {
    let mut changed = false;
    if let Some(HoverEvent::ShowItem { id }) = &node.hover {
        if id.namespace() == registry.custom_namespace() {
            node.hover = None;
            changed = true;
        }
    }
    for child in &mut node.children {
        changed |= sanitize_in_place(registry, child);
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> DisguiseRegistry {
        DisguiseRegistry::builder("veilcraft").build()
    }

    fn custom_hover() -> Option<HoverEvent> {
        Some(HoverEvent::ShowItem {
            id: AssetId::parse("veilcraft:ruby_pickaxe").unwrap(),
        })
    }

    #[test]
    fn plain_tree_passes_through() {
        let node = ChatNode {
            text: "hello".into(),
            hover: None,
            children: vec![ChatNode::text("world")],
        };
        assert_eq!(sanitize_chat(&registry(), &node), None);
    }

    #[test]
    fn vanilla_hover_is_kept() {
        let node = ChatNode {
            text: "look".into(),
            hover: Some(HoverEvent::ShowItem {
                id: AssetId::parse("minecraft:diamond").unwrap(),
            }),
            children: vec![],
        };
        assert_eq!(sanitize_chat(&registry(), &node), None);
    }

    #[test]
    fn nested_custom_hover_is_stripped_in_place() {
        let node = ChatNode {
            text: "you got ".into(),
            hover: None,
            children: vec![
                ChatNode::text("a "),
                ChatNode {
                    text: "[Ruby Pickaxe]".into(),
                    hover: custom_hover(),
                    children: vec![ChatNode::text("!")],
                },
                ChatNode::text(" today"),
            ],
        };

        let sanitized = sanitize_chat(&registry(), &node).expect("hover must be stripped");
        // Structure and text are untouched.
        assert_eq!(sanitized.text, node.text);
        assert_eq!(sanitized.children.len(), 3);
        assert_eq!(sanitized.children[0], node.children[0]);
        assert_eq!(sanitized.children[2], node.children[2]);
        assert_eq!(sanitized.children[1].text, "[Ruby Pickaxe]");
        assert_eq!(sanitized.children[1].children, node.children[1].children);
        // Only the hover is gone.
        assert_eq!(sanitized.children[1].hover, None);
    }

    #[test]
    fn text_hover_is_never_touched() {
        let node = ChatNode {
            text: "tip".into(),
            hover: Some(HoverEvent::ShowText {
                text: "veilcraft:ruby_pickaxe".into(),
            }),
            children: vec![],
        };
        assert_eq!(sanitize_chat(&registry(), &node), None);
    }
}
