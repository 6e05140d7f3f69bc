//! The read-only disguise registry.
//!
//! Built once at startup from the asset registration pipeline's output and
//! shared across connections. All lookups are O(1) amortized; an asset not
//! found here is by definition standard and passes through untouched.

use std::collections::{HashMap, HashSet};

use veilcraft_core::{AssetId, BlockStateId, BlockStateProperties, BlockTraits, Stack, Tool};

/// Paths (in the vanilla namespace) of natural assets whose appearance is
/// reused as disguise canvases. They collide with disguise templates, so they
/// are defensively scrubbed even though they carry no registry entry.
const AMBIGUOUS_NATURAL_PATHS: [&str; 3] =
    ["brown_mushroom_block", "red_mushroom_block", "mushroom_stem"];

/// Item asset the neutral (non-active) disguise template is built from.
const NEUTRAL_TEMPLATE_ITEM: &str = "minecraft:filled_map";

/// Whether an asset id is one of the ambiguous natural assets.
pub fn is_ambiguous_natural(id: &AssetId) -> bool {
    id.is_vanilla() && AMBIGUOUS_NATURAL_PATHS.contains(&id.path())
}

/// The ambiguous natural asset ids, in declaration order.
pub fn ambiguous_natural_ids() -> [AssetId; 3] {
    AMBIGUOUS_NATURAL_PATHS.map(|path| AssetId::vanilla(path).expect("static id is valid"))
}

/// Block state property stamp applied to ambiguous natural items so their
/// placement preview renders as a full block on the client.
pub fn full_faces_properties() -> BlockStateProperties {
    BlockStateProperties::from_pairs([
        ("down", "true"),
        ("east", "true"),
        ("north", "true"),
        ("south", "true"),
        ("up", "true"),
        ("west", "true"),
    ])
}

/// The generic neutral disguise template used for non-active slots.
pub fn neutral_template() -> Stack {
    Stack::new(
        AssetId::parse(NEUTRAL_TEMPLATE_ITEM).expect("static id is valid"),
        1,
    )
}

/// Forward disguise entry for a custom item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDisguise {
    /// Visually distinct client template used for the actively held slot.
    pub active_template: Stack,
    /// The custom asset this entry disguises.
    pub custom: AssetId,
}

/// Default component values of an item, used to restore tool and block-state
/// fields when a stack is revealed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemDefaults {
    /// Default tool component, if the item has one.
    pub tool: Option<Tool>,
    /// Default placement block-state component, if the item has one.
    pub block_state: Option<BlockStateProperties>,
}

/// Immutable lookup table mapping custom assets to disguises and back.
///
/// Constructed through [`DisguiseRegistryBuilder`] and injected into the
/// gateway; there is no global state, so tests can run against synthetic
/// registries.
#[derive(Debug, Default)]
pub struct DisguiseRegistry {
    custom_namespace: String,
    items: HashMap<AssetId, ItemDisguise>,
    item_defaults: HashMap<AssetId, ItemDefaults>,
    client_block_states: HashMap<BlockStateId, BlockStateId>,
    server_block_states: HashMap<BlockStateId, BlockStateId>,
    block_traits: HashMap<BlockStateId, BlockTraits>,
    custom_block_assets: HashSet<AssetId>,
}

impl DisguiseRegistry {
    /// Start building a registry for the given custom namespace.
    pub fn builder(custom_namespace: impl Into<String>) -> DisguiseRegistryBuilder {
        DisguiseRegistryBuilder {
            registry: DisguiseRegistry {
                custom_namespace: custom_namespace.into(),
                ..DisguiseRegistry::default()
            },
        }
    }

    /// Namespace custom assets live in (used by chat sanitization).
    pub fn custom_namespace(&self) -> &str {
        &self.custom_namespace
    }

    /// Forward lookup: disguise entry for a custom item asset.
    pub fn lookup_forward(&self, item: &AssetId) -> Option<&ItemDisguise> {
        self.items.get(item)
    }

    /// Reverse lookup: resolve a disguise marker back to the original item's
    /// defaults. `None` means the asset is no longer registered and the
    /// carrying stack must be dropped.
    pub fn resolve_marker(&self, marker: &AssetId) -> Option<&ItemDefaults> {
        if !self.items.contains_key(marker) {
            return None;
        }
        Some(
            self.item_defaults
                .get(marker)
                .unwrap_or(&EMPTY_ITEM_DEFAULTS),
        )
    }

    /// Default components for any item (custom or vanilla), if registered.
    pub fn item_defaults(&self, item: &AssetId) -> Option<&ItemDefaults> {
        self.item_defaults.get(item)
    }

    /// Client-visible block state for a server block state, if it differs.
    pub fn client_block_state(&self, state: BlockStateId) -> Option<BlockStateId> {
        self.client_block_states.get(&state).copied()
    }

    /// Server block state for a client-visible disguise state, if any.
    /// Block identity is positional, so no marker is involved.
    pub fn server_block_state(&self, state: BlockStateId) -> Option<BlockStateId> {
        self.server_block_states.get(&state).copied()
    }

    /// Break-speed traits for a block state.
    pub fn block_traits(&self, state: BlockStateId) -> Option<&BlockTraits> {
        self.block_traits.get(&state)
    }

    /// Whether a block asset must be hidden from client-visible tool rules:
    /// either custom, or one of the ambiguous natural assets.
    pub fn is_hidden_block_asset(&self, asset: &AssetId) -> bool {
        asset.namespace() == self.custom_namespace
            || self.custom_block_assets.contains(asset)
            || is_ambiguous_natural(asset)
    }

    /// Whether a block state belongs to a custom block or an ambiguous
    /// natural block (i.e. the mining reconciler must look at it).
    pub fn needs_break_reconciliation(&self, state: BlockStateId) -> bool {
        if self.client_block_states.contains_key(&state) {
            return true;
        }
        self.block_traits
            .get(&state)
            .is_some_and(|traits| is_ambiguous_natural(&traits.asset))
    }
}

static EMPTY_ITEM_DEFAULTS: ItemDefaults = ItemDefaults {
    tool: None,
    block_state: None,
};

/// Builder for [`DisguiseRegistry`].
#[derive(Debug)]
pub struct DisguiseRegistryBuilder {
    registry: DisguiseRegistry,
}

impl DisguiseRegistryBuilder {
    /// Register a custom item with its active disguise template and its
    /// default components (used for reveal restoration).
    pub fn item(mut self, custom: AssetId, active_template: Stack, defaults: ItemDefaults) -> Self {
        self.registry.item_defaults.insert(custom.clone(), defaults);
        self.registry.items.insert(
            custom.clone(),
            ItemDisguise {
                active_template,
                custom,
            },
        );
        self
    }

    /// Register default components for a standard item, so reveal can
    /// restore scrubbed tool/state fields on it.
    pub fn vanilla_item_defaults(mut self, item: AssetId, defaults: ItemDefaults) -> Self {
        self.registry.item_defaults.insert(item, defaults);
        self
    }

    /// Register a custom block state and its client-visible disguise state.
    pub fn block_state(
        mut self,
        block_asset: AssetId,
        server: BlockStateId,
        client: BlockStateId,
    ) -> Self {
        self.registry.client_block_states.insert(server, client);
        self.registry.server_block_states.insert(client, server);
        self.registry.custom_block_assets.insert(block_asset);
        self
    }

    /// Register break-speed traits for a block state.
    pub fn block_traits(mut self, state: BlockStateId, traits: BlockTraits) -> Self {
        self.registry.block_traits.insert(state, traits);
        self
    }

    /// Finish building. The result is immutable; publish it (e.g. behind an
    /// `Arc`) before accepting the first connection.
    pub fn build(self) -> DisguiseRegistry {
        self.registry
    }
}
