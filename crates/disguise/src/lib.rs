#![warn(missing_docs)]
//! Disguise registry and pure substitution transforms.
//!
//! Custom assets cannot appear on the wire to standard clients. This crate
//! holds the read-only mapping from custom asset ids to their standard
//! "disguise" representations, and the pure transforms that rewrite stacks,
//! block states, and chat trees in both directions. Nothing here does I/O;
//! the wire layer in `veilcraft-net` drives these transforms per frame.

pub mod chat;
pub mod registry;
pub mod substitute;

pub use chat::{sanitize_chat, ChatNode, HoverEvent};
pub use registry::{
    ambiguous_natural_ids, full_faces_properties, is_ambiguous_natural, neutral_template,
    DisguiseRegistry, DisguiseRegistryBuilder, ItemDefaults, ItemDisguise,
};
pub use substitute::{disguise_stack, reveal_stack, Reveal, SYNTHETIC_RULE_SPEED};
