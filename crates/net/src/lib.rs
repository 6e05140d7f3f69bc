#![warn(missing_docs)]
//! Wire-facing disguise gateway.
//!
//! Every inbound and outbound frame of a connection passes through the
//! [`Gateway`] exactly once, synchronously, on the connection's I/O task.
//! The gateway consults the shared read-only disguise registry and its own
//! per-connection session state; all work is in-memory transformation with
//! no suspension points.

pub mod config;
pub mod gateway;
pub mod host;
pub mod mining;
pub mod protocol;
pub mod section;
pub mod session;

pub use config::{BundleConfig, GatewayConfig};
pub use gateway::{Gateway, GatewayError, Transformed};
pub use host::{ClientKindDetector, PlayerView};
pub use protocol::{ClientboundFrame, ConnectionId, ServerboundFrame};
pub use section::{decode_sections, encode_sections, ChunkSection, SectionCodecError};
pub use session::{ClientKind, ConnectionSession, HandshakePhase};
