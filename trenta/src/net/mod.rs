//! Networking layer for client-server communication.
//!
//! TCP with a custom binary protocol: bincode-serialized envelopes
//! behind a u32 length prefix. Both services and the client speak the
//! same [`messages`] enums over persistent duplex connections.

/// Blocking TCP client for the lobby and authentication services.
pub mod client;

/// Message envelopes for the client-server protocol.
pub mod messages;

/// Binary message framing, in blocking and async flavors.
pub mod utils;
