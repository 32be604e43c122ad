//! spyglass-probe: status queries against a running game server.
//!
//! Implements the client side of the server list ping protocol: a
//! VarInt-framed handshake followed by a status request, answered by the
//! server with a JSON document describing the current player counts.
//!
//! # Architecture
//!
//! ```text
//! ping(host, port, timeout)
//!   ├── TcpStream::connect
//!   ├── handshake packet (protocol version, address, port, next-state 1)
//!   ├── status request packet
//!   └── status response packet → StatusReply
//! ```
//!
//! The probe performs a single exchange per call: no retries, no connection
//! reuse. The connection is dropped on every exit path, including timeout.

pub mod codec;
pub mod error;
pub mod ping;

pub use error::{ProbeError, ProbeResult};
pub use ping::{StatusReply, ping};
