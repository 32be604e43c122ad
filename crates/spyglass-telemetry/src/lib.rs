//! spyglass-telemetry: signed telemetry delivery for the monitoring agent.
//!
//! Serializes per-tick snapshots into the collector's wire format, signs
//! each request with the SharedKey scheme (HMAC-SHA256 over a canonical
//! request description), and performs a single best-effort HTTP delivery.
//!
//! # Architecture
//!
//! ```text
//! Publisher::publish(&Snapshot)
//!   ├── serde_json body (field names fixed by the collector schema)
//!   ├── rfc1123_gmt(now) → x-ms-date header
//!   ├── sign(...) → Authorization header
//!   └── one HTTP POST (TLS via rustls, plain TCP for http endpoints)
//! ```
//!
//! Delivery is single-attempt by design: a failed POST is reported to the
//! caller and the snapshot is discarded. There is no queue and no retry.

pub mod error;
pub mod publisher;
pub mod signer;
pub mod snapshot;

pub use error::{TelemetryError, TelemetryResult};
pub use publisher::{CollectorEndpoint, DeliveryReceipt, Publisher};
pub use signer::{decode_shared_key, rfc1123_gmt, sign};
pub use snapshot::Snapshot;
