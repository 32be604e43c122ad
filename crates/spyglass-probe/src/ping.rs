//! The status query exchange.
//!
//! One TCP connection per call: handshake into the status state, request
//! the status document, parse the JSON reply. The server may include
//! arbitrary extra fields; only the player counts are required.

use std::time::Duration;

use serde::Deserialize;
use tokio::net::TcpStream;
use tracing::debug;

use crate::codec;
use crate::error::{ProbeError, ProbeResult};

/// Packet id shared by the handshake, status request, and status response.
const STATUS_PACKET_ID: i32 = 0x00;

/// Protocol version sent during the handshake. The status state accepts
/// any value; -1 is the conventional "unspecified" marker.
const STATUS_PROTOCOL_VERSION: i32 = -1;

/// Next-state field selecting the status flow.
const NEXT_STATE_STATUS: i32 = 1;

/// The parsed reply of one status query.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReply {
    /// Players currently connected.
    pub online_players: i64,
    /// Configured player capacity.
    pub max_players: i64,
    /// Server version name, if reported.
    pub version: Option<String>,
    /// The raw message-of-the-day component, if reported.
    pub description: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct StatusJson {
    players: PlayersJson,
    #[serde(default)]
    version: Option<VersionJson>,
    #[serde(default)]
    description: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct PlayersJson {
    online: i64,
    max: i64,
}

#[derive(Deserialize)]
struct VersionJson {
    #[serde(default)]
    name: Option<String>,
}

/// Query the status of the server at `host:port`.
///
/// The whole exchange (connect, handshake, response) is bounded by
/// `timeout`. The connection is dropped on every exit path.
pub async fn ping(host: &str, port: u16, timeout: Duration) -> ProbeResult<StatusReply> {
    match tokio::time::timeout(timeout, exchange(host, port)).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Timeout(timeout)),
    }
}

async fn exchange(host: &str, port: u16) -> ProbeResult<StatusReply> {
    let addr = format!("{host}:{port}");
    let mut stream = TcpStream::connect(&addr)
        .await
        .map_err(|source| ProbeError::Connect {
            addr: addr.clone(),
            source,
        })?;
    debug!(%addr, "status probe connected");

    // Handshake: protocol version, address, port, next-state.
    let mut handshake = Vec::new();
    codec::encode_varint(&mut handshake, STATUS_PROTOCOL_VERSION);
    codec::encode_string(&mut handshake, host);
    handshake.extend_from_slice(&port.to_be_bytes());
    codec::encode_varint(&mut handshake, NEXT_STATE_STATUS);
    codec::write_packet(&mut stream, STATUS_PACKET_ID, &handshake).await?;

    // Status request carries no payload.
    codec::write_packet(&mut stream, STATUS_PACKET_ID, &[]).await?;

    let (packet_id, payload) = codec::read_packet(&mut stream).await?;
    if packet_id != STATUS_PACKET_ID {
        return Err(ProbeError::Protocol(format!(
            "unexpected status response packet id {packet_id:#04x}"
        )));
    }

    let mut cursor = payload.as_slice();
    let json = codec::read_string(&mut cursor).await?;
    parse_status(&json)
}

/// Parse the status JSON document into a [`StatusReply`].
fn parse_status(json: &str) -> ProbeResult<StatusReply> {
    let status: StatusJson = serde_json::from_str(json)?;
    Ok(StatusReply {
        online_players: status.players.online,
        max_players: status.players.max,
        version: status.version.and_then(|v| v.name),
        description: status.description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_status() {
        let json = r#"{
            "version": {"name": "1.20.4", "protocol": 765},
            "players": {"online": 5, "max": 20, "sample": [{"name": "alice", "id": "x"}]},
            "description": {"text": "A server"},
            "favicon": "data:image/png;base64,AAAA"
        }"#;

        let reply = parse_status(json).unwrap();
        assert_eq!(reply.online_players, 5);
        assert_eq!(reply.max_players, 20);
        assert_eq!(reply.version.as_deref(), Some("1.20.4"));
        assert!(reply.description.is_some());
    }

    #[test]
    fn parse_minimal_status() {
        let reply = parse_status(r#"{"players":{"online":0,"max":100}}"#).unwrap();
        assert_eq!(reply.online_players, 0);
        assert_eq!(reply.max_players, 100);
        assert_eq!(reply.version, None);
        assert_eq!(reply.description, None);
    }

    #[test]
    fn parse_missing_players_is_error() {
        let err = parse_status(r#"{"version":{"name":"1.20"}}"#).unwrap_err();
        assert!(matches!(err, ProbeError::Parse(_)));
    }

    #[test]
    fn parse_garbage_is_error() {
        assert!(matches!(
            parse_status("not json").unwrap_err(),
            ProbeError::Parse(_)
        ));
    }

    #[tokio::test]
    async fn ping_connection_refused() {
        // Nothing listens on port 1.
        let err = ping("127.0.0.1", 1, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, ProbeError::Connect { .. }), "got {err}");
    }
}
