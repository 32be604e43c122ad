//! Wire primitives for the server list ping protocol.
//!
//! VarInts are little-endian base-128: seven data bits per byte, high bit
//! set on continuation bytes, at most five bytes for a 32-bit value.
//! Strings are VarInt-length-prefixed UTF-8. Packets are VarInt-length
//! prefixed `(packet id, payload)` frames.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProbeError, ProbeResult};

/// Upper bound on any declared frame or string length.
///
/// Status responses are small; anything past this is a hostile or corrupt
/// peer and is rejected before allocation.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Append a VarInt encoding of `value` to `buf`.
///
/// Negative values encode as 32-bit two's complement, always occupying the
/// full five bytes.
pub fn encode_varint(buf: &mut Vec<u8>, value: i32) {
    let mut v = value as u32;
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
}

/// Append a VarInt-length-prefixed UTF-8 string to `buf`.
pub fn encode_string(buf: &mut Vec<u8>, s: &str) {
    encode_varint(buf, s.len() as i32);
    buf.extend_from_slice(s.as_bytes());
}

/// Read a VarInt from the reader.
///
/// Rejects encodings longer than five bytes.
pub async fn read_varint<R>(reader: &mut R) -> ProbeResult<i32>
where
    R: AsyncRead + Unpin,
{
    let mut value: u32 = 0;
    for i in 0..5 {
        let byte = reader.read_u8().await?;
        value |= ((byte & 0x7f) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(ProbeError::Protocol(
        "VarInt exceeds five bytes".to_string(),
    ))
}

/// Read a VarInt-length-prefixed UTF-8 string from the reader.
pub async fn read_string<R>(reader: &mut R) -> ProbeResult<String>
where
    R: AsyncRead + Unpin,
{
    let len = read_varint(reader).await?;
    if len < 0 || len as usize > MAX_FRAME_LEN {
        return Err(ProbeError::Protocol(format!(
            "declared string length {len} out of bounds"
        )));
    }
    let mut bytes = vec![0u8; len as usize];
    reader.read_exact(&mut bytes).await?;
    String::from_utf8(bytes)
        .map_err(|e| ProbeError::Protocol(format!("string is not valid UTF-8: {e}")))
}

/// Write one framed packet: VarInt total length, VarInt packet id, payload.
pub async fn write_packet<W>(writer: &mut W, packet_id: i32, payload: &[u8]) -> ProbeResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut body = Vec::with_capacity(payload.len() + 5);
    encode_varint(&mut body, packet_id);
    body.extend_from_slice(payload);

    let mut frame = Vec::with_capacity(body.len() + 5);
    encode_varint(&mut frame, body.len() as i32);
    frame.extend_from_slice(&body);

    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed packet, returning its packet id and payload.
pub async fn read_packet<R>(reader: &mut R) -> ProbeResult<(i32, Vec<u8>)>
where
    R: AsyncRead + Unpin,
{
    let len = read_varint(reader).await?;
    if len <= 0 || len as usize > MAX_FRAME_LEN {
        return Err(ProbeError::Protocol(format!(
            "declared packet length {len} out of bounds"
        )));
    }
    let mut frame = vec![0u8; len as usize];
    reader.read_exact(&mut frame).await?;

    let mut cursor = frame.as_slice();
    let packet_id = read_varint(&mut cursor).await?;
    Ok((packet_id, cursor.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: i32) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_varint(&mut buf, value);
        buf
    }

    #[test]
    fn varint_known_encodings() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(1), vec![0x01]);
        assert_eq!(encoded(127), vec![0x7f]);
        assert_eq!(encoded(128), vec![0x80, 0x01]);
        assert_eq!(encoded(255), vec![0xff, 0x01]);
        assert_eq!(encoded(300), vec![0xac, 0x02]);
        assert_eq!(encoded(2_097_151), vec![0xff, 0xff, 0x7f]);
        assert_eq!(
            encoded(i32::MAX),
            vec![0xff, 0xff, 0xff, 0xff, 0x07]
        );
    }

    #[test]
    fn varint_negative_uses_five_bytes() {
        // Two's complement: -1 is all ones.
        assert_eq!(encoded(-1), vec![0xff, 0xff, 0xff, 0xff, 0x0f]);
    }

    #[tokio::test]
    async fn varint_roundtrip() {
        for value in [0, 1, 127, 128, 255, 300, 25_565, 2_097_151, i32::MAX, -1, i32::MIN] {
            let buf = encoded(value);
            let mut cursor = buf.as_slice();
            assert_eq!(read_varint(&mut cursor).await.unwrap(), value, "value {value}");
            assert!(cursor.is_empty(), "trailing bytes for {value}");
        }
    }

    #[tokio::test]
    async fn varint_rejects_six_bytes() {
        let buf = [0x80u8, 0x80, 0x80, 0x80, 0x80, 0x01];
        let mut cursor = buf.as_slice();
        let err = read_varint(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProbeError::Protocol(_)), "got {err}");
    }

    #[tokio::test]
    async fn string_roundtrip() {
        let mut buf = Vec::new();
        encode_string(&mut buf, "spyglass");
        let mut cursor = buf.as_slice();
        assert_eq!(read_string(&mut cursor).await.unwrap(), "spyglass");
    }

    #[tokio::test]
    async fn string_rejects_oversized_declaration() {
        let mut buf = Vec::new();
        encode_varint(&mut buf, (MAX_FRAME_LEN + 1) as i32);
        let mut cursor = buf.as_slice();
        let err = read_string(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProbeError::Protocol(_)));
    }

    #[tokio::test]
    async fn string_rejects_invalid_utf8() {
        let mut buf = Vec::new();
        encode_varint(&mut buf, 2);
        buf.extend_from_slice(&[0xff, 0xfe]);
        let mut cursor = buf.as_slice();
        let err = read_string(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProbeError::Protocol(_)));
    }

    #[tokio::test]
    async fn packet_roundtrip() {
        let mut wire = Vec::new();
        write_packet(&mut wire, 0x00, b"payload").await.unwrap();

        let mut cursor = wire.as_slice();
        let (id, payload) = read_packet(&mut cursor).await.unwrap();
        assert_eq!(id, 0x00);
        assert_eq!(payload, b"payload");
    }

    #[tokio::test]
    async fn packet_rejects_zero_length() {
        let buf = [0x00u8];
        let mut cursor = buf.as_slice();
        let err = read_packet(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProbeError::Protocol(_)));
    }

    #[tokio::test]
    async fn packet_truncated_payload_is_io_error() {
        // Declares 10 bytes but carries 2.
        let buf = [0x0au8, 0x00, 0x01];
        let mut cursor = buf.as_slice();
        let err = read_packet(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProbeError::Io(_)));
    }
}
