//! SharedKey request signing.
//!
//! The collector authenticates each POST with an HMAC-SHA256 over a
//! canonical description of the request: method, content length, content
//! type, the `x-ms-date` header, and the resource path, joined by
//! newlines. The digest is base64-encoded into a
//! `SharedKey {customer_id}:{digest}` header value.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::TelemetryResult;

/// Content type of every collector request, fixed by the wire format.
pub const CONTENT_TYPE: &str = "application/json";

type HmacSha256 = Hmac<Sha256>;

/// Decode the base64 shared key into raw key bytes.
///
/// A malformed key is a configuration error: callers validate this once
/// at startup, never per request.
pub fn decode_shared_key(shared_key_b64: &str) -> TelemetryResult<Vec<u8>> {
    Ok(BASE64.decode(shared_key_b64)?)
}

/// Format a timestamp as RFC1123 with the literal `GMT` zone label the
/// collector requires (for example `Mon, 02 Jan 2006 15:04:05 GMT`).
pub fn rfc1123_gmt(when: DateTime<Utc>) -> String {
    when.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Compute the `Authorization` header value for one request.
///
/// Pure and deterministic in its inputs; no I/O. The key is the decoded
/// shared key, not its base64 form.
pub fn sign(
    customer_id: &str,
    key: &[u8],
    date: &str,
    content_length: usize,
    method: &str,
    resource: &str,
) -> String {
    let canonical =
        format!("{method}\n{content_length}\n{CONTENT_TYPE}\nx-ms-date:{date}\n{resource}");

    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(canonical.as_bytes());
    let digest = BASE64.encode(mac.finalize().into_bytes());

    format!("SharedKey {customer_id}:{digest}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const CUSTOMER_ID: &str = "11111111-2222-3333-4444-555555555555";
    const KEY_B64: &str = "c3B5Z2xhc3MgZ29sZGVuIGtleSBmb3IgcGlubmVkIHNpZ25hdHVyZSB0ZXN0cyEh";
    const DATE: &str = "Mon, 02 Jan 2006 15:04:05 GMT";

    fn key() -> Vec<u8> {
        decode_shared_key(KEY_B64).unwrap()
    }

    #[test]
    fn golden_signature() {
        // Reference value pinned against an independent implementation.
        assert_eq!(
            sign(CUSTOMER_ID, &key(), DATE, 42, "POST", "/api/logs"),
            "SharedKey 11111111-2222-3333-4444-555555555555:qEaXoNYz7Ti1W7y5Lq3f1/pM2qobrTmiN91c+51Ozdg="
        );
    }

    #[test]
    fn signing_is_deterministic() {
        let first = sign(CUSTOMER_ID, &key(), DATE, 42, "POST", "/api/logs");
        let second = sign(CUSTOMER_ID, &key(), DATE, 42, "POST", "/api/logs");
        assert_eq!(first, second);
    }

    #[test]
    fn each_input_perturbs_the_signature() {
        let baseline = sign(CUSTOMER_ID, &key(), DATE, 42, "POST", "/api/logs");

        let variants = [
            sign("other-customer", &key(), DATE, 42, "POST", "/api/logs"),
            sign(CUSTOMER_ID, b"other key bytes", DATE, 42, "POST", "/api/logs"),
            sign(CUSTOMER_ID, &key(), "Tue, 03 Jan 2006 15:04:05 GMT", 42, "POST", "/api/logs"),
            sign(CUSTOMER_ID, &key(), DATE, 43, "POST", "/api/logs"),
            sign(CUSTOMER_ID, &key(), DATE, 42, "PUT", "/api/logs"),
            sign(CUSTOMER_ID, &key(), DATE, 42, "POST", "/api/other"),
        ];

        for (i, variant) in variants.iter().enumerate() {
            assert_ne!(&baseline, variant, "variant {i} collided");
        }
    }

    #[test]
    fn customer_id_appears_verbatim() {
        let signature = sign(CUSTOMER_ID, &key(), DATE, 0, "POST", "/api/logs");
        assert!(signature.starts_with("SharedKey 11111111-2222-3333-4444-555555555555:"));
    }

    #[test]
    fn decode_rejects_malformed_key() {
        assert!(decode_shared_key("not//valid==base64!!").is_err());
    }

    #[test]
    fn rfc1123_gmt_matches_reference_format() {
        let when = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap();
        assert_eq!(rfc1123_gmt(when), "Mon, 02 Jan 2006 15:04:05 GMT");
    }

    #[test]
    fn rfc1123_gmt_zero_pads_the_day() {
        let when = Utc.with_ymd_and_hms(2024, 3, 5, 1, 2, 3).unwrap();
        assert_eq!(rfc1123_gmt(when), "Tue, 05 Mar 2024 01:02:03 GMT");
    }
}
