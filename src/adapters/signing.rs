//! HMAC-SHA256 signing helpers shared by the gateway adapters.
//!
//! Every provider that authenticates callbacks does it with some keyed
//! digest; all comparisons here are constant-time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Computes HMAC-SHA256 over `message`.
pub(crate) fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Computes HMAC-SHA256 and returns it hex-encoded.
pub(crate) fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> String {
    hex_encode(&hmac_sha256(key, message))
}

/// Constant-time equality over raw digests.
pub(crate) fn digests_match(expected: &[u8], provided: &[u8]) -> bool {
    expected.ct_eq(provided).unwrap_u8() == 1
}

/// Constant-time equality over hex-encoded digests.
pub(crate) fn hex_digests_match(expected_hex: &str, provided_hex: &str) -> bool {
    expected_hex.as_bytes().ct_eq(provided_hex.as_bytes()).unwrap_u8() == 1
}

/// Lowercase hex encoding.
pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Hex decoding; None on odd length or a non-hex digit.
pub(crate) fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trips() {
        let bytes = vec![0x00, 0xde, 0xad, 0xbe, 0xef, 0xff];
        assert_eq!(hex_decode(&hex_encode(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn hex_decode_rejects_garbage() {
        assert!(hex_decode("abc").is_none());
        assert!(hex_decode("zz").is_none());
    }

    #[test]
    fn same_message_same_digest() {
        let a = hmac_sha256(b"key", b"message");
        let b = hmac_sha256(b"key", b"message");
        assert!(digests_match(&a, &b));
    }

    #[test]
    fn different_key_different_digest() {
        let a = hmac_sha256(b"key-1", b"message");
        let b = hmac_sha256(b"key-2", b"message");
        assert!(!digests_match(&a, &b));
    }

    #[test]
    fn hex_digest_comparison_detects_mismatch() {
        let good = hmac_sha256_hex(b"key", b"message");
        let bad = hmac_sha256_hex(b"key", b"other");
        assert!(hex_digests_match(&good, &good));
        assert!(!hex_digests_match(&good, &bad));
    }
}
