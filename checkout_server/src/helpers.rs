use hmac::{Hmac, Mac};
use log::trace;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The prefix BTCPay puts in front of the hex digest in the `BTCPay-Sig` header.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Hex encoded HMAC-SHA256 of `data`, keyed with `secret`.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    let mut mac = new_mac(secret);
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks a `BTCPay-Sig` header value (`sha256=<hex digest>`) against `data`. The comparison is constant-time.
pub fn verify_signature(secret: &str, data: &[u8], header_value: &str) -> bool {
    let digest = header_value.trim().strip_prefix(SIGNATURE_PREFIX).unwrap_or(header_value.trim());
    let Ok(expected) = hex::decode(digest) else {
        trace!("🔐️ Signature is not valid hex");
        return false;
    };
    let mut mac = new_mac(secret);
    mac.update(data);
    mac.verify_slice(&expected).is_ok()
}

fn new_mac(secret: &str) -> HmacSha256 {
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC keys can be any length"),
    }
}
