//! Stripe-style webhook signature construction, exposed for tests so they
//! can exercise the verification path with real `t=...,v1=...` headers.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Build a `stripe-signature` header value over `payload`, signed at
/// `timestamp` (unix seconds) with `secret`.
pub fn stripe_signature_header(payload: &str, secret: &str, timestamp: i64) -> String {
    let signed_payload = format!("{}.{}", timestamp, payload);
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(signed_payload.as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}
