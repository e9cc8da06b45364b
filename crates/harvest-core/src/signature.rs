//! # Payment Signatures
//!
//! After checkout the gateway hands the browser three ids. The browser
//! relays them here, and we prove they came from the gateway by recomputing
//! the signature with the shared key secret.
//!
//! ```text
//! message   = "{razorpay_order_id}|{razorpay_payment_id}"
//! signature = hex( HMAC-SHA256(message, key_secret) )
//! ```
//!
//! Comparison is constant time so response latency leaks nothing about how
//! many leading characters of a forged signature were right.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::CoreError;

type HmacSha256 = Hmac<Sha256>;

/// Computes the expected signature for a gateway order/payment pair.
///
/// ## Example
/// ```rust
/// use harvest_core::signature::{payment_signature, verify_payment_signature};
///
/// let sig = payment_signature("order_1", "pay_1", "secret").unwrap();
/// assert_eq!(sig.len(), 64);
/// assert!(verify_payment_signature("order_1", "pay_1", &sig, "secret"));
/// ```
pub fn payment_signature(
    order_id: &str,
    payment_id: &str,
    key_secret: &str,
) -> Result<String, CoreError> {
    let mut mac = HmacSha256::new_from_slice(key_secret.as_bytes())
        .map_err(|_| CoreError::InvalidSigningKey)?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Returns true only if `signature` is the lowercase hex HMAC of the pair.
pub fn verify_payment_signature(
    order_id: &str,
    payment_id: &str,
    signature: &str,
    key_secret: &str,
) -> bool {
    match payment_signature(order_id, payment_id, key_secret) {
        Ok(expected) => expected.as_bytes().ct_eq(signature.as_bytes()).into(),
        Err(_) => false,
    }
}
