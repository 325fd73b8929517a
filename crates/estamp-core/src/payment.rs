//! # Payment Signature Verification
//!
//! The gateway signs each successful checkout with the merchant secret:
//!
//! ```text
//! signature = hex( HMAC_SHA256( key_secret, gateway_order_id + "|" + gateway_payment_id ) )
//! ```
//!
//! A [`VerifiedPayment`] can only be produced by
//! [`PaymentSignatureVerifier::verify`], and moving an order to
//! `payment_verified` consumes one. An order therefore cannot be marked paid
//! without a signature that checked out.

use std::fmt;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use ts_rs::TS;

use crate::error::{PaymentVerificationError, ValidationError};

type HmacSha256 = Hmac<Sha256>;

/// Byte length of an HMAC-SHA256 tag.
const SIGNATURE_LEN: usize = 32;

/// Payment callback as posted by the checkout widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentConfirmation {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
}

/// Proof that a payment confirmation carried a valid signature.
///
/// Not `Clone` and not constructible outside this module.
#[derive(Debug, PartialEq, Eq)]
pub struct VerifiedPayment {
    gateway_order_id: String,
    gateway_payment_id: String,
}

impl VerifiedPayment {
    pub fn gateway_order_id(&self) -> &str {
        &self.gateway_order_id
    }

    pub fn gateway_payment_id(&self) -> &str {
        &self.gateway_payment_id
    }
}

/// Verifies gateway signatures with the merchant key secret.
#[derive(Clone)]
pub struct PaymentSignatureVerifier {
    mac: HmacSha256,
}

impl PaymentSignatureVerifier {
    /// Creates a verifier keyed with the gateway key secret.
    pub fn new(key_secret: &str) -> Result<Self, ValidationError> {
        if key_secret.is_empty() {
            return Err(ValidationError::Required {
                field: "gateway.key_secret".to_string(),
            });
        }

        let mac = HmacSha256::new_from_slice(key_secret.as_bytes()).map_err(|e| {
            ValidationError::InvalidFormat {
                field: "gateway.key_secret".to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(PaymentSignatureVerifier { mac })
    }

    fn keyed(&self, gateway_order_id: &str, gateway_payment_id: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(gateway_order_id.as_bytes());
        mac.update(b"|");
        mac.update(gateway_payment_id.as_bytes());
        mac
    }

    /// Computes the signature the gateway would send.
    ///
    /// Used by the sandbox gateway and by tests.
    pub fn sign(&self, gateway_order_id: &str, gateway_payment_id: &str) -> String {
        hex::encode(
            self.keyed(gateway_order_id, gateway_payment_id)
                .finalize()
                .into_bytes(),
        )
    }

    /// Verifies a confirmation for the gateway order on record.
    ///
    /// ## Checks
    /// 1. The confirmation names `expected_gateway_order_id`
    /// 2. The signature is 64 hex characters
    /// 3. The signature matches (constant-time comparison)
    ///
    /// ## Example
    /// ```rust
    /// use estamp_core::payment::{PaymentConfirmation, PaymentSignatureVerifier};
    ///
    /// let verifier = PaymentSignatureVerifier::new("secret").unwrap();
    /// let confirmation = PaymentConfirmation {
    ///     gateway_order_id: "order_1".to_string(),
    ///     gateway_payment_id: "pay_1".to_string(),
    ///     signature: verifier.sign("order_1", "pay_1"),
    /// };
    ///
    /// let proof = verifier.verify("order_1", &confirmation).unwrap();
    /// assert_eq!(proof.gateway_payment_id(), "pay_1");
    /// ```
    pub fn verify(
        &self,
        expected_gateway_order_id: &str,
        confirmation: &PaymentConfirmation,
    ) -> Result<VerifiedPayment, PaymentVerificationError> {
        if confirmation.gateway_order_id != expected_gateway_order_id {
            return Err(PaymentVerificationError::OrderMismatch {
                expected: expected_gateway_order_id.to_string(),
                received: confirmation.gateway_order_id.clone(),
            });
        }

        let signature = hex::decode(confirmation.signature.trim())
            .map_err(|_| PaymentVerificationError::MalformedSignature)?;
        if signature.len() != SIGNATURE_LEN {
            return Err(PaymentVerificationError::MalformedSignature);
        }

        self.keyed(&confirmation.gateway_order_id, &confirmation.gateway_payment_id)
            .verify_slice(&signature)
            .map_err(|_| PaymentVerificationError::SignatureMismatch)?;

        Ok(VerifiedPayment {
            gateway_order_id: confirmation.gateway_order_id.clone(),
            gateway_payment_id: confirmation.gateway_payment_id.clone(),
        })
    }
}

impl fmt::Debug for PaymentSignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentSignatureVerifier").finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn confirmation(verifier: &PaymentSignatureVerifier) -> PaymentConfirmation {
        PaymentConfirmation {
            gateway_order_id: "order_IluGWxBm9U8zJ8".to_string(),
            gateway_payment_id: "pay_IluGWxBm9U8zJ9".to_string(),
            signature: verifier.sign("order_IluGWxBm9U8zJ8", "pay_IluGWxBm9U8zJ9"),
        }
    }

    #[test]
    fn test_signature_is_deterministic_lowercase_hex() {
        let verifier = PaymentSignatureVerifier::new("key").unwrap();
        let sig = verifier.sign("order_1", "pay_1");

        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(sig, verifier.sign("order_1", "pay_1"));
        assert_ne!(sig, verifier.sign("order_1", "pay_2"));
    }

    #[test]
    fn test_valid_signature() {
        let verifier = PaymentSignatureVerifier::new("test_secret").unwrap();
        let c = confirmation(&verifier);

        let proof = verifier.verify("order_IluGWxBm9U8zJ8", &c).unwrap();
        assert_eq!(proof.gateway_order_id(), "order_IluGWxBm9U8zJ8");
        assert_eq!(proof.gateway_payment_id(), "pay_IluGWxBm9U8zJ9");
    }

    #[test]
    fn test_tampered_signature() {
        let verifier = PaymentSignatureVerifier::new("test_secret").unwrap();
        let mut c = confirmation(&verifier);
        let flipped = if c.signature.starts_with('0') { "1" } else { "0" };
        c.signature.replace_range(0..1, flipped);

        assert_eq!(
            verifier.verify("order_IluGWxBm9U8zJ8", &c),
            Err(PaymentVerificationError::SignatureMismatch)
        );
    }

    #[test]
    fn test_tampered_payment_id() {
        let verifier = PaymentSignatureVerifier::new("test_secret").unwrap();
        let mut c = confirmation(&verifier);
        c.gateway_payment_id = "pay_other".to_string();

        assert_eq!(
            verifier.verify("order_IluGWxBm9U8zJ8", &c),
            Err(PaymentVerificationError::SignatureMismatch)
        );
    }

    #[test]
    fn test_wrong_secret() {
        let signer = PaymentSignatureVerifier::new("one").unwrap();
        let verifier = PaymentSignatureVerifier::new("two").unwrap();
        let c = confirmation(&signer);

        assert!(verifier.verify("order_IluGWxBm9U8zJ8", &c).is_err());
    }

    #[test]
    fn test_malformed_signature() {
        let verifier = PaymentSignatureVerifier::new("test_secret").unwrap();
        let mut c = confirmation(&verifier);

        c.signature = "not-hex".to_string();
        assert_eq!(
            verifier.verify("order_IluGWxBm9U8zJ8", &c),
            Err(PaymentVerificationError::MalformedSignature)
        );

        c.signature = "abcd".to_string();
        assert_eq!(
            verifier.verify("order_IluGWxBm9U8zJ8", &c),
            Err(PaymentVerificationError::MalformedSignature)
        );
    }

    #[test]
    fn test_order_mismatch() {
        let verifier = PaymentSignatureVerifier::new("test_secret").unwrap();
        let c = confirmation(&verifier);

        assert!(matches!(
            verifier.verify("order_someone_else", &c),
            Err(PaymentVerificationError::OrderMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(PaymentSignatureVerifier::new("").is_err());
    }
}
