//! Midtrans notification signature check.
//!
//! Midtrans signs every HTTP notification with
//! `SHA512(order_id + status_code + gross_amount + server_key)`, hex encoded.
//! The fields are concatenated as-is, exactly as they appear in the payload,
//! so `gross_amount` must be the provider's string (`"50000.00"`), never a
//! re-formatted number.

use crate::domain::webhook::MidtransNotification;
use crate::secret::Secret;
use sha2::{Digest, Sha512};

/// Header some gateways use instead of the body `signature_key` field.
pub const SIGNATURE_HEADER: &str = "x-callback-signature";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("notification carries no signature")]
    Missing,
    #[error("notification signature does not match")]
    Mismatch,
}

#[derive(Debug, Clone, Copy)]
pub struct SignatureFields<'a> {
    pub order_id: &'a str,
    pub status_code: &'a str,
    pub gross_amount: &'a str,
}

impl<'a> From<&'a MidtransNotification> for SignatureFields<'a> {
    fn from(n: &'a MidtransNotification) -> Self {
        Self {
            order_id: &n.order_id,
            status_code: &n.status_code,
            gross_amount: &n.gross_amount,
        }
    }
}

pub fn compute_signature(fields: SignatureFields<'_>, server_key: &str) -> String {
    let digest = Sha512::new()
        .chain_update(fields.order_id.as_bytes())
        .chain_update(fields.status_code.as_bytes())
        .chain_update(fields.gross_amount.as_bytes())
        .chain_update(server_key.as_bytes())
        .finalize();
    hex::encode(digest)
}

/// Compares every byte regardless of where the first difference is.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[derive(Clone)]
pub struct SignatureVerifier {
    server_key: Secret<String>,
}

impl SignatureVerifier {
    pub fn new(server_key: Secret<String>) -> Self {
        Self { server_key }
    }

    pub fn verify(&self, fields: SignatureFields<'_>, provided: Option<&str>) -> Result<(), SignatureError> {
        let provided = provided
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(SignatureError::Missing)?;
        let expected = compute_signature(fields, self.server_key.reveal());
        // hex case is not significant
        let provided = provided.to_ascii_lowercase();
        if constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }

    /// The `x-callback-signature` header wins over the body `signature_key`
    /// when both are present; a blank header falls through to the body.
    pub fn verify_notification(
        &self,
        notification: &MidtransNotification,
        header_signature: Option<&str>,
    ) -> Result<(), SignatureError> {
        let provided = header_signature
            .filter(|h| !h.trim().is_empty())
            .or(notification.signature_key.as_deref());
        self.verify(SignatureFields::from(notification), provided)
    }
}
