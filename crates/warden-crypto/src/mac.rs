//! Request MACs.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use warden_proto::CanonicalFields;

type HmacSha256 = Hmac<Sha256>;

/// Length of a hex-encoded HMAC-SHA256 digest.
pub const MAC_HEX_LEN: usize = 64;

/// Errors from MAC computation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MacError {
    /// The key was rejected by the HMAC implementation.
    #[error("invalid HMAC key")]
    InvalidKey,
}

/// Compute the lowercase hex HMAC-SHA256 of `message` under `key`.
pub fn sign(key: &[u8], message: &[u8]) -> Result<String, MacError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| MacError::InvalidKey)?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Compute the MAC a client must send for `fields`.
pub fn sign_fields(key: &[u8], fields: &CanonicalFields<'_>) -> Result<String, MacError> {
    sign(key, &fields.to_message())
}

/// Check `supplied` against the MAC of `message` under `key`.
///
/// The comparison is over the hex strings, so it is case-sensitive: an
/// uppercase rendering of the correct digest does not verify. Only the
/// length check short-circuits.
pub fn verify(key: &[u8], message: &[u8], supplied: &str) -> Result<bool, MacError> {
    let expected = sign(key, message)?;
    Ok(expected.as_bytes().ct_eq(supplied.as_bytes()).into())
}

/// Check `supplied` against the MAC of `fields` under `key`.
pub fn verify_fields(
    key: &[u8],
    fields: &CanonicalFields<'_>,
    supplied: &str,
) -> Result<bool, MacError> {
    verify(key, &fields.to_message(), supplied)
}
