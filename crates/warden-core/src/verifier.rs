//! MAC gate.

use crate::{credentials::DeviceCredential, error::AuthError, validator::Request};

/// Verify the request MAC under the device's shared key.
///
/// # Errors
///
/// - `AuthError::NoSharedKey` if the device has no usable key
/// - `AuthError::MacMismatch` if the supplied MAC differs from the expected
///   lowercase hex digest
pub fn verify_mac(request: &Request, credential: &DeviceCredential) -> Result<(), AuthError> {
    let key = credential.key().ok_or(AuthError::NoSharedKey)?;

    // Fail closed if the HMAC implementation rejects the key.
    let verified = warden_crypto::verify_fields(key.as_bytes(), &request.canonical(), &request.mac)
        .unwrap_or(false);

    if verified { Ok(()) } else { Err(AuthError::MacMismatch) }
}
