use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Fixed message both sides are signed over; the secret is the HMAC key.
const CONTEXT: &[u8] = b"smart-cane/x-api-key";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing API key")]
    Missing,
    #[error("invalid API key")]
    Invalid,
}

/// Shared-secret check for mutating and administrative requests.
///
/// Only the HMAC tag of the configured secret is held. A candidate is tagged
/// the same way and compared with `verify_slice`, which runs in constant
/// time over a fixed 32-byte tag, so neither content nor length of the
/// secret leaks through timing.
#[derive(Clone)]
pub struct AccessGuard {
    expected: [u8; 32],
}

impl AccessGuard {
    pub fn new(secret: &str) -> Self {
        let mut expected = [0u8; 32];
        expected.copy_from_slice(&tag(secret.as_bytes()).finalize().into_bytes());
        Self { expected }
    }

    pub fn verify(&self, provided: Option<&str>) -> Result<(), AuthError> {
        let provided = provided.ok_or(AuthError::Missing)?;
        tag(provided.as_bytes())
            .verify_slice(&self.expected)
            .map_err(|_| AuthError::Invalid)
    }
}

impl std::fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGuard").finish_non_exhaustive()
    }
}

fn tag(key: &[u8]) -> HmacSha256 {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(CONTEXT);
    mac
}
