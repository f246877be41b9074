use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use subtle::ConstantTimeEq;

/// Bytes of entropy in a generated token.
pub const TOKEN_ENTROPY_BYTES: usize = 32;

/// Process-wide secret that lets trusted server code prove it is trusted.
///
/// A `TrustToken` is generated once by the composition root at startup and
/// shared read-only with the procedures that check it. The value is never
/// written to logs: `Debug` and `Display` both print `[REDACTED]`.
///
/// # Security Properties
///
/// - Does NOT implement `Clone`, `Deref`, `AsRef` or `PartialEq`
/// - Comparison goes through [`verify`](Self::verify), which is constant time
///   with respect to the candidate's contents
/// - Regenerating the token invalidates every previously issued value
///
/// # Examples
///
/// ```
/// use origin_gate::TrustToken;
///
/// let token = TrustToken::generate();
/// assert_eq!(format!("{:?}", token), "[REDACTED]");
/// assert!(!token.verify("guess"));
/// ```
// Do NOT derive Clone or PartialEq: share through Arc, compare through verify().
pub struct TrustToken {
    inner: String,
}

impl TrustToken {
    /// Generates a fresh token from the operating system's CSPRNG.
    ///
    /// The token is 32 random bytes encoded as unpadded URL-safe base64,
    /// which is always 43 characters.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
        OsRng.fill_bytes(&mut bytes);

        Self {
            inner: URL_SAFE_NO_PAD.encode(bytes),
        }
    }

    /// Wraps an externally provisioned token value.
    pub fn from_value(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Checks a candidate token against this one in constant time.
    ///
    /// The time taken does not depend on how many leading characters of the
    /// candidate match. A length mismatch is rejected without inspecting
    /// the contents.
    ///
    /// The timing guarantee is the one `subtle::ConstantTimeEq` gives for
    /// byte slices; tests cover only the accept/reject result.
    pub fn verify(&self, candidate: &str) -> bool {
        self.inner.as_bytes().ct_eq(candidate.as_bytes()).into()
    }

    /// Returns the raw token value.
    ///
    /// Only trusted in-process callers attach the token to outgoing calls.
    pub(crate) fn expose_secret(&self) -> &str {
        &self.inner
    }
}

impl fmt::Debug for TrustToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for TrustToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
