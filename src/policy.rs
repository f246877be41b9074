use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::capability::UpdateCap;
use crate::error::AuthorizationError;
use crate::origin::Origin;
use crate::token::TrustToken;

/// Which authorization technique a deployment uses.
///
/// Exactly one is active per process; it is chosen by configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Calls must carry the process trust token
    Token,
    /// Calls must originate inside the server process
    #[default]
    Origin,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Token => write!(f, "token"),
            PolicyKind::Origin => write!(f, "origin"),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "token" => Ok(PolicyKind::Token),
            "origin" => Ok(PolicyKind::Origin),
            other => Err(format!("unknown policy '{}', expected 'token' or 'origin'", other)),
        }
    }
}

/// The authorization policy guarding a server-only procedure.
///
/// # Examples
///
/// ```
/// use origin_gate::{AuthPolicy, Origin};
///
/// let policy = AuthPolicy::Origin;
/// assert!(policy.authorize(Origin::Internal, None).is_ok());
/// assert!(policy.authorize(Origin::External, None).is_err());
/// ```
#[derive(Debug)]
pub enum AuthPolicy {
    /// Authorized iff the presented token matches the process token
    Token(Arc<TrustToken>),
    /// Authorized iff the call is `Origin::Internal`
    Origin,
}

impl AuthPolicy {
    /// Returns the kind of this policy.
    pub fn kind(&self) -> PolicyKind {
        match self {
            AuthPolicy::Token(_) => PolicyKind::Token,
            AuthPolicy::Origin => PolicyKind::Origin,
        }
    }

    /// Returns the trust token when the token policy is active.
    pub fn token(&self) -> Option<&TrustToken> {
        match self {
            AuthPolicy::Token(token) => Some(token),
            AuthPolicy::Origin => None,
        }
    }

    /// Decides whether a call may perform the privileged write.
    ///
    /// Under the token policy the origin is not consulted; an absent token
    /// is treated the same as a wrong one. Under the origin policy any
    /// presented token is ignored.
    ///
    /// # Errors
    ///
    /// Returns `invalid-token` or `server-only` depending on the policy.
    pub fn authorize(
        &self,
        origin: Origin,
        presented: Option<&str>,
    ) -> Result<UpdateCap, AuthorizationError> {
        match self {
            AuthPolicy::Token(token) => match presented {
                Some(candidate) if token.verify(candidate) => Ok(UpdateCap::new()),
                _ => Err(AuthorizationError::invalid_token()),
            },
            AuthPolicy::Origin => {
                if origin.is_internal() {
                    Ok(UpdateCap::new())
                } else {
                    Err(AuthorizationError::server_only())
                }
            }
        }
    }
}
