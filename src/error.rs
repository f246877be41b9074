use std::fmt;

/// Errors returned by gated procedures and the method registry.
///
/// Validation and authorization failures are separate variants so the
/// calling layer can tell a malformed request from a rejected attempt to
/// reach a server-only method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The call arguments did not match the expected shape
    Validation(ValidationError),
    /// The caller failed the origin or token check
    Authorization(AuthorizationError),
    /// The target record does not exist
    NotFound(NotFoundError),
    /// No procedure is registered under the requested name
    MethodNotFound {
        /// The requested method name
        method: String,
    },
}

impl Error {
    /// Returns a stable, non-sensitive code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation-failed",
            Error::Authorization(e) => e.code().as_str(),
            Error::NotFound(_) => "not-found",
            Error::MethodNotFound { .. } => "method-not-found",
        }
    }

    /// Returns `true` if the call was rejected by an authorization policy.
    pub fn is_authorization(&self) -> bool {
        matches!(self, Error::Authorization(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(e) => write!(f, "{}", e),
            Error::Authorization(e) => write!(f, "{}", e),
            Error::NotFound(e) => write!(f, "{}", e),
            Error::MethodNotFound { method } => write!(f, "method '{}' not found", method),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Validation(e) => Some(e),
            Error::Authorization(e) => Some(e),
            Error::NotFound(e) => Some(e),
            Error::MethodNotFound { .. } => None,
        }
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl From<AuthorizationError> for Error {
    fn from(e: AuthorizationError) -> Self {
        Error::Authorization(e)
    }
}

impl From<NotFoundError> for Error {
    fn from(e: NotFoundError) -> Self {
        Error::NotFound(e)
    }
}

/// The call arguments violated the expected shape.
///
/// `field` names the offending argument field, or `"<args>"` when the
/// arguments as a whole are malformed. The rejected value is never echoed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    field: String,
    reason: String,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the name of the offending field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the reason the field was rejected.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed for '{}': {}", self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

/// Why an authorization check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationCode {
    /// The supplied trust token did not match
    InvalidToken,
    /// The call did not originate inside the server process
    ServerOnly,
}

impl AuthorizationCode {
    /// Returns the stable wire code.
    pub fn as_str(self) -> &'static str {
        match self {
            AuthorizationCode::InvalidToken => "invalid-token",
            AuthorizationCode::ServerOnly => "server-only",
        }
    }
}

impl fmt::Display for AuthorizationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller failed the configured authorization policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationError {
    code: AuthorizationCode,
    message: String,
}

impl AuthorizationError {
    /// Creates a new authorization error.
    pub fn new(code: AuthorizationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Rejection for a missing or mismatched trust token.
    pub fn invalid_token() -> Self {
        Self::new(
            AuthorizationCode::InvalidToken,
            "Sorry, your server authentication token is invalid.",
        )
    }

    /// Rejection for a call that arrived from a client connection.
    pub fn server_only() -> Self {
        Self::new(
            AuthorizationCode::ServerOnly,
            "Sorry, this method can only be called from the server.",
        )
    }

    /// Returns the failure code.
    pub fn code(&self) -> AuthorizationCode {
        self.code
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AuthorizationError {}

/// The user record store has no record with the given id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFoundError {
    id: String,
}

impl NotFoundError {
    /// Creates a new not-found error for `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Returns the id that was looked up.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record '{}' not found", self.id)
    }
}

impl std::error::Error for NotFoundError {}
