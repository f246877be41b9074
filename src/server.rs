use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::audit::AuditTrail;
use crate::caller::ServerCaller;
use crate::config::{Config, ConfigError};
use crate::error::Error;
use crate::origin::Origin;
use crate::policy::{AuthPolicy, PolicyKind};
use crate::procedure::UpdateDisplayName;
use crate::registry::{MethodRegistry, RegistryError};
use crate::store::UserStore;
use crate::token::TrustToken;

/// Error returned when the server cannot start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    /// The configuration is invalid
    Config(ConfigError),
    /// A procedure could not be registered
    Registry(RegistryError),
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::Config(e) => write!(f, "startup failed: {}", e),
            StartError::Registry(e) => write!(f, "startup failed: {}", e),
        }
    }
}

impl std::error::Error for StartError {}

impl From<ConfigError> for StartError {
    fn from(e: ConfigError) -> Self {
        StartError::Config(e)
    }
}

impl From<RegistryError> for StartError {
    fn from(e: RegistryError) -> Self {
        StartError::Registry(e)
    }
}

/// Composition root wiring the server-only procedure into a registry.
///
/// `start` is the startup hook: it generates the trust token once when the
/// token policy is configured, injects it into the procedure, and registers
/// exactly one `updateDisplayName` definition.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use origin_gate::{Config, MemoryUserStore, Server, UPDATE_DISPLAY_NAME};
/// use serde_json::json;
///
/// let store = Arc::new(MemoryUserStore::new());
/// store.insert_user("u1");
///
/// let server = Server::start(&Config::default(), Arc::clone(&store)).unwrap();
///
/// // A client cannot reach the procedure...
/// let err = server
///     .dispatch_external(UPDATE_DISPLAY_NAME, &json!({ "id": "u1", "name": "Mallory" }))
///     .unwrap_err();
/// assert_eq!(err.code(), "server-only");
///
/// // ...but trusted server code can.
/// server.caller().update_display_name("u1", "John Doe").unwrap();
/// assert_eq!(store.display_name("u1").as_deref(), Some("John Doe"));
/// ```
#[derive(Debug)]
pub struct Server {
    registry: Arc<MethodRegistry>,
    caller: ServerCaller,
    audit: Arc<AuditTrail>,
    policy: PolicyKind,
}

impl Server {
    /// Builds the server from `config`, storing user records in `store`.
    ///
    /// # Errors
    ///
    /// Returns `StartError` if the configuration is invalid or registration fails.
    pub fn start<S>(config: &Config, store: Arc<S>) -> Result<Self, StartError>
    where
        S: UserStore + 'static,
    {
        config.validate()?;

        let token = match config.policy {
            PolicyKind::Token => Some(Arc::new(TrustToken::generate())),
            PolicyKind::Origin => None,
        };
        let policy = match &token {
            Some(token) => AuthPolicy::Token(Arc::clone(token)),
            None => AuthPolicy::Origin,
        };

        let audit = Arc::new(AuditTrail::with_capacity(config.audit_capacity));
        let procedure = UpdateDisplayName::new(store, policy, Arc::clone(&audit))
            .with_name_rules(config.name_rules());

        let mut registry = MethodRegistry::new();
        registry.register(Arc::new(procedure))?;
        let registry = Arc::new(registry);

        tracing::info!(
            policy = %config.policy,
            methods = ?registry.methods(),
            "server-only procedures registered"
        );

        Ok(Self {
            caller: ServerCaller::new(Arc::clone(&registry), token),
            registry,
            audit,
            policy: config.policy,
        })
    }

    /// Dispatches a call that arrived from a client connection.
    ///
    /// # Errors
    ///
    /// Returns the procedure's error, or `Error::MethodNotFound`.
    pub fn dispatch_external(&self, method: &str, args: &Value) -> Result<Value, Error> {
        self.registry.dispatch(method, args, Origin::External)
    }

    /// Returns the trusted in-process caller.
    pub fn caller(&self) -> &ServerCaller {
        &self.caller
    }

    /// Returns the audit trail shared by the registered procedures.
    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    /// Returns the method registry.
    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Returns the active authorization policy.
    pub fn policy(&self) -> PolicyKind {
        self.policy
    }
}
