//! Server-only remote procedures, gated by caller origin or a process trust token.
//!
//! This crate restricts a remote-callable procedure so that only trusted code
//! running inside the server process can invoke it. Two interchangeable
//! policies are supported, exactly one of which is active per deployment:
//!
//! - **Origin policy**: the transport tags each call [`Origin::Internal`] or
//!   [`Origin::External`]; only internal calls are authorized. No secret
//!   material is involved.
//! - **Token policy**: each call carries an `auth` field that must match the
//!   process [`TrustToken`], compared in constant time.
//!
//! # Core Types
//!
//! - [`UpdateDisplayName`]: The gated procedure (validate, authorize, write)
//! - [`AuthPolicy`]: The configured authorization policy
//! - [`TrustToken`]: Redacting, constant-time-comparable process secret
//! - [`MethodRegistry`]: Named dispatch with one definition per name
//! - [`ServerCaller`]: Trusted in-process caller
//! - [`Server`]: Composition root run at startup
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use origin_gate::{Config, MemoryUserStore, Server, UPDATE_DISPLAY_NAME};
//! use serde_json::json;
//!
//! let store = Arc::new(MemoryUserStore::new());
//! store.insert_user("u1");
//! let server = Server::start(&Config::default(), Arc::clone(&store)).unwrap();
//!
//! let args = json!({ "id": "u1", "name": "John Doe" });
//! assert!(server.dispatch_external(UPDATE_DISPLAY_NAME, &args).is_err());
//!
//! server.caller().update_display_name("u1", "John Doe").unwrap();
//! assert_eq!(store.display_name("u1").as_deref(), Some("John Doe"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
mod caller;
mod capability;
mod config;
mod error;
mod origin;
mod policy;
mod procedure;
mod registry;
mod request;
mod server;
mod store;
mod token;
mod validate;

pub use caller::ServerCaller;
pub use capability::UpdateCap;
pub use config::{
    Config, ConfigError, AUDIT_CAPACITY_ENV, MAX_NAME_LEN_ENV, POLICY_ENV,
    REJECT_CONTROL_CHARS_ENV,
};
pub use error::{
    AuthorizationCode, AuthorizationError, Error, NotFoundError, ValidationError,
};
pub use origin::Origin;
pub use policy::{AuthPolicy, PolicyKind};
pub use procedure::{UpdateDisplayName, UPDATE_DISPLAY_NAME};
pub use registry::{MethodRegistry, Procedure, RegistryError};
pub use request::{CallMeta, NameUpdateRequest};
pub use server::{Server, StartError};
pub use store::{MemoryUserStore, UserRecord, UserStore, DISPLAY_NAME_FIELD};
pub use token::{TrustToken, TOKEN_ENTROPY_BYTES};
pub use validate::{
    ArgsValidator, NameRules, ValidatedArgs, AUTH_FIELD, ID_FIELD, NAME_FIELD,
};
