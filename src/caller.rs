use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::Error;
use crate::origin::Origin;
use crate::procedure::UPDATE_DISPLAY_NAME;
use crate::registry::MethodRegistry;
use crate::token::TrustToken;
use crate::validate::{AUTH_FIELD, ID_FIELD, NAME_FIELD};

/// Trusted in-process caller for server-only procedures.
///
/// Calls made through a `ServerCaller` are dispatched with
/// [`Origin::Internal`]. When the token policy is active the caller also
/// attaches the process trust token, so the same call succeeds under either
/// policy. Failures are logged with the error the call returned and then
/// handed back to the caller.
#[derive(Debug, Clone)]
pub struct ServerCaller {
    registry: Arc<MethodRegistry>,
    token: Option<Arc<TrustToken>>,
}

impl ServerCaller {
    /// Creates a caller over `registry`, attaching `token` when present.
    pub fn new(registry: Arc<MethodRegistry>, token: Option<Arc<TrustToken>>) -> Self {
        Self { registry, token }
    }

    /// Sets the display name of `subject_id` through the server-only procedure.
    ///
    /// # Errors
    ///
    /// Returns whatever the procedure returned; the error is also logged.
    pub fn update_display_name(&self, subject_id: &str, new_name: &str) -> Result<(), Error> {
        let mut args = Map::new();
        args.insert(ID_FIELD.to_string(), Value::from(subject_id));
        args.insert(NAME_FIELD.to_string(), Value::from(new_name));

        self.call(UPDATE_DISPLAY_NAME, args).map(|_| ())
    }

    /// Invokes `method` with `args` as a trusted internal call.
    ///
    /// # Errors
    ///
    /// Returns whatever the procedure returned; the error is also logged.
    pub fn call(&self, method: &str, mut args: Map<String, Value>) -> Result<Value, Error> {
        if let Some(token) = &self.token {
            args.insert(
                AUTH_FIELD.to_string(),
                Value::from(token.expose_secret()),
            );
        }

        self.registry
            .dispatch(method, &Value::Object(args), Origin::Internal)
            .inspect_err(|error| {
                tracing::error!(method = %method, code = error.code(), %error, "server-side call failed");
            })
    }
}
