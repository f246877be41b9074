//! Named dispatch of remote-callable procedures.
//!
//! The registry stands in for the host's remote-method mechanism: it maps a
//! method name to exactly one [`Procedure`], assigns each call an id, and
//! hands the procedure the caller's [`Origin`] as reported by the transport.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::error::Error;
use crate::origin::Origin;
use crate::request::CallMeta;

/// A named operation invocable through the registry.
pub trait Procedure: Send + Sync {
    /// Returns the name the procedure is registered under.
    fn name(&self) -> &str;

    /// Runs the procedure for one call.
    ///
    /// # Errors
    ///
    /// Returns the procedure's typed failure; the registry passes it through unchanged.
    fn invoke(&self, args: &Value, meta: &CallMeta) -> Result<Value, Error>;
}

/// Error returned when registering a procedure fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A procedure with this name is already registered
    Duplicate {
        /// The conflicting name
        name: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Duplicate { name } => {
                write!(f, "procedure '{}' is already registered", name)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Registry of remote-callable procedures.
///
/// Registering a second procedure under a name that is already taken fails
/// and leaves the first registration in place.
#[derive(Default)]
pub struct MethodRegistry {
    procedures: HashMap<String, Arc<dyn Procedure>>,
    next_call: AtomicU64,
}

impl MethodRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `procedure` under its own name.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Duplicate` if the name is already taken.
    pub fn register(&mut self, procedure: Arc<dyn Procedure>) -> Result<(), RegistryError> {
        let name = procedure.name().to_string();
        if self.procedures.contains_key(&name) {
            return Err(RegistryError::Duplicate { name });
        }

        tracing::debug!(method = %name, "registered procedure");
        self.procedures.insert(name, procedure);
        Ok(())
    }

    /// Returns `true` if a procedure is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    /// Returns the registered method names, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.procedures.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Dispatches a call to the procedure registered under `method`.
    ///
    /// # Errors
    ///
    /// Returns `Error::MethodNotFound` for an unknown method, otherwise
    /// whatever the procedure returns.
    pub fn dispatch(&self, method: &str, args: &Value, origin: Origin) -> Result<Value, Error> {
        let procedure = self.procedures.get(method).ok_or_else(|| Error::MethodNotFound {
            method: method.to_string(),
        })?;

        let meta = CallMeta::new(self.next_call_id(), method, origin);
        tracing::trace!(call_id = %meta.call_id, method = %method, origin = %origin, "dispatching call");

        procedure.invoke(args, &meta)
    }

    fn next_call_id(&self) -> String {
        let n = self.next_call.fetch_add(1, Ordering::Relaxed) + 1;
        format!("call-{}", n)
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct Echo {
        name: &'static str,
        seen: Mutex<Vec<CallMeta>>,
    }

    impl Echo {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl Procedure for Echo {
        fn name(&self) -> &str {
            self.name
        }

        fn invoke(&self, args: &Value, meta: &CallMeta) -> Result<Value, Error> {
            self.seen.lock().unwrap().push(meta.clone());
            Ok(args.clone())
        }
    }

    #[test]
    fn dispatch_reaches_registered_procedure() {
        let echo = Echo::new("echo");
        let mut registry = MethodRegistry::new();
        registry.register(echo.clone()).unwrap();

        let result = registry.dispatch("echo", &json!({ "x": 1 }), Origin::External).unwrap();
        assert_eq!(result, json!({ "x": 1 }));

        let seen = echo.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, "echo");
        assert_eq!(seen[0].origin, Origin::External);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let first = Echo::new("echo");
        let second = Echo::new("echo");
        let mut registry = MethodRegistry::new();

        registry.register(first.clone()).unwrap();
        let err = registry.register(second.clone()).unwrap_err();
        assert_eq!(
            err,
            RegistryError::Duplicate {
                name: "echo".to_string()
            }
        );

        registry.dispatch("echo", &Value::Null, Origin::Internal).unwrap();
        assert_eq!(first.seen.lock().unwrap().len(), 1);
        assert!(second.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_method_is_not_found() {
        let registry = MethodRegistry::new();

        let err = registry.dispatch("missing", &Value::Null, Origin::Internal).unwrap_err();
        assert_eq!(err.code(), "method-not-found");
    }

    #[test]
    fn call_ids_are_unique() {
        let echo = Echo::new("echo");
        let mut registry = MethodRegistry::new();
        registry.register(echo.clone()).unwrap();

        registry.dispatch("echo", &Value::Null, Origin::Internal).unwrap();
        registry.dispatch("echo", &Value::Null, Origin::Internal).unwrap();

        let seen = echo.seen.lock().unwrap();
        assert_ne!(seen[0].call_id, seen[1].call_id);
    }

    #[test]
    fn methods_are_sorted() {
        let mut registry = MethodRegistry::new();
        registry.register(Echo::new("zeta")).unwrap();
        registry.register(Echo::new("alpha")).unwrap();

        assert_eq!(registry.methods(), vec!["alpha", "zeta"]);
        assert!(registry.contains("zeta"));
        assert!(!registry.contains("beta"));
    }
}
