//! Audit event schema.

use std::fmt;

use crate::origin::Origin;
use crate::request::CallMeta;

/// Outcome of an audited call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// The privileged write was applied
    Success,
    /// The caller failed the authorization policy
    Denied,
    /// The arguments failed validation
    Invalid,
    /// The call was authorized but the write failed
    Error,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Success => write!(f, "success"),
            AuditOutcome::Denied => write!(f, "denied"),
            AuditOutcome::Invalid => write!(f, "invalid"),
            AuditOutcome::Error => write!(f, "error"),
        }
    }
}

/// A structured audit event containing only safe, non-sensitive metadata.
///
/// # Example
///
/// ```
/// use origin_gate::{CallMeta, Origin};
/// use origin_gate::audit::{AuditEvent, AuditOutcome};
///
/// let meta = CallMeta::new("call-1", "updateDisplayName", Origin::External);
/// let event = AuditEvent::new(&meta, AuditOutcome::Denied).with_code("server-only");
///
/// assert_eq!(event.origin(), Origin::External);
/// assert_eq!(event.code(), Some("server-only"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    call_id: String,
    method: String,
    origin: Origin,
    outcome: AuditOutcome,
    /// Stable error code for non-success outcomes
    code: Option<&'static str>,
    /// Target record id, known only once arguments validated
    subject_id: Option<String>,
}

impl AuditEvent {
    /// Creates an event for the call described by `meta`.
    pub fn new(meta: &CallMeta, outcome: AuditOutcome) -> Self {
        Self {
            call_id: meta.call_id.clone(),
            method: meta.method.clone(),
            origin: meta.origin,
            outcome,
            code: None,
            subject_id: None,
        }
    }

    /// Sets the stable error code.
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    /// Sets the target record id.
    pub fn with_subject_id(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    /// Returns the call identifier.
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Returns the invoked method name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the call origin.
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Returns the outcome.
    pub fn outcome(&self) -> AuditOutcome {
        self.outcome
    }

    /// Returns the error code, if any.
    pub fn code(&self) -> Option<&'static str> {
        self.code
    }

    /// Returns the target record id, if known.
    pub fn subject_id(&self) -> Option<&str> {
        self.subject_id.as_deref()
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuditEvent[method={}, outcome={}, call_id={}, origin={}",
            self.method, self.outcome, self.call_id, self.origin
        )?;

        if let Some(code) = self.code {
            write!(f, ", code={}", code)?;
        }
        if let Some(subject_id) = &self.subject_id {
            write!(f, ", subject_id={}", subject_id)?;
        }

        write!(f, "]")
    }
}
