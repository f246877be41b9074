//! Audit trail for server-only procedure calls.
//!
//! This module provides:
//! - `AuditEvent`: Structured record of one gated call outcome
//! - `AuditTrail`: Thread-safe, bounded in-memory recorder that also emits each event via tracing
//!
//! Events never carry the trust token or the rejected argument values;
//! only call metadata, the target id and stable outcome codes are recorded.

mod event;
mod trail;

pub use event::{AuditEvent, AuditOutcome};
pub use trail::{AuditTrail, DEFAULT_AUDIT_CAPACITY};
