//! In-memory audit trail recorder.

use super::{AuditEvent, AuditOutcome};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Number of events an [`AuditTrail`] keeps unless configured otherwise.
pub const DEFAULT_AUDIT_CAPACITY: usize = 1024;

/// Thread-safe, bounded recorder for audit events.
///
/// The trail holds at most `capacity` events; once full, recording a new
/// event evicts the oldest one. Every recorded event is also emitted as a
/// structured `tracing` event under the `origin_gate::audit` target, at
/// `warn` for denials and `info` otherwise.
///
/// # Example
///
/// ```
/// use origin_gate::{CallMeta, Origin};
/// use origin_gate::audit::{AuditEvent, AuditOutcome, AuditTrail};
///
/// let trail = AuditTrail::new();
/// let meta = CallMeta::new("call-1", "updateDisplayName", Origin::External);
///
/// trail.record(AuditEvent::new(&meta, AuditOutcome::Denied));
///
/// assert_eq!(trail.len(), 1);
/// assert_eq!(trail.denials().len(), 1);
/// ```
#[derive(Debug)]
pub struct AuditTrail {
    events: Mutex<VecDeque<AuditEvent>>,
    capacity: usize,
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }
}

impl AuditTrail {
    /// Creates a new empty audit trail with the default capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty audit trail holding at most `capacity` events.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "audit capacity must be greater than 0");
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_AUDIT_CAPACITY))),
            capacity,
        }
    }

    /// Returns the maximum number of events kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records an audit event.
    ///
    /// Events are stored in the order they are recorded. When the trail is
    /// full the oldest event is dropped.
    pub fn record(&self, event: AuditEvent) {
        match event.outcome() {
            AuditOutcome::Denied => tracing::warn!(
                target: "origin_gate::audit",
                call_id = %event.call_id(),
                method = %event.method(),
                origin = %event.origin(),
                outcome = %event.outcome(),
                code = event.code().unwrap_or(""),
                "call denied"
            ),
            _ => tracing::info!(
                target: "origin_gate::audit",
                call_id = %event.call_id(),
                method = %event.method(),
                origin = %event.origin(),
                outcome = %event.outcome(),
                code = event.code().unwrap_or(""),
                "call audited"
            ),
        }

        let mut events = self.lock();
        if events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Returns a snapshot of the retained events, oldest first.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.lock().iter().cloned().collect()
    }

    /// Returns a snapshot of the events with outcome `Denied`.
    pub fn denials(&self) -> Vec<AuditEvent> {
        self.lock()
            .iter()
            .filter(|e| e.outcome() == AuditOutcome::Denied)
            .cloned()
            .collect()
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Clears all recorded events.
    pub fn clear(&self) {
        self.lock().clear();
    }

    // A panic while holding the lock cannot leave a half-pushed event behind.
    fn lock(&self) -> MutexGuard<'_, VecDeque<AuditEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
