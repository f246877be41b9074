use crate::origin::Origin;

/// Metadata about one procedure invocation.
///
/// Built by the transport (or the method registry on its behalf) and passed
/// to the procedure next to the raw arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMeta {
    /// Unique identifier for this call, used to correlate logs and audit events
    pub call_id: String,
    /// Name of the invoked procedure
    pub method: String,
    /// Where the call came from
    pub origin: Origin,
}

impl CallMeta {
    /// Creates call metadata.
    pub fn new(call_id: impl Into<String>, method: impl Into<String>, origin: Origin) -> Self {
        Self {
            call_id: call_id.into(),
            method: method.into(),
            origin,
        }
    }
}

/// A validated request to change a user's display name.
///
/// Values of this type only come out of
/// [`ArgsValidator::validate`](crate::ArgsValidator::validate), so both
/// fields are known to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameUpdateRequest {
    subject_id: String,
    new_name: String,
}

impl NameUpdateRequest {
    pub(crate) fn new_unchecked(subject_id: String, new_name: String) -> Self {
        Self {
            subject_id,
            new_name,
        }
    }

    /// Returns the id of the record to update.
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Returns the new display name.
    pub fn new_name(&self) -> &str {
        &self.new_name
    }
}
