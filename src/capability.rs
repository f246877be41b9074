/// Capability granting permission to perform the privileged display-name write.
///
/// This is a zero-sized proof that a call passed validation and its
/// authorization policy. It cannot be constructed outside this crate; only
/// [`AuthPolicy::authorize`](crate::AuthPolicy::authorize) mints one.
#[derive(Debug)]
pub struct UpdateCap {
    // Private field prevents construction outside the crate
    _private: (),
}

impl UpdateCap {
    /// Creates a new `UpdateCap`.
    ///
    /// This is `pub(crate)` so only the authorization step can grant it.
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}
