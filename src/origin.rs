use std::fmt;

/// Where a procedure call came from.
///
/// The transport layer decides the origin and hands it to the procedure
/// alongside the call arguments. Procedures never infer it from connection
/// state themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Issued by trusted code running inside the server process.
    Internal,
    /// Arrived over a network connection from an untrusted client.
    External,
}

impl Origin {
    /// Returns `true` for calls issued inside the server process.
    pub fn is_internal(self) -> bool {
        matches!(self, Origin::Internal)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Internal => write!(f, "internal"),
            Origin::External => write!(f, "external"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_internal_is_internal() {
        assert!(Origin::Internal.is_internal());
        assert!(!Origin::External.is_internal());
    }

    #[test]
    fn origin_display() {
        assert_eq!(Origin::Internal.to_string(), "internal");
        assert_eq!(Origin::External.to_string(), "external");
    }
}
