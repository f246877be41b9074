//! Shape validation for untrusted call arguments.
//!
//! Arguments arrive as a single JSON object. Every field is checked before
//! any authorization decision is made, and a rejected value is never echoed
//! back in the error.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::policy::PolicyKind;
use crate::request::NameUpdateRequest;

/// Wire name of the trust token field.
pub const AUTH_FIELD: &str = "auth";
/// Wire name of the subject id field.
pub const ID_FIELD: &str = "id";
/// Wire name of the new display name field.
pub const NAME_FIELD: &str = "name";

/// Field name reported when the arguments as a whole are malformed.
///
/// Unexpected keys are reported under this name too, so client-chosen text
/// never reaches error messages or logs.
const ARGS: &str = "<args>";

/// Optional restrictions on display names.
///
/// By default any non-empty string is accepted and stored verbatim.
///
/// # Examples
///
/// ```
/// use origin_gate::{ArgsValidator, NameRules, PolicyKind};
/// use serde_json::json;
///
/// let validator = ArgsValidator::new(PolicyKind::Origin).with_rules(NameRules {
///     max_len: Some(8),
///     reject_control_chars: true,
/// });
///
/// assert!(validator.validate(&json!({ "id": "u1", "name": "Ann\tLee" })).is_err());
/// assert!(validator.validate(&json!({ "id": "u1", "name": "Ann Lee" })).is_ok());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NameRules {
    /// Upper bound on name length in bytes; `None` means unlimited
    pub max_len: Option<usize>,
    /// Reject names containing control characters
    pub reject_control_chars: bool,
}

/// Arguments that passed shape validation.
pub struct ValidatedArgs {
    /// The validated request
    pub request: NameUpdateRequest,
    /// The presented trust token; always `None` under the origin policy
    pub auth: Option<String>,
}

impl fmt::Debug for ValidatedArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedArgs")
            .field("request", &self.request)
            .field("auth", &self.auth.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Validates raw call arguments against the shape the active policy expects.
///
/// Under the origin policy the object must hold exactly `id` and `name`.
/// Under the token policy it may also hold `auth`; a missing `auth` is left
/// for the policy to reject. All fields must be strings, and `id` and `name`
/// must not be empty. Anything else about the name is governed by
/// [`NameRules`].
///
/// # Examples
///
/// ```
/// use origin_gate::{ArgsValidator, PolicyKind};
/// use serde_json::json;
///
/// let validator = ArgsValidator::new(PolicyKind::Origin);
///
/// let ok = validator.validate(&json!({ "id": "u1", "name": "John Doe" }));
/// assert_eq!(ok.unwrap().request.new_name(), "John Doe");
///
/// let err = validator.validate(&json!({ "id": "u1" })).unwrap_err();
/// assert_eq!(err.field(), "name");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ArgsValidator {
    kind: PolicyKind,
    rules: NameRules,
}

impl ArgsValidator {
    /// Creates a validator for the given policy with no extra name rules.
    pub fn new(kind: PolicyKind) -> Self {
        Self {
            kind,
            rules: NameRules::default(),
        }
    }

    /// Applies `rules` to the `name` field.
    ///
    /// # Panics
    ///
    /// Panics if `rules.max_len` is `Some(0)`.
    pub fn with_rules(mut self, rules: NameRules) -> Self {
        assert!(rules.max_len != Some(0), "max_len must be greater than 0");
        self.rules = rules;
        self
    }

    /// Returns the field names this validator accepts, in check order.
    pub fn expected_fields(&self) -> &'static [&'static str] {
        match self.kind {
            PolicyKind::Token => &[AUTH_FIELD, ID_FIELD, NAME_FIELD],
            PolicyKind::Origin => &[ID_FIELD, NAME_FIELD],
        }
    }

    /// Validates `args`, reporting the first violation found.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if `args` is not an object, a required field
    /// is missing, a known field is not a string, `id` or `name` is empty,
    /// `name` breaks the configured [`NameRules`], or an unexpected field is
    /// present.
    pub fn validate(&self, args: &Value) -> Result<ValidatedArgs, ValidationError> {
        let object = args
            .as_object()
            .ok_or_else(|| ValidationError::new(ARGS, "expected an object"))?;

        let auth = match self.kind {
            PolicyKind::Token => optional_string(object, AUTH_FIELD)?.map(str::to_string),
            PolicyKind::Origin => None,
        };

        let id = required_string(object, ID_FIELD)?;
        if id.is_empty() {
            return Err(ValidationError::new(ID_FIELD, "must not be empty"));
        }

        let name = required_string(object, NAME_FIELD)?;
        self.check_name(name)?;

        let expected = self.expected_fields();
        if object.keys().any(|k| !expected.contains(&k.as_str())) {
            return Err(ValidationError::new(ARGS, "unexpected field"));
        }

        Ok(ValidatedArgs {
            request: NameUpdateRequest::new_unchecked(id.to_string(), name.to_string()),
            auth,
        })
    }

    fn check_name(&self, name: &str) -> Result<(), ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::new(NAME_FIELD, "must not be empty"));
        }

        if self.rules.reject_control_chars && name.chars().any(char::is_control) {
            return Err(ValidationError::new(
                NAME_FIELD,
                "contains control or non-printable characters",
            ));
        }

        if let Some(max_len) = self.rules.max_len {
            if name.len() > max_len {
                return Err(ValidationError::new(
                    NAME_FIELD,
                    format!("exceeds maximum length of {}", max_len),
                ));
            }
        }

        Ok(())
    }
}

fn optional_string<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a str>, ValidationError> {
    match object.get(field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ValidationError::new(field, "expected a string")),
    }
}

fn required_string<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match object.get(field) {
        None => Err(ValidationError::new(field, "missing required field")),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ValidationError::new(field, "expected a string")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn origin_validator() -> ArgsValidator {
        ArgsValidator::new(PolicyKind::Origin)
    }

    fn token_validator() -> ArgsValidator {
        ArgsValidator::new(PolicyKind::Token)
    }

    #[test]
    fn accepts_well_formed_origin_args() {
        let args = origin_validator()
            .validate(&json!({ "id": "u1", "name": "John Doe" }))
            .expect("valid args");

        assert_eq!(args.request.subject_id(), "u1");
        assert_eq!(args.request.new_name(), "John Doe");
        assert!(args.auth.is_none());
    }

    #[test]
    fn accepts_well_formed_token_args() {
        let args = token_validator()
            .validate(&json!({ "auth": "t0k3n", "id": "u1", "name": "John Doe" }))
            .expect("valid args");

        assert_eq!(args.auth.as_deref(), Some("t0k3n"));
    }

    #[test]
    fn rejects_non_object() {
        let err = origin_validator().validate(&json!(["u1", "John"])).unwrap_err();
        assert_eq!(err.field(), "<args>");

        let err = origin_validator().validate(&Value::Null).unwrap_err();
        assert_eq!(err.field(), "<args>");
    }

    #[test]
    fn rejects_missing_fields() {
        let err = origin_validator().validate(&json!({ "id": "u1" })).unwrap_err();
        assert_eq!(err.field(), "name");
        assert_eq!(err.reason(), "missing required field");

        let err = origin_validator()
            .validate(&json!({ "name": "John" }))
            .unwrap_err();
        assert_eq!(err.field(), "id");
    }

    #[test]
    fn token_shape_leaves_missing_auth_to_policy() {
        let args = token_validator()
            .validate(&json!({ "id": "u1", "name": "John" }))
            .expect("auth is optional in shape");
        assert!(args.auth.is_none());
    }

    #[test]
    fn origin_shape_rejects_auth_as_extra() {
        let err = origin_validator()
            .validate(&json!({ "auth": "x", "id": "u1", "name": "John" }))
            .unwrap_err();
        assert_eq!(err.field(), "<args>");
        assert_eq!(err.reason(), "unexpected field");
    }

    #[test]
    fn unexpected_key_is_not_echoed() {
        let err = origin_validator()
            .validate(&json!({ "id": "u1", "name": "John", "evil\nkey": 1 }))
            .unwrap_err();

        assert_eq!(err.field(), "<args>");
        assert!(!err.to_string().contains("evil"));
    }

    #[test]
    fn rejects_wrong_types() {
        let err = origin_validator()
            .validate(&json!({ "id": 42, "name": "John" }))
            .unwrap_err();
        assert_eq!(err.field(), "id");
        assert_eq!(err.reason(), "expected a string");

        let err = token_validator()
            .validate(&json!({ "auth": null, "id": "u1", "name": "John" }))
            .unwrap_err();
        assert_eq!(err.field(), "auth");
    }

    #[test]
    fn rejects_empty_values() {
        let err = origin_validator()
            .validate(&json!({ "id": "", "name": "John" }))
            .unwrap_err();
        assert_eq!(err.field(), "id");

        let err = origin_validator()
            .validate(&json!({ "id": "u1", "name": "" }))
            .unwrap_err();
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn accepts_any_non_empty_name_by_default() {
        let long = "x".repeat(300);
        for name in ["   ", "Ann\tLee", long.as_str()] {
            let args = origin_validator()
                .validate(&json!({ "id": " ", "name": name }))
                .expect("non-empty strings are well-formed");
            assert_eq!(args.request.new_name(), name);
        }
    }

    #[test]
    fn rejects_control_chars_when_configured() {
        let validator = origin_validator().with_rules(NameRules {
            reject_control_chars: true,
            ..NameRules::default()
        });

        let err = validator
            .validate(&json!({ "id": "u1", "name": "John\nDoe" }))
            .unwrap_err();
        assert_eq!(err.field(), "name");
        assert!(!err.to_string().contains("John"));
    }

    #[test]
    fn enforces_name_length_when_configured() {
        let validator = origin_validator().with_rules(NameRules {
            max_len: Some(4),
            ..NameRules::default()
        });

        assert!(validator.validate(&json!({ "id": "u1", "name": "John" })).is_ok());

        let err = validator
            .validate(&json!({ "id": "u1", "name": "Johnny" }))
            .unwrap_err();
        assert!(err.reason().contains("maximum length of 4"));
    }

    #[test]
    fn keeps_name_verbatim() {
        let args = origin_validator()
            .validate(&json!({ "id": "u1", "name": " John " }))
            .unwrap();
        assert_eq!(args.request.new_name(), " John ");
    }

    #[test]
    fn debug_redacts_presented_token() {
        let args = token_validator()
            .validate(&json!({ "auth": "very-secret", "id": "u1", "name": "John" }))
            .unwrap();

        let debug = format!("{:?}", args);
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    #[should_panic(expected = "max_len must be greater than 0")]
    fn zero_max_len_panics() {
        let _ = origin_validator().with_rules(NameRules {
            max_len: Some(0),
            ..NameRules::default()
        });
    }
}
