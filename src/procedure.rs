use std::sync::Arc;

use serde_json::Value;

use crate::audit::{AuditEvent, AuditOutcome, AuditTrail};
use crate::capability::UpdateCap;
use crate::error::Error;
use crate::policy::AuthPolicy;
use crate::registry::Procedure;
use crate::request::{CallMeta, NameUpdateRequest};
use crate::store::{UserStore, DISPLAY_NAME_FIELD};
use crate::validate::{ArgsValidator, NameRules};

/// Name under which [`UpdateDisplayName`] is registered.
pub const UPDATE_DISPLAY_NAME: &str = "updateDisplayName";

/// Server-only procedure that sets a user's display name.
///
/// Each call runs three steps in order, and stops at the first failure:
///
/// 1. validate the argument shape for the configured policy
/// 2. authorize the caller, which yields an [`UpdateCap`]
/// 3. write `profile.name` on the target record, once
///
/// A malformed request is reported as a validation error regardless of the
/// caller's origin. Nothing is written unless both checks pass.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use origin_gate::{
///     AuthPolicy, CallMeta, MemoryUserStore, Origin, UpdateDisplayName, UPDATE_DISPLAY_NAME,
/// };
/// use origin_gate::audit::AuditTrail;
/// use serde_json::json;
///
/// let store = Arc::new(MemoryUserStore::new());
/// store.insert_user("u1");
///
/// let procedure = UpdateDisplayName::new(
///     Arc::clone(&store),
///     AuthPolicy::Origin,
///     Arc::new(AuditTrail::new()),
/// );
///
/// let args = json!({ "id": "u1", "name": "John Doe" });
///
/// let external = CallMeta::new("call-1", UPDATE_DISPLAY_NAME, Origin::External);
/// assert_eq!(procedure.call(&args, &external).unwrap_err().code(), "server-only");
///
/// let internal = CallMeta::new("call-2", UPDATE_DISPLAY_NAME, Origin::Internal);
/// procedure.call(&args, &internal).unwrap();
/// assert_eq!(store.display_name("u1").as_deref(), Some("John Doe"));
/// ```
#[derive(Debug)]
pub struct UpdateDisplayName<S> {
    store: Arc<S>,
    policy: AuthPolicy,
    validator: ArgsValidator,
    audit: Arc<AuditTrail>,
}

impl<S: UserStore> UpdateDisplayName<S> {
    /// Creates the procedure with its injected collaborators.
    ///
    /// Any non-empty name is accepted until [`with_name_rules`](Self::with_name_rules)
    /// narrows it.
    pub fn new(store: Arc<S>, policy: AuthPolicy, audit: Arc<AuditTrail>) -> Self {
        let validator = ArgsValidator::new(policy.kind());
        Self {
            store,
            policy,
            validator,
            audit,
        }
    }

    /// Applies extra restrictions to the `name` argument.
    ///
    /// # Panics
    ///
    /// Panics if `rules.max_len` is `Some(0)`.
    pub fn with_name_rules(mut self, rules: NameRules) -> Self {
        self.validator = self.validator.with_rules(rules);
        self
    }

    /// Returns the active authorization policy.
    pub fn policy(&self) -> &AuthPolicy {
        &self.policy
    }

    /// Runs the procedure for one call.
    ///
    /// # Errors
    ///
    /// - `Error::Validation` if the arguments are malformed
    /// - `Error::Authorization` if the caller fails the policy
    /// - `Error::NotFound` if the target record does not exist
    pub fn call(&self, args: &Value, meta: &CallMeta) -> Result<(), Error> {
        let validated = match self.validator.validate(args) {
            Ok(validated) => validated,
            Err(e) => {
                tracing::debug!(
                    call_id = %meta.call_id,
                    method = %meta.method,
                    origin = %meta.origin,
                    field = %e.field(),
                    "rejected malformed arguments"
                );
                self.audit.record(
                    AuditEvent::new(meta, AuditOutcome::Invalid).with_code("validation-failed"),
                );
                return Err(e.into());
            }
        };

        let cap = match self.policy.authorize(meta.origin, validated.auth.as_deref()) {
            Ok(cap) => cap,
            Err(e) => {
                tracing::warn!(
                    call_id = %meta.call_id,
                    method = %meta.method,
                    origin = %meta.origin,
                    code = %e.code(),
                    "rejected unauthorized call"
                );
                self.audit.record(
                    AuditEvent::new(meta, AuditOutcome::Denied)
                        .with_code(e.code().as_str())
                        .with_subject_id(validated.request.subject_id()),
                );
                return Err(e.into());
            }
        };

        self.apply(cap, &validated.request, meta)
    }

    fn apply(
        &self,
        _cap: UpdateCap,
        request: &NameUpdateRequest,
        meta: &CallMeta,
    ) -> Result<(), Error> {
        if let Err(e) = self
            .store
            .update_field(request.subject_id(), DISPLAY_NAME_FIELD, request.new_name())
        {
            tracing::debug!(call_id = %meta.call_id, error = %e, "display name update failed");
            self.audit.record(
                AuditEvent::new(meta, AuditOutcome::Error)
                    .with_code("not-found")
                    .with_subject_id(request.subject_id()),
            );
            return Err(e.into());
        }

        tracing::info!(
            call_id = %meta.call_id,
            method = %meta.method,
            origin = %meta.origin,
            subject_id = %request.subject_id(),
            "display name updated"
        );
        self.audit.record(
            AuditEvent::new(meta, AuditOutcome::Success).with_subject_id(request.subject_id()),
        );
        Ok(())
    }
}

impl<S: UserStore> Procedure for UpdateDisplayName<S> {
    fn name(&self) -> &str {
        UPDATE_DISPLAY_NAME
    }

    fn invoke(&self, args: &Value, meta: &CallMeta) -> Result<Value, Error> {
        self.call(args, meta).map(|()| Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthorizationCode;
    use crate::origin::Origin;
    use crate::store::MemoryUserStore;
    use crate::token::TrustToken;
    use serde_json::json;

    fn setup(
        policy: AuthPolicy,
    ) -> (
        Arc<MemoryUserStore>,
        Arc<AuditTrail>,
        UpdateDisplayName<MemoryUserStore>,
    ) {
        let store = Arc::new(MemoryUserStore::new());
        store.insert_user("u1");
        let audit = Arc::new(AuditTrail::new());
        let procedure = UpdateDisplayName::new(Arc::clone(&store), policy, Arc::clone(&audit));
        (store, audit, procedure)
    }

    fn meta(origin: Origin) -> CallMeta {
        CallMeta::new("call-test", UPDATE_DISPLAY_NAME, origin)
    }

    #[test]
    fn internal_call_updates_name() {
        let (store, audit, procedure) = setup(AuthPolicy::Origin);

        procedure
            .call(&json!({ "id": "u1", "name": "John Doe" }), &meta(Origin::Internal))
            .expect("internal call succeeds");

        assert_eq!(store.display_name("u1").as_deref(), Some("John Doe"));
        assert_eq!(store.write_count(), 1);
        assert_eq!(audit.events()[0].outcome(), AuditOutcome::Success);
    }

    #[test]
    fn external_call_is_server_only() {
        let (store, audit, procedure) = setup(AuthPolicy::Origin);

        let err = procedure
            .call(&json!({ "id": "u1", "name": "John Doe" }), &meta(Origin::External))
            .unwrap_err();

        match err {
            Error::Authorization(e) => assert_eq!(e.code(), AuthorizationCode::ServerOnly),
            other => panic!("expected authorization error, got {:?}", other),
        }
        assert!(store.display_name("u1").is_none());
        assert_eq!(store.write_count(), 0);
        assert_eq!(audit.denials().len(), 1);
    }

    #[test]
    fn validation_precedes_authorization() {
        let (store, audit, procedure) = setup(AuthPolicy::Origin);

        let err = procedure
            .call(&json!({ "id": "u1" }), &meta(Origin::External))
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.write_count(), 0);
        assert_eq!(audit.events()[0].outcome(), AuditOutcome::Invalid);
        assert!(audit.denials().is_empty());
    }

    #[test]
    fn token_policy_validates_before_checking_token() {
        let token = Arc::new(TrustToken::from_value("server-secret"));
        let (store, audit, procedure) = setup(AuthPolicy::Token(token));

        for args in [
            json!({ "auth": "wrong", "id": "u1" }),
            json!({ "id": "u1", "name": 7 }),
            json!({ "auth": "wrong", "id": "", "name": "Jane" }),
        ] {
            let err = procedure.call(&args, &meta(Origin::External)).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "got {:?}", err);
        }

        assert_eq!(store.write_count(), 0);
        assert!(audit.denials().is_empty());
    }

    #[test]
    fn name_rules_narrow_accepted_names() {
        let (store, _audit, procedure) = setup(AuthPolicy::Origin);
        let procedure = procedure.with_name_rules(NameRules {
            max_len: Some(3),
            reject_control_chars: false,
        });

        let err = procedure
            .call(&json!({ "id": "u1", "name": "Jane" }), &meta(Origin::Internal))
            .unwrap_err();

        assert_eq!(err.code(), "validation-failed");
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn token_policy_accepts_matching_token() {
        let token = Arc::new(TrustToken::from_value("server-secret"));
        let (store, _audit, procedure) = setup(AuthPolicy::Token(token));

        procedure
            .call(
                &json!({ "auth": "server-secret", "id": "u1", "name": "Jane" }),
                &meta(Origin::External),
            )
            .expect("valid token");

        assert_eq!(store.display_name("u1").as_deref(), Some("Jane"));
    }

    #[test]
    fn token_policy_rejects_wrong_token() {
        let token = Arc::new(TrustToken::from_value("server-secret"));
        let (store, audit, procedure) = setup(AuthPolicy::Token(token));

        let err = procedure
            .call(
                &json!({ "auth": "server-secreT", "id": "u1", "name": "Jane" }),
                &meta(Origin::Internal),
            )
            .unwrap_err();

        assert_eq!(err.code(), "invalid-token");
        assert_eq!(store.write_count(), 0);
        assert_eq!(audit.denials()[0].code(), Some("invalid-token"));
    }

    #[test]
    fn missing_record_is_not_found() {
        let (store, audit, procedure) = setup(AuthPolicy::Origin);

        let err = procedure
            .call(&json!({ "id": "ghost", "name": "Jane" }), &meta(Origin::Internal))
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(store.write_count(), 0);
        assert_eq!(audit.events()[0].outcome(), AuditOutcome::Error);
    }

    #[test]
    fn repeated_call_is_idempotent() {
        let (store, _audit, procedure) = setup(AuthPolicy::Origin);
        let args = json!({ "id": "u1", "name": "John Doe" });

        procedure.call(&args, &meta(Origin::Internal)).unwrap();
        let after_one = store.get("u1");
        procedure.call(&args, &meta(Origin::Internal)).unwrap();

        assert_eq!(store.get("u1"), after_one);
        assert_eq!(store.display_name("u1").as_deref(), Some("John Doe"));
    }

    #[test]
    fn invoke_returns_null_on_success() {
        let (_store, _audit, procedure) = setup(AuthPolicy::Origin);

        let result = procedure.invoke(&json!({ "id": "u1", "name": "A" }), &meta(Origin::Internal));
        assert_eq!(result, Ok(Value::Null));
        assert_eq!(procedure.name(), "updateDisplayName");
    }
}
