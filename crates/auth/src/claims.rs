//! Reduce already-verified token claims to a [`Principal`].
//!
//! Decoding and signature verification happen elsewhere; this only reads the
//! realm-roles claim out of the decoded JSON payload.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::{Principal, Role};

#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("claims payload is not a JSON object")]
    NotAnObject,

    #[error("realm_access.roles is not an array of strings")]
    MalformedRoles(#[source] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
struct RealmAccess {
    #[serde(default)]
    roles: Vec<String>,
}

/// Build a principal from the `realm_access.roles` claim.
///
/// A missing `realm_access` (or missing `roles` inside it) yields a principal
/// with no roles, which every guarded operation denies.
pub fn principal_from_claims(claims: &Value) -> Result<Principal, ClaimsError> {
    let object = claims.as_object().ok_or(ClaimsError::NotAnObject)?;

    let realm_access = match object.get("realm_access") {
        None | Some(Value::Null) => RealmAccess::default(),
        Some(value) => {
            RealmAccess::deserialize(value).map_err(ClaimsError::MalformedRoles)?
        }
    };

    Ok(Principal::new(
        realm_access.roles.into_iter().map(Role::from).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_realm_roles() {
        let claims = json!({
            "sub": "4c1f",
            "realm_access": { "roles": ["mioc", "service_engineer"] }
        });
        let principal = principal_from_claims(&claims).unwrap();
        let names: Vec<&str> = principal.roles().iter().map(Role::as_str).collect();
        assert_eq!(names, vec!["mioc", "service_engineer"]);
    }

    #[test]
    fn missing_claim_is_anonymous() {
        let principal = principal_from_claims(&json!({ "sub": "4c1f" })).unwrap();
        assert!(principal.is_anonymous());

        let principal = principal_from_claims(&json!({ "realm_access": {} })).unwrap();
        assert!(principal.is_anonymous());
    }

    #[test]
    fn malformed_roles_are_rejected() {
        let err = principal_from_claims(&json!({ "realm_access": { "roles": "admin" } }))
            .unwrap_err();
        assert!(matches!(err, ClaimsError::MalformedRoles(_)));

        let err = principal_from_claims(&json!({ "realm_access": { "roles": [1, 2] } }))
            .unwrap_err();
        assert!(matches!(err, ClaimsError::MalformedRoles(_)));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(matches!(
            principal_from_claims(&json!(["admin"])).unwrap_err(),
            ClaimsError::NotAnObject
        ));
    }
}
