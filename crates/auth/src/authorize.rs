use serde::Serialize;
use thiserror::Error;

use crate::{Role, RoleRegistry};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unauthenticated: principal carries no roles")]
    Unauthenticated,

    #[error("forbidden: none of the required permissions {0:?} is granted")]
    Forbidden(Vec<String>),
}

/// Fine-grained permission checks against a [`RoleRegistry`].
///
/// - No IO
/// - No panics
/// - No state beyond the borrowed registry
#[derive(Debug, Clone, Copy)]
pub struct Authorizer<'a> {
    registry: &'a RoleRegistry,
}

impl<'a> Authorizer<'a> {
    pub fn new(registry: &'a RoleRegistry) -> Self {
        Self { registry }
    }

    /// May a principal holding `roles` perform an operation requiring
    /// `required`?
    ///
    /// Precedence, first applicable rule wins:
    ///
    /// 1. an empty requirement list is allowed (fail-open);
    /// 2. an empty role list is denied;
    /// 3. the `admin` role is allowed regardless of registry contents;
    /// 4. otherwise allowed iff some granted pattern of some role matches
    ///    some required permission.
    ///
    /// Rule 1 means an operation nobody attached a requirement to is
    /// unguarded. Callers must treat a missing requirement as a policy gap,
    /// not as "public".
    ///
    /// Rule 4 is OR across the required list, not AND. A caller that needs
    /// every permission in a list must check them one at a time.
    pub fn is_authorized<R, P>(&self, roles: &[R], required: &[P]) -> bool
    where
        R: AsRef<str>,
        P: AsRef<str>,
    {
        if required.is_empty() {
            return true;
        }
        if roles.is_empty() {
            return false;
        }
        if roles.iter().any(|r| r.as_ref() == Role::ADMIN) {
            return true;
        }

        self.first_match(roles, required).is_some()
    }

    /// [`Authorizer::is_authorized`] as a `Result`, for guard call sites.
    pub fn authorize<R, P>(&self, roles: &[R], required: &[P]) -> Result<(), AuthzError>
    where
        R: AsRef<str>,
        P: AsRef<str>,
    {
        if self.is_authorized(roles, required) {
            return Ok(());
        }
        if roles.is_empty() {
            return Err(AuthzError::Unauthenticated);
        }
        Err(AuthzError::Forbidden(
            required.iter().map(|p| p.as_ref().to_string()).collect(),
        ))
    }

    /// Explain why a decision was made (or would be made).
    ///
    /// `granted` always agrees with [`Authorizer::is_authorized`] for the same
    /// inputs. For a match, the reported triple is the first one found walking
    /// required permissions, then roles (input order), then each role's
    /// patterns (sorted).
    pub fn explain<R, P>(&self, roles: &[R], required: &[P]) -> AuthorizationExplanation
    where
        R: AsRef<str>,
        P: AsRef<str>,
    {
        let role_names: Vec<String> = roles.iter().map(|r| r.as_ref().to_string()).collect();
        let required_list: Vec<String> = required.iter().map(|p| p.as_ref().to_string()).collect();

        let basis = if required.is_empty() {
            DecisionBasis::NoRequirement
        } else if roles.is_empty() {
            DecisionBasis::Unauthenticated
        } else if roles.iter().any(|r| r.as_ref() == Role::ADMIN) {
            DecisionBasis::AdminBypass
        } else if let Some((role, pattern, req)) = self.first_match(roles, required) {
            DecisionBasis::Matched {
                role: role.to_string(),
                pattern: pattern.to_string(),
                required: req.to_string(),
            }
        } else {
            let unknown_roles = role_names
                .iter()
                .filter(|r| !self.registry.contains(r))
                .cloned()
                .collect();
            DecisionBasis::NoMatchingGrant { unknown_roles }
        };

        AuthorizationExplanation {
            granted: basis.is_granted(),
            reason: basis.describe(),
            roles: role_names,
            required: required_list,
            basis,
        }
    }

    fn first_match<'r, R, P>(
        &self,
        roles: &'r [R],
        required: &'r [P],
    ) -> Option<(&'r str, &'a str, &'r str)>
    where
        R: AsRef<str>,
        P: AsRef<str>,
    {
        required.iter().map(|p| p.as_ref()).find_map(|req| {
            roles.iter().map(|r| r.as_ref()).find_map(|role| {
                self.registry
                    .permissions_for(role)
                    .iter()
                    .find(|granted| granted.matches(req))
                    .map(|granted| (role, granted.as_str(), req))
            })
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed, serializable explanation of one decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationExplanation {
    pub roles: Vec<String>,
    pub required: Vec<String>,
    pub granted: bool,
    /// Human-readable reason for the decision.
    pub reason: String,
    pub basis: DecisionBasis,
}

/// Which precedence rule decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionBasis {
    NoRequirement,
    Unauthenticated,
    AdminBypass,
    Matched {
        role: String,
        pattern: String,
        required: String,
    },
    NoMatchingGrant {
        /// Roles the registry does not know (they grant nothing).
        unknown_roles: Vec<String>,
    },
}

impl DecisionBasis {
    pub fn is_granted(&self) -> bool {
        matches!(
            self,
            Self::NoRequirement | Self::AdminBypass | Self::Matched { .. }
        )
    }

    fn describe(&self) -> String {
        match self {
            Self::NoRequirement => {
                "Operation declares no required permission; allowed (fail-open)".to_string()
            }
            Self::Unauthenticated => "Principal carries no roles".to_string(),
            Self::AdminBypass => format!("Principal holds the '{}' role", Role::ADMIN),
            Self::Matched {
                role,
                pattern,
                required,
            } => format!("Role '{role}' grants '{pattern}', which covers '{required}'"),
            Self::NoMatchingGrant { unknown_roles } if unknown_roles.is_empty() => {
                "No granted pattern of any held role covers a required permission".to_string()
            }
            Self::NoMatchingGrant { unknown_roles } => format!(
                "No granted pattern of any held role covers a required permission \
                 (unregistered roles: {unknown_roles:?})"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PermissionPattern, RoleGrant};
    use proptest::prelude::*;

    fn registry() -> RoleRegistry {
        let mut builder = RoleRegistry::builder();
        builder
            .register(RoleGrant::new("mioc").with_permissions(["api.mioc.*"]).unwrap())
            .unwrap()
            .register(
                RoleGrant::new("service")
                    .with_permissions(["api.mettbot.*", "api.mettpole.*"])
                    .unwrap(),
            )
            .unwrap()
            .register(RoleGrant::new("reporter").with_permissions(["api.report.read"]).unwrap())
            .unwrap();
        builder.build()
    }

    const NONE: [&str; 0] = [];

    #[test]
    fn empty_requirement_is_fail_open() {
        let registry = registry();
        let authz = Authorizer::new(&registry);
        assert!(authz.is_authorized(&["mioc"], &NONE));
        // Even without roles: rule 1 precedes rule 2.
        assert!(authz.is_authorized(&NONE, &NONE));
    }

    #[test]
    fn no_roles_is_denied() {
        let registry = registry();
        let authz = Authorizer::new(&registry);
        assert!(!authz.is_authorized(&NONE, &["api.mioc.status"]));
        assert_eq!(
            authz.authorize(&NONE, &["api.mioc.status"]),
            Err(AuthzError::Unauthenticated)
        );
    }

    #[test]
    fn admin_bypasses_registry() {
        // "admin" is not even registered here.
        let registry = registry();
        let authz = Authorizer::new(&registry);
        assert!(authz.is_authorized(&["admin"], &["anything.at.all"]));
        assert!(authz.is_authorized(&["unknown", "admin"], &["api.x"]));
    }

    #[test]
    fn wildcard_grant_scopes_to_namespace() {
        let registry = registry();
        let authz = Authorizer::new(&registry);
        assert!(authz.is_authorized(&["mioc"], &["api.mioc.status"]));
        assert!(!authz.is_authorized(&["mioc"], &["api.mettbot.status"]));
    }

    #[test]
    fn or_across_roles() {
        let registry = registry();
        let authz = Authorizer::new(&registry);
        assert!(authz.is_authorized(&["mioc", "service"], &["api.mettbot.status"]));
        assert!(!authz.is_authorized(&["mioc", "reporter"], &["api.mettbot.status"]));
    }

    #[test]
    fn or_across_required_permissions() {
        // A multi-permission requirement is satisfied by ANY one entry. Call
        // sites listing several permissions most likely meant AND; this pins
        // the current behavior so a change is deliberate.
        let registry = registry();
        let authz = Authorizer::new(&registry);
        assert!(authz.is_authorized(&["reporter"], &["api.mettbot.restart", "api.report.read"]));
        assert!(!authz.is_authorized(&["reporter"], &["api.mettbot.restart", "api.report.write"]));
    }

    #[test]
    fn unknown_role_grants_nothing() {
        let registry = registry();
        let authz = Authorizer::new(&registry);
        assert!(!authz.is_authorized(&["unknown-role"], &["api.mioc.status"]));
        assert_eq!(
            authz.authorize(&["unknown-role"], &["api.mioc.status"]),
            Err(AuthzError::Forbidden(vec!["api.mioc.status".to_string()]))
        );
    }

    #[test]
    fn explain_reports_matching_triple() {
        let registry = registry();
        let authz = Authorizer::new(&registry);
        let explanation = authz.explain(&["mioc", "service"], &["api.mettbot.status"]);
        assert!(explanation.granted);
        assert_eq!(
            explanation.basis,
            DecisionBasis::Matched {
                role: "service".to_string(),
                pattern: "api.mettbot.*".to_string(),
                required: "api.mettbot.status".to_string(),
            }
        );
    }

    #[test]
    fn explain_lists_unknown_roles_on_denial() {
        let registry = registry();
        let authz = Authorizer::new(&registry);
        let explanation = authz.explain(&["mioc", "ghost"], &["api.mettbot.status"]);
        assert!(!explanation.granted);
        assert_eq!(
            explanation.basis,
            DecisionBasis::NoMatchingGrant {
                unknown_roles: vec!["ghost".to_string()]
            }
        );
        assert!(explanation.reason.contains("ghost"));
    }

    #[test]
    fn explanation_serializes_with_kind_tag() {
        let registry = registry();
        let authz = Authorizer::new(&registry);
        let json = serde_json::to_value(authz.explain(&["admin"], &["api.x"])).unwrap();
        assert_eq!(json["granted"], true);
        assert_eq!(json["basis"]["kind"], "admin_bypass");
    }

    #[test]
    fn pattern_type_is_used_by_registry() {
        let registry = registry();
        assert!(
            registry
                .permissions_for("mioc")
                .contains(&PermissionPattern::parse("api.mioc.*").unwrap())
        );
    }

    fn role_name() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("mioc".to_string()),
            Just("service".to_string()),
            Just("reporter".to_string()),
            Just("admin".to_string()),
            "[a-z]{1,8}",
        ]
    }

    fn required_permission() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("api.mioc.status".to_string()),
            Just("api.mettbot.status".to_string()),
            Just("api.report.read".to_string()),
            "api\\.[a-z]{1,8}\\.[a-z]{1,8}",
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: any role list containing "admin" is authorized for any
        /// non-empty requirement.
        #[test]
        fn admin_always_authorized(
            roles in prop::collection::vec(role_name(), 0..4),
            required in prop::collection::vec(required_permission(), 1..4),
            at in 0usize..4,
        ) {
            let registry = registry();
            let authz = Authorizer::new(&registry);
            let mut roles = roles;
            let at = at.min(roles.len());
            roles.insert(at, "admin".to_string());
            prop_assert!(authz.is_authorized(&roles, &required));
        }

        /// Property: the explanation never disagrees with the decision.
        #[test]
        fn explain_agrees_with_decision(
            roles in prop::collection::vec(role_name(), 0..4),
            required in prop::collection::vec(required_permission(), 0..4),
        ) {
            let registry = registry();
            let authz = Authorizer::new(&registry);
            let decision = authz.is_authorized(&roles, &required);
            prop_assert_eq!(authz.explain(&roles, &required).granted, decision);
            prop_assert_eq!(authz.authorize(&roles, &required).is_ok(), decision);
        }
    }
}
