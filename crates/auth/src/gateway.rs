//! Boundary entry point for the request-handling layer.
//!
//! The HTTP guard maps request context → [`Principal`] → a call here → allow,
//! deny, or redirect. Nothing in this module performs IO.

use std::sync::Arc;

use serde::Serialize;

use crate::{Policy, Principal};

/// Outcome the request layer acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "location", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
    /// Send the client to this route instead.
    Redirect(String),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Shared, read-only view of the policy for request handlers.
///
/// Cloning is cheap; every clone points at the same immutable [`Policy`].
#[derive(Debug, Clone)]
pub struct AuthorizationGateway {
    policy: Arc<Policy>,
}

impl AuthorizationGateway {
    pub fn new(policy: Arc<Policy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Check a registered operation.
    ///
    /// An operation id missing from the table has no declared requirement and
    /// is allowed, same as an empty requirement list.
    pub fn check_operation(&self, principal: &Principal, operation: &str) -> Decision {
        let required: &[String] = match self.policy.operations().required_for(operation) {
            Some(required) => required,
            None => {
                tracing::warn!(operation, "operation has no declared requirement; allowing");
                &[]
            }
        };

        if self.policy.authorizer().is_authorized(principal.roles(), required) {
            Decision::Allow
        } else {
            tracing::debug!(
                operation,
                roles = ?principal.roles(),
                required = ?required,
                "operation denied"
            );
            Decision::Deny
        }
    }

    /// Check an ad-hoc requirement list.
    pub fn check_permissions<P: AsRef<str>>(&self, principal: &Principal, required: &[P]) -> Decision {
        if self.policy.authorizer().is_authorized(principal.roles(), required) {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    /// Page-level route gate.
    ///
    /// A principal without roles is sent to sign in; one with roles is sent
    /// to its own landing route. Refusing the redirect target itself is a
    /// plain deny.
    pub fn check_route(&self, principal: &Principal, route: &str) -> Decision {
        let resolver = self.policy.resolver();
        if resolver.can_access_route(principal.roles(), route) {
            return Decision::Allow;
        }

        tracing::debug!(route, roles = ?principal.roles(), "route denied");
        let target = if principal.is_anonymous() {
            resolver.sign_in_route()
        } else {
            resolver.default_route(principal.roles())
        };
        if target == route {
            Decision::Deny
        } else {
            Decision::Redirect(target.to_string())
        }
    }

    pub fn check_menu(&self, principal: &Principal, menu: &str) -> Decision {
        if self.policy.resolver().can_access_menu(principal.roles(), menu) {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    /// Where to send the principal right after authentication.
    pub fn landing(&self, principal: &Principal) -> &str {
        self.policy.resolver().default_route(principal.roles())
    }

    pub fn menus(&self, principal: &Principal) -> Vec<String> {
        self.policy.resolver().accessible_menus(principal.roles())
    }
}
