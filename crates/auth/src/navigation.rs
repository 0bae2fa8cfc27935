//! Coarse page-level gating: which menus and routes a role set can reach, and
//! where a principal lands right after signing in.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, PolicyResult};
use crate::RoleRegistry;

/// One rung of the landing cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingEntry {
    pub role: String,
    pub route: String,
}

impl LandingEntry {
    pub fn new(role: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            route: route.into(),
        }
    }
}

/// Ordered role precedence for the default route.
///
/// The first entry whose role the principal holds wins; the order of the
/// principal's own role list is irrelevant. With no match the principal is
/// sent to the sign-in route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingTable {
    entries: Vec<LandingEntry>,
    sign_in: String,
}

impl LandingTable {
    /// Validate a cascade against the registry it will be used with.
    pub fn new(
        entries: Vec<LandingEntry>,
        sign_in: impl Into<String>,
        registry: &RoleRegistry,
    ) -> PolicyResult<Self> {
        let sign_in = sign_in.into();
        if !sign_in.starts_with('/') {
            return Err(PolicyError::invalid_route("<sign-in>", sign_in));
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !registry.contains(&entry.role) {
                return Err(PolicyError::UnknownLandingRole(entry.role.clone()));
            }
            if !seen.insert(entry.role.as_str()) {
                return Err(PolicyError::DuplicateLandingRole(entry.role.clone()));
            }
            if !entry.route.starts_with('/') {
                return Err(PolicyError::invalid_route(&entry.role, &entry.route));
            }
        }

        Ok(Self { entries, sign_in })
    }

    pub fn entries(&self) -> &[LandingEntry] {
        &self.entries
    }

    pub fn sign_in(&self) -> &str {
        &self.sign_in
    }
}

/// Menu/route queries over a registry and its landing cascade.
#[derive(Debug, Clone, Copy)]
pub struct MenuRouteResolver<'a> {
    registry: &'a RoleRegistry,
    landing: &'a LandingTable,
}

impl<'a> MenuRouteResolver<'a> {
    pub fn new(registry: &'a RoleRegistry, landing: &'a LandingTable) -> Self {
        Self { registry, landing }
    }

    /// Deduplicated union of the roles' menus, sorted.
    pub fn accessible_menus<R: AsRef<str>>(&self, roles: &[R]) -> Vec<String> {
        let menus: BTreeSet<&str> = roles
            .iter()
            .flat_map(|role| self.registry.menus_for(role.as_ref()))
            .map(String::as_str)
            .collect();
        menus.into_iter().map(str::to_string).collect()
    }

    pub fn can_access_menu<R: AsRef<str>>(&self, roles: &[R], menu: &str) -> bool {
        roles
            .iter()
            .any(|role| self.registry.menus_for(role.as_ref()).contains(menu))
    }

    /// Deduplicated union of the roles' routes.
    ///
    /// Routes come out in first-seen order (roles as given, each role's routes
    /// as declared). Callers should not depend on it.
    pub fn accessible_routes<R: AsRef<str>>(&self, roles: &[R]) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut routes = Vec::new();
        for role in roles {
            for route in self.registry.routes_for(role.as_ref()) {
                if seen.insert(route) {
                    routes.push(route.clone());
                }
            }
        }
        routes
    }

    pub fn can_access_route<R: AsRef<str>>(&self, roles: &[R], route: &str) -> bool {
        roles.iter().any(|role| {
            self.registry
                .routes_for(role.as_ref())
                .iter()
                .any(|r| r == route)
        })
    }

    /// Every registered role whose route list contains `route`, in
    /// registration order.
    pub fn roles_allowed_for_route(&self, route: &str) -> Vec<String> {
        self.registry
            .role_names()
            .filter(|role| self.registry.routes_for(role).iter().any(|r| r == route))
            .map(str::to_string)
            .collect()
    }

    /// Landing path for a principal, via the fixed precedence cascade.
    pub fn default_route<R: AsRef<str>>(&self, roles: &[R]) -> &'a str {
        self.landing
            .entries
            .iter()
            .find(|entry| roles.iter().any(|r| r.as_ref() == entry.role))
            .map(|entry| entry.route.as_str())
            .unwrap_or(self.landing.sign_in.as_str())
    }

    pub fn sign_in_route(&self) -> &'a str {
        self.landing.sign_in.as_str()
    }
}
