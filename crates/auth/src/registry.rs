//! Role registry: role name → granted permission patterns, plus the coarse
//! page-level menu and route access tables.
//!
//! The permission grants and the menu/route tables are two independent
//! mechanisms and are kept as separate structures. Nothing reconciles them: a
//! role can reach a route whose API permissions it does not hold, and vice
//! versa.
//!
//! A registry is assembled once through [`RoleRegistryBuilder`] and is
//! read-only afterwards.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, PolicyResult};
use crate::PermissionPattern;

static NO_PERMISSIONS: BTreeSet<PermissionPattern> = BTreeSet::new();
static NO_MENUS: BTreeSet<String> = BTreeSet::new();

/// Everything one role is granted, as declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<PermissionPattern>,
    #[serde(default)]
    pub menus: Vec<String>,
    /// Route paths in declaration order.
    #[serde(default)]
    pub routes: Vec<String>,
}

impl RoleGrant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: Vec::new(),
            menus: Vec::new(),
            routes: Vec::new(),
        }
    }

    pub fn with_permission(mut self, pattern: PermissionPattern) -> Self {
        self.permissions.push(pattern);
        self
    }

    /// Parse and add several patterns at once.
    pub fn with_permissions<I>(mut self, patterns: I) -> PolicyResult<Self>
    where
        I: IntoIterator<Item = &'static str>,
    {
        for raw in patterns {
            self.permissions.push(PermissionPattern::parse(raw)?);
        }
        Ok(self)
    }

    pub fn with_menus<I, S>(mut self, menus: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.menus.extend(menus.into_iter().map(Into::into));
        self
    }

    pub fn with_routes<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.routes.extend(routes.into_iter().map(Into::into));
        self
    }
}

/// Role → accessible menu identifiers.
#[derive(Debug, Clone, Default)]
pub struct MenuAccessTable {
    by_role: HashMap<String, BTreeSet<String>>,
}

impl MenuAccessTable {
    pub fn menus_for(&self, role: &str) -> &BTreeSet<String> {
        self.by_role.get(role).unwrap_or(&NO_MENUS)
    }

    /// Every menu any registered role can reach.
    pub fn all_menus(&self) -> BTreeSet<&str> {
        self.by_role
            .values()
            .flat_map(|menus| menus.iter().map(String::as_str))
            .collect()
    }
}

/// Role → accessible route paths, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RouteAccessTable {
    by_role: HashMap<String, Vec<String>>,
}

impl RouteAccessTable {
    pub fn routes_for(&self, role: &str) -> &[String] {
        self.by_role.get(role).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Immutable role registry.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    /// Role names in registration order.
    order: Vec<String>,
    permissions: HashMap<String, BTreeSet<PermissionPattern>>,
    menus: MenuAccessTable,
    routes: RouteAccessTable,
}

impl RoleRegistry {
    pub fn builder() -> RoleRegistryBuilder {
        RoleRegistryBuilder::default()
    }

    /// Granted patterns for `role`; empty for an unknown role.
    pub fn permissions_for(&self, role: &str) -> &BTreeSet<PermissionPattern> {
        self.permissions.get(role).unwrap_or(&NO_PERMISSIONS)
    }

    pub fn menus_for(&self, role: &str) -> &BTreeSet<String> {
        self.menus.menus_for(role)
    }

    pub fn routes_for(&self, role: &str) -> &[String] {
        self.routes.routes_for(role)
    }

    pub fn contains(&self, role: &str) -> bool {
        self.permissions.contains_key(role)
    }

    /// Registered role names, in registration order.
    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn menu_table(&self) -> &MenuAccessTable {
        &self.menus
    }

    pub fn route_table(&self) -> &RouteAccessTable {
        &self.routes
    }

    /// Reconstruct the grant for a registered role.
    pub fn grant(&self, role: &str) -> Option<RoleGrant> {
        if !self.contains(role) {
            return None;
        }
        Some(RoleGrant {
            name: role.to_string(),
            permissions: self.permissions_for(role).iter().cloned().collect(),
            menus: self.menus_for(role).iter().cloned().collect(),
            routes: self.routes_for(role).to_vec(),
        })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Collects role grants and rejects configuration errors as they arrive.
#[derive(Debug, Default)]
pub struct RoleRegistryBuilder {
    registry: RoleRegistry,
}

impl RoleRegistryBuilder {
    /// Register one role.
    ///
    /// Fails on an empty name, a name that is already registered, or a route
    /// path that does not start with `/`. A failed call leaves the builder
    /// unchanged.
    pub fn register(&mut self, grant: RoleGrant) -> PolicyResult<&mut Self> {
        let RoleGrant {
            name,
            permissions,
            menus,
            routes,
        } = grant;

        if name.trim().is_empty() {
            return Err(PolicyError::EmptyRoleName);
        }
        if self.registry.contains(&name) {
            return Err(PolicyError::DuplicateRole(name));
        }
        if let Some(bad) = routes.iter().find(|r| !r.starts_with('/')) {
            return Err(PolicyError::invalid_route(name, bad.clone()));
        }

        let registry = &mut self.registry;
        registry
            .permissions
            .insert(name.clone(), permissions.into_iter().collect());
        registry
            .menus
            .by_role
            .insert(name.clone(), menus.into_iter().collect());
        registry.routes.by_role.insert(name.clone(), routes);
        registry.order.push(name);

        Ok(self)
    }

    pub fn build(self) -> RoleRegistry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(raw: &'static str) -> PermissionPattern {
        PermissionPattern::parse(raw).unwrap()
    }

    fn sample() -> RoleRegistry {
        let mut builder = RoleRegistry::builder();
        builder
            .register(
                RoleGrant::new("mioc")
                    .with_permission(pattern("api.mioc.*"))
                    .with_menus(["dashboard"])
                    .with_routes(["/dashboard"]),
            )
            .unwrap()
            .register(
                RoleGrant::new("service_engineer")
                    .with_permissions(["api.mettbot.*", "api.report.read"])
                    .unwrap()
                    .with_menus(["mettbot", "download-report"])
                    .with_routes(["/mettbot", "/download-report"]),
            )
            .unwrap();
        builder.build()
    }

    #[test]
    fn registered_role_round_trips() {
        let registry = sample();

        let perms: Vec<&str> = registry
            .permissions_for("service_engineer")
            .iter()
            .map(PermissionPattern::as_str)
            .collect();
        assert_eq!(perms, vec!["api.mettbot.*", "api.report.read"]);

        let menus: Vec<&str> = registry
            .menus_for("service_engineer")
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(menus, vec!["download-report", "mettbot"]);

        assert_eq!(
            registry.routes_for("service_engineer"),
            &["/mettbot".to_string(), "/download-report".to_string()]
        );
    }

    #[test]
    fn routes_keep_declaration_order() {
        let mut builder = RoleRegistry::builder();
        builder
            .register(RoleGrant::new("r").with_routes(["/z", "/a", "/m"]))
            .unwrap();
        let registry = builder.build();
        assert_eq!(registry.routes_for("r"), &["/z", "/a", "/m"]);
    }

    #[test]
    fn unknown_role_grants_nothing() {
        let registry = sample();
        assert!(registry.permissions_for("unknown-role").is_empty());
        assert!(registry.menus_for("unknown-role").is_empty());
        assert!(registry.routes_for("unknown-role").is_empty());
        assert!(registry.grant("unknown-role").is_none());
    }

    #[test]
    fn duplicate_role_is_rejected() {
        let mut builder = RoleRegistry::builder();
        builder.register(RoleGrant::new("mioc")).unwrap();
        let err = builder
            .register(RoleGrant::new("mioc").with_menus(["mettbot"]))
            .unwrap_err();
        assert!(matches!(err, PolicyError::DuplicateRole(ref n) if n == "mioc"));

        // The first registration survives untouched.
        let registry = builder.build();
        assert!(registry.menus_for("mioc").is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn empty_name_and_relative_route_are_rejected() {
        let mut builder = RoleRegistry::builder();
        assert!(matches!(
            builder.register(RoleGrant::new("  ")).unwrap_err(),
            PolicyError::EmptyRoleName
        ));
        assert!(matches!(
            builder
                .register(RoleGrant::new("mioc").with_routes(["dashboard"]))
                .unwrap_err(),
            PolicyError::InvalidRoute { .. }
        ));
        assert!(builder.build().is_empty());
    }

    #[test]
    fn role_names_follow_registration_order() {
        let registry = sample();
        let names: Vec<&str> = registry.role_names().collect();
        assert_eq!(names, vec!["mioc", "service_engineer"]);
    }

    #[test]
    fn grant_reconstructs_registration() {
        let registry = sample();
        let grant = registry.grant("mioc").unwrap();
        assert_eq!(grant.name, "mioc");
        assert_eq!(grant.permissions, vec![pattern("api.mioc.*")]);
        assert_eq!(grant.menus, vec!["dashboard".to_string()]);
        assert_eq!(grant.routes, vec!["/dashboard".to_string()]);
    }
}
