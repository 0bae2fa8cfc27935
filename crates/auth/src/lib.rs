//! `mettportal-auth` — role-based authorization policy engine.
//!
//! Decides whether a principal, reduced to its role names, may perform an
//! operation, open a menu, or visit a route, and where it lands after signing
//! in. The crate is decoupled from HTTP, tokens, and storage: all state is an
//! immutable [`Policy`] built once at startup.

pub mod authorize;
pub mod claims;
pub mod error;
pub mod gateway;
pub mod navigation;
pub mod permissions;
pub mod policy;
pub mod principal;
pub mod registry;
pub mod requirements;
pub mod roles;

pub use authorize::{AuthorizationExplanation, Authorizer, AuthzError, DecisionBasis};
pub use claims::{ClaimsError, principal_from_claims};
pub use error::{PolicyError, PolicyResult};
pub use gateway::{AuthorizationGateway, Decision};
pub use navigation::{LandingEntry, LandingTable, MenuRouteResolver};
pub use permissions::{PermissionPattern, matches};
pub use policy::{LandingDocument, Policy, PolicyDocument};
pub use principal::Principal;
pub use registry::{MenuAccessTable, RoleGrant, RoleRegistry, RoleRegistryBuilder, RouteAccessTable};
pub use requirements::{OperationRequirement, OperationTable};
pub use roles::Role;
