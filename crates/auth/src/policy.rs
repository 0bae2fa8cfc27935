//! Policy configuration: the serializable document, the compiled [`Policy`],
//! and the canonical built-in tables.
//!
//! A [`Policy`] is built once at startup and shared (`Arc<Policy>`) by every
//! request. Any configuration error aborts construction.

use std::ffi::OsString;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, PolicyResult};
use crate::navigation::{LandingEntry, LandingTable, MenuRouteResolver};
use crate::requirements::{OperationRequirement, OperationTable};
use crate::{Authorizer, PermissionPattern, RoleGrant, RoleRegistry};

/// Environment variable naming a JSON policy file.
pub const POLICY_PATH_ENV: &str = "METTPORTAL_POLICY_PATH";

pub const SIGN_IN_ROUTE: &str = "/sign-in";

/// On-disk policy shape.
///
/// Roles, landing entries, and operations are lists rather than maps so that
/// a duplicate is reported instead of silently replacing the earlier entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub roles: Vec<RoleGrant>,
    pub landing: LandingDocument,
    #[serde(default)]
    pub operations: Vec<OperationRequirement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingDocument {
    /// Highest precedence first.
    pub order: Vec<LandingEntry>,
    #[serde(default = "default_sign_in")]
    pub sign_in: String,
}

fn default_sign_in() -> String {
    SIGN_IN_ROUTE.to_string()
}

/// Wire form of a policy file. Patterns stay plain strings here so a bad one
/// is reported as [`PolicyError::InvalidPattern`] rather than a JSON error.
#[derive(Debug, Deserialize)]
struct RawPolicyDocument {
    roles: Vec<RawRoleGrant>,
    landing: LandingDocument,
    #[serde(default)]
    operations: Vec<OperationRequirement>,
}

#[derive(Debug, Deserialize)]
struct RawRoleGrant {
    name: String,
    #[serde(default)]
    permissions: Vec<String>,
    #[serde(default)]
    menus: Vec<String>,
    #[serde(default)]
    routes: Vec<String>,
}

impl RawPolicyDocument {
    fn parse(json: &str, path: &str) -> PolicyResult<PolicyDocument> {
        let raw: Self = serde_json::from_str(json).map_err(|source| PolicyError::Parse {
            path: path.to_string(),
            source,
        })?;
        raw.validate()
    }

    fn validate(self) -> PolicyResult<PolicyDocument> {
        let roles = self
            .roles
            .into_iter()
            .map(|raw| {
                let permissions = raw
                    .permissions
                    .into_iter()
                    .map(PermissionPattern::parse)
                    .collect::<PolicyResult<Vec<_>>>()?;
                Ok(RoleGrant {
                    name: raw.name,
                    permissions,
                    menus: raw.menus,
                    routes: raw.routes,
                })
            })
            .collect::<PolicyResult<Vec<_>>>()?;

        Ok(PolicyDocument {
            roles,
            landing: self.landing,
            operations: self.operations,
        })
    }
}

/// Compiled, immutable policy.
#[derive(Debug, Clone)]
pub struct Policy {
    registry: RoleRegistry,
    landing: LandingTable,
    operations: OperationTable,
}

impl Policy {
    pub fn from_document(document: PolicyDocument) -> PolicyResult<Self> {
        let PolicyDocument {
            roles,
            landing,
            operations,
        } = document;

        let mut builder = RoleRegistry::builder();
        for grant in roles {
            builder.register(grant)?;
        }
        let registry = builder.build();
        let landing = LandingTable::new(landing.order, landing.sign_in, &registry)?;
        let operations = OperationTable::from_requirements(operations)?;

        let policy = Self {
            registry,
            landing,
            operations,
        };
        tracing::info!(
            roles = policy.registry.len(),
            landing_entries = policy.landing.entries().len(),
            operations = policy.operations.len(),
            "Loaded authorization policy"
        );
        Ok(policy)
    }

    pub fn from_json_str(json: &str) -> PolicyResult<Self> {
        Self::from_document(RawPolicyDocument::parse(json, "<inline>")?)
    }

    pub fn from_path(path: &Path) -> PolicyResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_document(RawPolicyDocument::parse(
            &contents,
            &path.display().to_string(),
        )?)
    }

    /// Load the file named by `METTPORTAL_POLICY_PATH`, or fall back to the
    /// built-in policy when it is unset.
    pub fn from_env() -> PolicyResult<Self> {
        Self::from_env_value(std::env::var_os(POLICY_PATH_ENV))
    }

    /// [`Policy::from_env`] with the variable's value passed in.
    ///
    /// The value is used as a path verbatim, so a set but non-UTF-8 value
    /// still names a file and fails like any other unreadable path.
    pub fn from_env_value(value: Option<OsString>) -> PolicyResult<Self> {
        match value {
            Some(path) => Self::from_path(Path::new(&path)),
            None => {
                tracing::warn!("{POLICY_PATH_ENV} not set; using built-in policy");
                Self::builtin()
            }
        }
    }

    /// The canonical built-in policy.
    pub fn builtin() -> PolicyResult<Self> {
        Self::from_document(builtin_document()?)
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    pub fn landing(&self) -> &LandingTable {
        &self.landing
    }

    pub fn operations(&self) -> &OperationTable {
        &self.operations
    }

    pub fn authorizer(&self) -> Authorizer<'_> {
        Authorizer::new(&self.registry)
    }

    pub fn resolver(&self) -> MenuRouteResolver<'_> {
        MenuRouteResolver::new(&self.registry, &self.landing)
    }

    /// The effective policy, in document form.
    pub fn to_document(&self) -> PolicyDocument {
        PolicyDocument {
            roles: self
                .registry
                .role_names()
                .filter_map(|role| self.registry.grant(role))
                .collect(),
            landing: LandingDocument {
                order: self.landing.entries().to_vec(),
                sign_in: self.landing.sign_in().to_string(),
            },
            operations: self.operations.requirements().collect(),
        }
    }
}

/// Built-in tables.
///
/// Role taxonomy: `admin`, `mioc`, and one role per engineering domain
/// (`implement_engineer`, `service_engineer`). The single catch-all `service`
/// role used by one of the front ends is deliberately absent; deployments that
/// need it supply their own policy file.
///
/// Landing precedence: admin → /mroi, mioc → /dashboard,
/// service_engineer → /mettbot, implement_engineer → /mettpole, else
/// /sign-in. The variant that sends admin to /download-report is not used.
pub fn builtin_document() -> PolicyResult<PolicyDocument> {
    let roles = vec![
        RoleGrant::new("admin")
            .with_permissions(["*"])?
            .with_menus(["dashboard", "mroi", "mettbot", "mettpole", "download-report"])
            .with_routes(["/mroi", "/dashboard", "/mettbot", "/mettpole", "/download-report"]),
        RoleGrant::new("mioc")
            .with_permissions(["api.mioc.*"])?
            .with_menus(["dashboard"])
            .with_routes(["/dashboard"]),
        RoleGrant::new("implement_engineer")
            .with_permissions(["api.mettpole.*", "api.mroi.*", "api.report.*"])?
            .with_menus(["mettpole", "mroi", "download-report"])
            .with_routes(["/mettpole", "/mroi", "/download-report"]),
        RoleGrant::new("service_engineer")
            .with_permissions(["api.mettbot.*", "api.mettpole.*", "api.report.read"])?
            .with_menus(["mettbot", "mettpole", "download-report"])
            .with_routes(["/mettbot", "/mettpole", "/download-report"]),
    ];

    let landing = LandingDocument {
        order: vec![
            LandingEntry::new("admin", "/mroi"),
            LandingEntry::new("mioc", "/dashboard"),
            LandingEntry::new("service_engineer", "/mettbot"),
            LandingEntry::new("implement_engineer", "/mettpole"),
        ],
        sign_in: default_sign_in(),
    };

    let operations = vec![
        OperationRequirement::new("mioc.status", ["api.mioc.status"]),
        OperationRequirement::new("mioc.alerts.list", ["api.mioc.alerts.read"]),
        OperationRequirement::new("mettbot.status", ["api.mettbot.status"]),
        OperationRequirement::new("mettbot.command", ["api.mettbot.command"]),
        OperationRequirement::new("mettpole.status", ["api.mettpole.status"]),
        OperationRequirement::new("mettpole.configure", ["api.mettpole.configure"]),
        OperationRequirement::new("mroi.query", ["api.mroi.read"]),
        OperationRequirement::new("report.download", ["api.report.read"]),
        OperationRequirement::new("report.generate", ["api.report.generate"]),
        OperationRequirement::new("health", Vec::<String>::new()),
    ];

    Ok(PolicyDocument {
        roles,
        landing,
        operations,
    })
}
