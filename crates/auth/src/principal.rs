use serde::{Deserialize, Serialize};

use crate::Role;

/// The authenticated subject of one request, reduced to its role names.
///
/// Populated by the boundary layer (see [`crate::claims`]) before any decision
/// is made. No other principal state takes part in authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn new(roles: Vec<Role>) -> Self {
        Self { roles }
    }

    /// A principal with no roles; denied for every non-empty requirement.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: names
                .into_iter()
                .map(|n| Role::from(Into::<String>::into(n)))
                .collect(),
        }
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn is_anonymous(&self) -> bool {
        self.roles.is_empty()
    }
}
