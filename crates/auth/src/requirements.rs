//! Static operation → required-permission table.
//!
//! Each guarded operation is registered once, at startup, with the permission
//! list a caller must satisfy. The table is the auditable record of what every
//! operation requires.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, PolicyResult};

/// One operation and its required permissions (OR semantics).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRequirement {
    pub id: String,
    #[serde(default)]
    pub requires: Vec<String>,
}

impl OperationRequirement {
    pub fn new<I, S>(id: impl Into<String>, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            requires: requires.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OperationTable {
    order: Vec<String>,
    by_id: HashMap<String, Vec<String>>,
}

impl OperationTable {
    pub fn from_requirements<I>(requirements: I) -> PolicyResult<Self>
    where
        I: IntoIterator<Item = OperationRequirement>,
    {
        let mut table = Self::default();
        for requirement in requirements {
            table.insert(requirement)?;
        }
        Ok(table)
    }

    fn insert(&mut self, requirement: OperationRequirement) -> PolicyResult<()> {
        let OperationRequirement { id, requires } = requirement;
        if self.by_id.contains_key(&id) {
            return Err(PolicyError::DuplicateOperation(id));
        }
        if requires.iter().any(|p| p.trim().is_empty()) {
            return Err(PolicyError::EmptyRequirement { operation: id });
        }
        self.order.push(id.clone());
        self.by_id.insert(id, requires);
        Ok(())
    }

    /// Declared requirement, or `None` for an operation nobody registered.
    pub fn required_for(&self, operation: &str) -> Option<&[String]> {
        self.by_id.get(operation).map(Vec::as_slice)
    }

    pub fn requirements(&self) -> impl Iterator<Item = OperationRequirement> + '_ {
        self.order.iter().map(|id| OperationRequirement {
            id: id.clone(),
            requires: self.by_id[id].clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_returns_declared_list() {
        let table = OperationTable::from_requirements([
            OperationRequirement::new("mettbot.status", ["api.mettbot.status"]),
            OperationRequirement::new("health", Vec::<String>::new()),
        ])
        .unwrap();

        assert_eq!(
            table.required_for("mettbot.status"),
            Some(&["api.mettbot.status".to_string()][..])
        );
        assert_eq!(table.required_for("health"), Some(&[][..]));
        assert_eq!(table.required_for("missing"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn duplicate_operation_fails() {
        let err = OperationTable::from_requirements([
            OperationRequirement::new("mettbot.status", ["api.mettbot.status"]),
            OperationRequirement::new("mettbot.status", ["api.mettbot.read"]),
        ])
        .unwrap_err();
        assert!(matches!(err, PolicyError::DuplicateOperation(ref id) if id == "mettbot.status"));
    }

    #[test]
    fn blank_permission_fails() {
        let err = OperationTable::from_requirements([OperationRequirement::new(
            "mettbot.status",
            ["api.mettbot.status", " "],
        )])
        .unwrap_err();
        assert!(matches!(err, PolicyError::EmptyRequirement { .. }));
    }

    #[test]
    fn requirements_iterate_in_registration_order() {
        let table = OperationTable::from_requirements([
            OperationRequirement::new("b", ["x"]),
            OperationRequirement::new("a", ["y"]),
        ])
        .unwrap();
        let ids: Vec<String> = table.requirements().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
