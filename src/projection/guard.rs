//! Per-run bookkeeping for projection generation.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{CodegenError, Result};

/// Visits allowed per `(field type, enclosing type)` pair on one branch.
/// Two lets a type reference itself once, e.g. a `parent` field.
pub const MAX_VISITS: u8 = 2;

/// Counts how often an edge was traversed on the current branch.
///
/// Branch scoped: [`VisitGuard::descend`] hands out a copy for the child, so
/// siblings never see each other's visits.
#[derive(Debug, Clone, Default)]
pub struct VisitGuard {
    counts: HashMap<(String, String), u8>,
}

impl VisitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self, field_type: &str, enclosing_type: &str) -> u8 {
        self.counts
            .get(&(field_type.to_string(), enclosing_type.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// The guard for a child reached through this edge, or `None` once the
    /// edge is exhausted.
    pub fn descend(&self, field_type: &str, enclosing_type: &str) -> Option<VisitGuard> {
        let seen = self.visits(field_type, enclosing_type);
        if seen >= MAX_VISITS {
            return None;
        }
        let mut next = self.clone();
        next.counts.insert((field_type.to_string(), enclosing_type.to_string()), seen + 1);
        Some(next)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// First time this name is seen.
    Fresh,
    /// Already produced for the same source type.
    Existing,
}

/// Generated name → the schema type it was generated from.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    names: IndexMap<String, String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` for `source_type`. The same name for a different
    /// source type is a `DuplicateArtifact` error.
    pub fn claim(&mut self, name: &str, source_type: &str) -> Result<Claim> {
        match self.names.get(name) {
            Some(existing) if existing == source_type => Ok(Claim::Existing),
            Some(existing) => Err(CodegenError::DuplicateArtifact {
                name: name.to_string(),
                first: existing.clone(),
                second: source_type.to_string(),
            }),
            None => {
                self.names.insert(name.to_string(), source_type.to_string());
                Ok(Claim::Fresh)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_is_exhausted_after_two_visits() {
        let root = VisitGuard::new();
        let once = root.descend("Person", "Person").unwrap();
        let twice = once.descend("Person", "Person").unwrap();
        assert_eq!(twice.visits("Person", "Person"), 2);
        assert!(twice.descend("Person", "Person").is_none());
        // other edges are independent
        assert!(twice.descend("Pet", "Person").is_some());
    }

    #[test]
    fn descend_does_not_touch_the_parent() {
        let root = VisitGuard::new();
        let _child = root.descend("Person", "Person").unwrap();
        assert_eq!(root.visits("Person", "Person"), 0);
    }

    #[test]
    fn registry_memoizes_and_rejects_conflicts() {
        let mut registry = NameRegistry::new();
        assert_eq!(registry.claim("PersonProjection", "Person").unwrap(), Claim::Fresh);
        assert_eq!(registry.claim("PersonProjection", "Person").unwrap(), Claim::Existing);
        let err = registry.claim("PersonProjection", "Pet").unwrap_err();
        assert!(matches!(
            err,
            CodegenError::DuplicateArtifact { ref first, ref second, .. }
                if first == "Person" && second == "Pet"
        ));
        // a rejected claim leaves the first owner in place
        assert_eq!(registry.claim("PersonProjection", "Person").unwrap(), Claim::Existing);
    }
}
