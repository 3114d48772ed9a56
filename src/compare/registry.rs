//! Comparison registry
//!
//! Per-pass memo table keyed by the identities of the compared node pair.
//! A pair is marked [`RegistryEntry::Pending`] while its comparer runs, which
//! is what lets foreign-key references between tables stop instead of
//! recursing forever.

use super::result::ComparisonResult;
use crate::catalog::{NodeKind, NodePath, NodeRef};
use crate::error::CompareError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Identity of a compared (original, new) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    pub kind: NodeKind,
    pub original: Option<NodePath>,
    pub new: Option<NodePath>,
}

impl PairKey {
    pub fn for_pair(
        original: Option<&NodeRef<'_>>,
        new: Option<&NodeRef<'_>>,
    ) -> Result<Self, CompareError> {
        Ok(Self {
            kind: Self::kind_for(original, new)?,
            original: original.map(|n| n.path.clone()),
            new: new.map(|n| n.path.clone()),
        })
    }

    /// Kind used to dispatch a pair
    ///
    /// When both sides are present but differ in kind (a primary key replaced by a
    /// unique constraint of the same name), the nearest common ancestor is used.
    pub fn kind_for(
        original: Option<&NodeRef<'_>>,
        new: Option<&NodeRef<'_>>,
    ) -> Result<NodeKind, CompareError> {
        match (original, new) {
            (None, None) => Err(CompareError::BothNodesNull),
            (Some(o), None) => Ok(o.kind()),
            (None, Some(n)) => Ok(n.kind()),
            (Some(o), Some(n)) => {
                let new_kind = n.kind();
                let original_kind = o.kind();
                Ok(original_kind
                    .lineage()
                    .into_iter()
                    .find(|k| new_kind.is_a(k))
                    .unwrap_or(original_kind))
            }
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |p: &Option<NodePath>| match p {
            Some(path) if path.is_root() => "<catalog>".to_string(),
            Some(path) => path.to_string(),
            None => "-".to_string(),
        };
        write!(f, "{}({} -> {})", self.kind, side(&self.original), side(&self.new))
    }
}

#[derive(Debug, Clone)]
pub enum RegistryEntry {
    /// The pair's comparer is still running
    Pending,
    Complete(Arc<ComparisonResult>),
}

#[derive(Debug, Default)]
pub struct ComparisonRegistry {
    entries: HashMap<PairKey, RegistryEntry>,
}

impl ComparisonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_get(&self, key: &PairKey) -> Option<&RegistryEntry> {
        self.entries.get(key)
    }

    /// Finished result for a pair, if any
    pub fn result(&self, key: &PairKey) -> Option<Arc<ComparisonResult>> {
        match self.entries.get(key) {
            Some(RegistryEntry::Complete(result)) => Some(result.clone()),
            _ => None,
        }
    }

    /// Mark a pair as being compared
    pub fn begin(&mut self, key: PairKey) -> Result<(), CompareError> {
        if self.entries.contains_key(&key) {
            return Err(CompareError::ComparisonInProgress {
                key: key.to_string(),
            });
        }
        self.entries.insert(key, RegistryEntry::Pending);
        Ok(())
    }

    /// Store the finished result for a pair
    ///
    /// Registering the same result instance again is a no-op; a different
    /// instance for an already completed pair is rejected.
    pub fn register(
        &mut self,
        key: PairKey,
        result: Arc<ComparisonResult>,
    ) -> Result<(), CompareError> {
        if let Some(RegistryEntry::Complete(existing)) = self.entries.get(&key) {
            if Arc::ptr_eq(existing, &result) {
                return Ok(());
            }
            return Err(CompareError::DuplicateComparison {
                key: key.to_string(),
            });
        }
        self.entries.insert(key, RegistryEntry::Complete(result));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, RegistryEntry::Pending))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Node, Table};
    use crate::compare::result::ResultFactory;

    fn table_key(path: &str) -> PairKey {
        PairKey {
            kind: NodeKind::Table,
            original: Some(NodePath::from(path)),
            new: Some(NodePath::from(path)),
        }
    }

    fn finished(table: &Table) -> Arc<ComparisonResult> {
        let node = NodeRef::new(Node::Table(table), NodePath::from("dbo.A"));
        ResultFactory::new()
            .create(Some(&node), Some(&node))
            .unwrap()
            .finish()
    }

    #[test]
    fn test_register_same_instance_is_noop() {
        let table = Table::new("A");
        let result = finished(&table);
        let mut registry = ComparisonRegistry::new();

        registry.register(table_key("dbo.A"), result.clone()).unwrap();
        registry.register(table_key("dbo.A"), result.clone()).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&registry.result(&table_key("dbo.A")).unwrap(), &result));
    }

    #[test]
    fn test_register_different_instance_fails() {
        let table = Table::new("A");
        let mut registry = ComparisonRegistry::new();

        registry.register(table_key("dbo.A"), finished(&table)).unwrap();
        let err = registry
            .register(table_key("dbo.A"), finished(&table))
            .unwrap_err();

        assert!(matches!(err, CompareError::DuplicateComparison { .. }));
    }

    #[test]
    fn test_pending_pair_cannot_begin_twice() {
        let mut registry = ComparisonRegistry::new();
        registry.begin(table_key("dbo.A")).unwrap();

        assert!(matches!(
            registry.try_get(&table_key("dbo.A")),
            Some(RegistryEntry::Pending)
        ));
        assert!(registry.begin(table_key("dbo.A")).is_err());
        assert_eq!(registry.pending_count(), 1);

        let table = Table::new("A");
        registry.register(table_key("dbo.A"), finished(&table)).unwrap();
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn test_key_display() {
        let key = PairKey {
            kind: NodeKind::Table,
            original: Some(NodePath::from("dbo.A")),
            new: None,
        };
        assert_eq!(key.to_string(), "Table(dbo.A -> -)");
    }
}
