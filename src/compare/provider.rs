//! Comparer provider
//!
//! Static dispatch table from node kind to comparer, built once. Kinds without
//! their own entry borrow the comparer of their nearest registered ancestor;
//! kinds with neither degrade to a no-op comparer.

use super::comparers::{
    AncestorComparer, CatalogComparer, ColumnComparer, Comparer, ConstraintComparer,
    DomainComparer, ForeignKeyComparer, FullTextIndexComparer, IndexComparer, NoopComparer,
    SchemaNodeComparer, SequenceComparer, TableComparer, ViewComparer,
};
use crate::catalog::NodeKind;
use crate::error::CompareError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub struct ComparerProvider {
    comparers: HashMap<NodeKind, Arc<dyn Comparer>>,
    fallback: Arc<dyn Comparer>,
}

impl ComparerProvider {
    /// A provider with no registrations; everything resolves to the fallback
    pub fn empty() -> Self {
        Self {
            comparers: HashMap::new(),
            fallback: Arc::new(NoopComparer),
        }
    }

    /// Register (or replace) the comparer for one kind
    pub fn register(mut self, kind: NodeKind, comparer: Arc<dyn Comparer>) -> Self {
        self.comparers.insert(kind, comparer);
        self
    }

    pub fn is_registered(&self, kind: &NodeKind) -> bool {
        self.comparers.contains_key(kind)
    }

    /// Exact registration, else the nearest ancestor's comparer wrapped for `kind`
    pub fn resolve(&self, kind: &NodeKind) -> Result<Arc<dyn Comparer>, CompareError> {
        if let Some(comparer) = self.comparers.get(kind) {
            return Ok(comparer.clone());
        }

        let mut ancestor = kind.ancestor();
        while let Some(candidate) = ancestor {
            if let Some(base) = self.comparers.get(&candidate) {
                debug!("Using {} comparer for {}", candidate, kind);
                return Ok(Arc::new(AncestorComparer::new(kind.clone(), base.clone())));
            }
            ancestor = candidate.ancestor();
        }

        Err(CompareError::UnresolvableComparer { kind: kind.clone() })
    }

    /// Comparer for kinds [`resolve`](Self::resolve) rejects
    pub fn fallback(&self) -> Arc<dyn Comparer> {
        self.fallback.clone()
    }
}

impl Default for ComparerProvider {
    fn default() -> Self {
        Self::empty()
            .register(NodeKind::Catalog, Arc::new(CatalogComparer))
            .register(NodeKind::Schema, Arc::new(SchemaNodeComparer))
            .register(NodeKind::Table, Arc::new(TableComparer))
            .register(NodeKind::View, Arc::new(ViewComparer))
            .register(NodeKind::Sequence, Arc::new(SequenceComparer))
            .register(NodeKind::Domain, Arc::new(DomainComparer))
            .register(NodeKind::Column, Arc::new(ColumnComparer))
            .register(NodeKind::Index, Arc::new(IndexComparer))
            .register(NodeKind::FullTextIndex, Arc::new(FullTextIndexComparer))
            .register(NodeKind::Constraint, Arc::new(ConstraintComparer))
            .register(NodeKind::ForeignKey, Arc::new(ForeignKeyComparer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_registration_wins() {
        let provider = ComparerProvider::default();
        assert_eq!(provider.resolve(&NodeKind::ForeignKey).unwrap().name(), "foreign-key");
        assert_eq!(provider.resolve(&NodeKind::Column).unwrap().name(), "column");
    }

    #[test]
    fn test_subtype_falls_back_to_ancestor() {
        let provider = ComparerProvider::default();
        assert!(!provider.is_registered(&NodeKind::PrimaryKey));

        let comparer = provider.resolve(&NodeKind::PrimaryKey).unwrap();
        assert_eq!(comparer.name(), "constraint");
        assert_eq!(provider.resolve(&NodeKind::SpatialIndex).unwrap().name(), "index");
    }

    #[test]
    fn test_unknown_kind_degrades_to_noop() {
        let provider = ComparerProvider::default();
        let kind = NodeKind::Extension("PartitionFunction".to_string());

        let err = provider.resolve(&kind).err().unwrap();
        assert!(matches!(err, CompareError::UnresolvableComparer { .. }));
        assert_eq!(provider.fallback().name(), "noop");
    }

    #[test]
    fn test_empty_provider_resolves_nothing() {
        let provider = ComparerProvider::empty();
        assert!(provider.resolve(&NodeKind::Table).is_err());
        assert_eq!(provider.fallback().name(), "noop");
    }
}
