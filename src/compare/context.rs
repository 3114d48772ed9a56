//! Comparison context
//!
//! One context exists per top-level comparison. It is passed explicitly to
//! every comparer and bundles the registry, the hints, the result factory and
//! the comparer provider, plus both catalogs so cross-table references can be
//! resolved by name.

use super::hints::HintSet;
use super::provider::ComparerProvider;
use super::registry::{ComparisonRegistry, PairKey, RegistryEntry};
use super::result::{ComparisonResult, ResultBuilder, ResultFactory};
use crate::catalog::{Catalog, Node, NodeKind, NodePath, NodeRef, SchemaObject, TableRef};
use crate::error::CompareError;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ComparisonContext<'a> {
    original: &'a Catalog,
    new: &'a Catalog,
    hints: &'a HintSet,
    provider: &'a ComparerProvider,
    registry: ComparisonRegistry,
    factory: ResultFactory,
    unresolved: HashSet<NodeKind>,
}

impl<'a> ComparisonContext<'a> {
    pub fn new(
        original: &'a Catalog,
        new: &'a Catalog,
        hints: &'a HintSet,
        provider: &'a ComparerProvider,
    ) -> Self {
        Self {
            original,
            new,
            hints,
            provider,
            registry: ComparisonRegistry::new(),
            factory: ResultFactory::new(),
            unresolved: HashSet::new(),
        }
    }

    /// Open a nested scope with its own registry and hints
    ///
    /// The outer context is left untouched and becomes usable again once the
    /// nested one is dropped.
    pub fn nested<'b>(&'b self, hints: &'b HintSet) -> ComparisonContext<'b> {
        ComparisonContext::new(self.original, self.new, hints, self.provider)
    }

    pub fn original_catalog(&self) -> &'a Catalog {
        self.original
    }

    pub fn new_catalog(&self) -> &'a Catalog {
        self.new
    }

    pub fn hints(&self) -> &'a HintSet {
        self.hints
    }

    pub fn registry(&self) -> &ComparisonRegistry {
        &self.registry
    }

    pub fn factory(&self) -> &ResultFactory {
        &self.factory
    }

    pub fn create_result(
        &mut self,
        original: Option<&NodeRef<'a>>,
        new: Option<&NodeRef<'a>>,
    ) -> Result<ResultBuilder, CompareError> {
        self.factory.create(original, new)
    }

    /// Compare one node pair through the registry and the matching comparer
    pub fn compare(
        &mut self,
        original: Option<NodeRef<'a>>,
        new: Option<NodeRef<'a>>,
    ) -> Result<Arc<ComparisonResult>, CompareError> {
        let key = PairKey::for_pair(original.as_ref(), new.as_ref())?;

        if let Some(entry) = self.registry.try_get(&key) {
            return match entry {
                RegistryEntry::Complete(result) => Ok(result.clone()),
                RegistryEntry::Pending => Err(CompareError::ComparisonInProgress {
                    key: key.to_string(),
                }),
            };
        }

        self.registry.begin(key.clone())?;
        let comparer = match self.provider.resolve(&key.kind) {
            Ok(comparer) => comparer,
            Err(err) => {
                if self.unresolved.insert(key.kind.clone()) {
                    warn!(error = %err, "Falling back to no-op comparison for {}", key.kind);
                }
                self.provider.fallback()
            }
        };
        let result = comparer.compare(self, original, new)?;
        self.registry.register(key, result.clone())?;
        Ok(result)
    }

    /// Match two child collections by name (after hints) and compare each pair
    ///
    /// Results are nested into `builder` in original order, followed by
    /// additions in new order.
    pub fn compare_children<T: SchemaObject>(
        &mut self,
        builder: &mut ResultBuilder,
        original_parent: Option<&NodePath>,
        new_parent: Option<&NodePath>,
        originals: &'a [T],
        news: &'a [T],
    ) -> Result<(), CompareError> {
        let originals = self.locate(original_parent, originals);
        let mut new_slots: Vec<Option<NodeRef<'a>>> = self
            .locate(new_parent, news)
            .into_iter()
            .map(Some)
            .collect();

        let hinted: HashSet<NodePath> = originals
            .iter()
            .filter_map(|o| self.hints.rename_target(&o.kind(), &o.path))
            .cloned()
            .collect();

        let mut pairs = Vec::with_capacity(originals.len() + new_slots.len());
        for original in originals {
            let position = match self.hints.rename_target(&original.kind(), &original.path) {
                Some(target) => new_slots
                    .iter()
                    .position(|slot| slot.as_ref().is_some_and(|n| &n.path == target)),
                None => new_slots.iter().position(|slot| {
                    slot.as_ref().is_some_and(|n| {
                        n.name() == original.name()
                            && !hinted.contains(&n.path)
                            && self.hints.rename_source(&n.kind(), &n.path).is_none()
                    })
                }),
            };
            let new = position.and_then(|i| new_slots[i].take());
            pairs.push((Some(original), new));
        }
        pairs.extend(new_slots.into_iter().flatten().map(|n| (None, Some(n))));

        for (original, new) in pairs {
            let result = self.compare(original, new)?;
            builder.nested(result);
        }
        Ok(())
    }

    /// Record a table reference property (a foreign key target)
    ///
    /// The property changes when the original target's expected counterpart is
    /// not the new target, or when a rename hint pairs the new target with a
    /// different original table. Corresponding targets are compared through the
    /// registry; a target whose comparison is still running is a reference
    /// cycle and is not entered again.
    pub fn compare_reference(
        &mut self,
        builder: &mut ResultBuilder,
        name: &str,
        original: Option<&'a TableRef>,
        new: Option<&'a TableRef>,
    ) -> Result<(), CompareError> {
        let original_path = original.map(table_path);
        let new_path = new.map(table_path);
        let expected = original_path
            .as_ref()
            .map(|p| self.hints.counterpart(&NodeKind::Table, p));

        // A new target that a hint claims for another original is a different table
        let claimed_by_other = match (&original_path, &new_path) {
            (Some(original_path), Some(new_path)) => self
                .hints
                .rename_source(&NodeKind::Table, new_path)
                .is_some_and(|source| source != original_path),
            _ => false,
        };
        let has_changes = expected != new_path || claimed_by_other;
        builder.property_with(
            name,
            original.map(|r| serde_json::Value::String(r.to_string())),
            new.map(|r| serde_json::Value::String(r.to_string())),
            has_changes,
        );

        let (Some(original), Some(new)) = (original, new) else {
            return Ok(());
        };
        if has_changes {
            return Ok(());
        }
        let (Some(original_table), Some(new_table)) =
            (self.original.table(original), self.new.table(new))
        else {
            return Ok(());
        };

        let original_ref = NodeRef::new(Node::Table(original_table), table_path(original));
        let new_ref = NodeRef::new(Node::Table(new_table), table_path(new));
        if self.hints.is_ignored(&NodeKind::Table, &original_ref.path)
            || self.hints.is_ignored(&NodeKind::Table, &new_ref.path)
        {
            return Ok(());
        }

        let key = PairKey::for_pair(Some(&original_ref), Some(&new_ref))?;
        match self.registry.try_get(&key) {
            Some(RegistryEntry::Pending) => {
                debug!("Reference cycle at {}, not re-entering", key);
            }
            Some(RegistryEntry::Complete(_)) => {}
            None => {
                self.compare(Some(original_ref), Some(new_ref))?;
            }
        }
        Ok(())
    }

    fn locate<T: SchemaObject>(
        &self,
        parent: Option<&NodePath>,
        children: &'a [T],
    ) -> Vec<NodeRef<'a>> {
        let Some(parent) = parent else {
            return Vec::new();
        };
        children
            .iter()
            .map(|child| {
                let node = child.as_node();
                NodeRef::new(node, parent.child(node.name()))
            })
            .filter(|r| !self.hints.is_ignored(&r.kind(), &r.path))
            .collect()
    }

    pub(crate) fn into_parts(self) -> (ComparisonRegistry, ResultFactory) {
        (self.registry, self.factory)
    }
}

fn table_path(reference: &TableRef) -> NodePath {
    NodePath::root()
        .child(&reference.schema)
        .child(&reference.table)
}
