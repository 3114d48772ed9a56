//! Comparison results
//!
//! Results are assembled through a [`ResultBuilder`] and become immutable once
//! [`ResultBuilder::finish`] runs. A finished [`ComparisonResult`] exposes
//! getters only, so a returned tree cannot be mutated:
//!
//! ```compile_fail
//! use schemaflow_catalog::compare::{ComparisonResult, ResultType};
//!
//! fn tamper(result: &mut ComparisonResult) {
//!     result.result_type = ResultType::Unchanged;
//! }
//! ```

use super::registry::PairKey;
use crate::catalog::{NodeKind, NodePath, NodeRef};
use crate::error::CompareError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Outcome for one node pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultType {
    Unchanged,
    /// Present only in the new graph
    Added,
    /// Present only in the original graph
    Removed,
    Modified,
}

/// Name and location of one side of a compared pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeIdentity {
    pub name: String,
    pub path: NodePath,
}

impl From<&NodeRef<'_>> for NodeIdentity {
    fn from(node: &NodeRef<'_>) -> Self {
        Self {
            name: node.name().to_string(),
            path: node.path.clone(),
        }
    }
}

/// Difference of one scalar property
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResult {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    original: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new: Option<Value>,
    has_changes: bool,
}

impl PropertyResult {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn original(&self) -> Option<&Value> {
        self.original.as_ref()
    }

    pub fn new_value(&self) -> Option<&Value> {
        self.new.as_ref()
    }

    pub fn has_changes(&self) -> bool {
        self.has_changes
    }
}

/// Frozen comparison of one (original, new) node pair
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    original: Option<NodeIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new: Option<NodeIdentity>,
    result_type: ResultType,
    has_changes: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    properties: Vec<PropertyResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    nested: Vec<Arc<ComparisonResult>>,
}

impl ComparisonResult {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn original(&self) -> Option<&NodeIdentity> {
        self.original.as_ref()
    }

    pub fn new_value(&self) -> Option<&NodeIdentity> {
        self.new.as_ref()
    }

    pub fn result_type(&self) -> ResultType {
        self.result_type
    }

    pub fn has_changes(&self) -> bool {
        self.has_changes
    }

    pub fn properties(&self) -> &[PropertyResult] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyResult> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn nested(&self) -> &[Arc<ComparisonResult>] {
        &self.nested
    }

    /// Display path: the new side's path, or the original's for removals
    pub fn path(&self) -> Option<&NodePath> {
        self.new
            .as_ref()
            .or(self.original.as_ref())
            .map(|identity| &identity.path)
    }

    /// Depth-first walk over this result and all nested results
    pub fn walk<'s>(&'s self, visit: &mut impl FnMut(&'s ComparisonResult)) {
        visit(self);
        for child in &self.nested {
            child.walk(visit);
        }
    }

    /// Find the nested result for a node of `kind` at `path` on either side
    pub fn find(&self, kind: &NodeKind, path: &NodePath) -> Option<&ComparisonResult> {
        let matches = |identity: &Option<NodeIdentity>| {
            identity.as_ref().is_some_and(|i| &i.path == path)
        };
        if self.kind.is_a(kind) && (matches(&self.original) || matches(&self.new)) {
            return Some(self);
        }
        self.nested.iter().find_map(|child| child.find(kind, path))
    }
}

/// Mutable accumulator for a [`ComparisonResult`]
#[derive(Debug)]
pub struct ResultBuilder {
    kind: NodeKind,
    original: Option<NodeIdentity>,
    new: Option<NodeIdentity>,
    properties: Vec<PropertyResult>,
    nested: Vec<Arc<ComparisonResult>>,
}

impl ResultBuilder {
    fn new(kind: NodeKind, original: Option<NodeIdentity>, new: Option<NodeIdentity>) -> Self {
        Self {
            kind,
            original,
            new,
            properties: Vec::new(),
            nested: Vec::new(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Record a scalar property; `None` means the owning node is absent on that side
    pub fn property<T: Serialize>(
        &mut self,
        name: &str,
        original: Option<T>,
        new: Option<T>,
    ) -> Result<&mut Self, CompareError> {
        let original = original.map(serde_json::to_value).transpose()?;
        let new = new.map(serde_json::to_value).transpose()?;
        let has_changes = original != new;
        self.properties.push(PropertyResult {
            name: name.to_string(),
            original,
            new,
            has_changes,
        });
        Ok(self)
    }

    /// Record a property whose change flag was decided by the caller
    pub fn property_with(
        &mut self,
        name: &str,
        original: Option<Value>,
        new: Option<Value>,
        has_changes: bool,
    ) -> &mut Self {
        self.properties.push(PropertyResult {
            name: name.to_string(),
            original,
            new,
            has_changes,
        });
        self
    }

    pub fn nested(&mut self, result: Arc<ComparisonResult>) -> &mut Self {
        self.nested.push(result);
        self
    }

    /// Freeze the result; children must already be finished
    pub fn finish(self) -> Arc<ComparisonResult> {
        let result_type = match (&self.original, &self.new) {
            (None, Some(_)) => ResultType::Added,
            (Some(_), None) => ResultType::Removed,
            _ => {
                let changed = self.properties.iter().any(|p| p.has_changes)
                    || self.nested.iter().any(|n| n.has_changes);
                if changed {
                    ResultType::Modified
                } else {
                    ResultType::Unchanged
                }
            }
        };

        Arc::new(ComparisonResult {
            kind: self.kind,
            original: self.original,
            new: self.new,
            result_type,
            has_changes: result_type != ResultType::Unchanged,
            properties: self.properties,
            nested: self.nested,
        })
    }
}

/// Creates builders for node pairs and counts them over one comparison pass
#[derive(Debug, Default)]
pub struct ResultFactory {
    created: usize,
}

impl ResultFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        original: Option<&NodeRef<'_>>,
        new: Option<&NodeRef<'_>>,
    ) -> Result<ResultBuilder, CompareError> {
        let kind = PairKey::kind_for(original, new)?;
        self.created += 1;
        Ok(ResultBuilder::new(
            kind,
            original.map(NodeIdentity::from),
            new.map(NodeIdentity::from),
        ))
    }

    pub fn created(&self) -> usize {
        self.created
    }
}
