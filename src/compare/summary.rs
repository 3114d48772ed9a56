//! Change statistics over a finished result tree

use super::result::{ComparisonResult, ResultType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Added/removed/modified counts for one node kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCounts {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
}

impl ChangeCounts {
    pub fn total(&self) -> usize {
        self.added + self.removed + self.modified
    }
}

/// Summary statistics for one comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    /// Counts keyed by node kind name (`Table`, `ForeignKey`, ...)
    pub by_kind: BTreeMap<String, ChangeCounts>,
    pub total_changes: usize,
}

impl ComparisonSummary {
    /// Count every changed result below `root`; the root itself is not counted
    pub fn calculate(root: &ComparisonResult) -> Self {
        let mut summary = Self::default();
        for child in root.nested() {
            child.walk(&mut |result| summary.record(result));
        }
        summary
    }

    pub fn counts(&self, kind: &str) -> ChangeCounts {
        self.by_kind.get(kind).copied().unwrap_or_default()
    }

    fn record(&mut self, result: &ComparisonResult) {
        let counts = self.by_kind.entry(result.kind().to_string()).or_default();
        match result.result_type() {
            ResultType::Added => counts.added += 1,
            ResultType::Removed => counts.removed += 1,
            ResultType::Modified => counts.modified += 1,
            ResultType::Unchanged => return,
        }
        self.total_changes += 1;
    }
}
