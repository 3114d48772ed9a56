//! Comparison hints
//!
//! Caller-supplied overrides of name-based matching. A rename hint says which
//! node of the new graph corresponds to a node of the original graph; an ignore
//! hint drops a node from the comparison on both sides.

use crate::catalog::{NodeKind, NodePath};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Hint {
    Rename {
        kind: NodeKind,
        original: NodePath,
        new: NodePath,
    },
    Ignore {
        kind: NodeKind,
        path: NodePath,
    },
}

impl Hint {
    pub fn rename(kind: NodeKind, original: &str, new: &str) -> Self {
        Hint::Rename {
            kind,
            original: NodePath::from(original),
            new: NodePath::from(new),
        }
    }

    pub fn ignore(kind: NodeKind, path: &str) -> Self {
        Hint::Ignore {
            kind,
            path: NodePath::from(path),
        }
    }
}

/// Ordered, read-only set of hints for one comparison pass
///
/// A hint applies to nodes of its own kind and of every descendant kind, so a
/// `Constraint` rename also covers a foreign key.
#[derive(Debug, Clone, Default)]
pub struct HintSet {
    hints: Vec<Hint>,
}

impl HintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, hint: Hint) -> Self {
        self.hints.push(hint);
        self
    }

    pub fn push(&mut self, hint: Hint) {
        self.hints.push(hint);
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hint> {
        self.hints.iter()
    }

    /// Path in the new graph a renamed original node corresponds to
    pub fn rename_target(&self, kind: &NodeKind, original: &NodePath) -> Option<&NodePath> {
        self.hints.iter().find_map(|hint| match hint {
            Hint::Rename {
                kind: hinted,
                original: source,
                new,
            } if kind.is_a(hinted) && source == original => Some(new),
            _ => None,
        })
    }

    /// Path in the original graph a renamed new node came from
    pub fn rename_source(&self, kind: &NodeKind, new: &NodePath) -> Option<&NodePath> {
        self.hints.iter().find_map(|hint| match hint {
            Hint::Rename {
                kind: hinted,
                original,
                new: target,
            } if kind.is_a(hinted) && target == new => Some(original),
            _ => None,
        })
    }

    pub fn is_ignored(&self, kind: &NodeKind, path: &NodePath) -> bool {
        self.hints.iter().any(|hint| {
            matches!(hint, Hint::Ignore { kind: hinted, path: ignored }
                if kind.is_a(hinted) && ignored == path)
        })
    }

    /// Where an original node is expected to live in the new graph
    ///
    /// An explicit rename wins; otherwise renames of enclosing nodes are applied
    /// and the node keeps its own name.
    pub fn counterpart(&self, kind: &NodeKind, original: &NodePath) -> NodePath {
        if let Some(target) = self.rename_target(kind, original) {
            return target.clone();
        }
        match (original.parent(), original.name()) {
            (Some(parent), Some(name)) if !parent.is_root() => {
                let parent_kind = match parent.segments().len() {
                    1 => NodeKind::Schema,
                    _ => NodeKind::Table,
                };
                self.counterpart(&parent_kind, &parent).child(name)
            }
            _ => original.clone(),
        }
    }
}

impl From<Vec<Hint>> for HintSet {
    fn from(hints: Vec<Hint>) -> Self {
        Self { hints }
    }
}

impl FromIterator<Hint> for HintSet {
    fn from_iter<I: IntoIterator<Item = Hint>>(iter: I) -> Self {
        Self {
            hints: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_applies_to_descendant_kinds() {
        let hints = HintSet::new().with(Hint::rename(
            NodeKind::Constraint,
            "dbo.Order.FK_Old",
            "dbo.Order.FK_New",
        ));

        let original = NodePath::from("dbo.Order.FK_Old");
        assert_eq!(
            hints.rename_target(&NodeKind::ForeignKey, &original),
            Some(&NodePath::from("dbo.Order.FK_New"))
        );
        assert_eq!(hints.rename_target(&NodeKind::Table, &original), None);
        assert_eq!(
            hints.rename_source(&NodeKind::ForeignKey, &NodePath::from("dbo.Order.FK_New")),
            Some(&original)
        );
    }

    #[test]
    fn test_counterpart_follows_schema_rename() {
        let hints = HintSet::new()
            .with(Hint::rename(NodeKind::Schema, "dbo", "sales"))
            .with(Hint::rename(NodeKind::Table, "dbo.Client", "sales.Customer"));

        assert_eq!(
            hints.counterpart(&NodeKind::Table, &NodePath::from("dbo.Order")),
            NodePath::from("sales.Order")
        );
        assert_eq!(
            hints.counterpart(&NodeKind::Table, &NodePath::from("dbo.Client")),
            NodePath::from("sales.Customer")
        );
        assert_eq!(
            hints.counterpart(&NodeKind::Column, &NodePath::from("dbo.Client.Id")),
            NodePath::from("sales.Customer.Id")
        );
        assert_eq!(
            hints.counterpart(&NodeKind::Table, &NodePath::from("audit.Log")),
            NodePath::from("audit.Log")
        );
    }

    #[test]
    fn test_ignore_hint() {
        let hints: HintSet = vec![Hint::ignore(NodeKind::Table, "dbo.Scratch")].into();
        assert!(hints.is_ignored(&NodeKind::Table, &NodePath::from("dbo.Scratch")));
        assert!(!hints.is_ignored(&NodeKind::View, &NodePath::from("dbo.Scratch")));
    }
}
