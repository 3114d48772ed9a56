//! Node identity within a catalog: kinds, paths and borrowed views

use super::model::{
    Catalog, Column, Constraint, ConstraintDef, Domain, ExtensionObject, Index, IndexVariant,
    Schema, Sequence, Table, View,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a schema graph node
///
/// Kinds form a shallow hierarchy: every concrete constraint kind descends from
/// [`NodeKind::Constraint`], and specialized indexes from [`NodeKind::Index`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Catalog,
    Schema,
    Table,
    View,
    Sequence,
    Domain,
    Column,
    Index,
    FullTextIndex,
    SpatialIndex,
    Constraint,
    PrimaryKey,
    UniqueConstraint,
    CheckConstraint,
    DefaultConstraint,
    ForeignKey,
    /// Backend-specific object kind
    Extension(String),
}

impl NodeKind {
    /// The immediate ancestor kind, if any
    pub fn ancestor(&self) -> Option<NodeKind> {
        match self {
            NodeKind::PrimaryKey
            | NodeKind::UniqueConstraint
            | NodeKind::CheckConstraint
            | NodeKind::DefaultConstraint
            | NodeKind::ForeignKey => Some(NodeKind::Constraint),
            NodeKind::FullTextIndex | NodeKind::SpatialIndex => Some(NodeKind::Index),
            _ => None,
        }
    }

    /// This kind followed by all of its ancestors
    pub fn lineage(&self) -> Vec<NodeKind> {
        let mut kinds = vec![self.clone()];
        while let Some(parent) = kinds.last().and_then(NodeKind::ancestor) {
            kinds.push(parent);
        }
        kinds
    }

    pub fn is_a(&self, other: &NodeKind) -> bool {
        self.lineage().iter().any(|k| k == other)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Extension(kind) => write!(f, "Extension({})", kind),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Dotted location of a node below its catalog (`dbo.Orders.Id`)
///
/// The catalog itself has the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    pub fn parent(&self) -> Option<NodePath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl From<&str> for NodePath {
    fn from(value: &str) -> Self {
        Self {
            segments: value
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl Serialize for NodePath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodePath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(NodePath::from(raw.as_str()))
    }
}

/// Borrowed view of any schema graph node
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Catalog(&'a Catalog),
    Schema(&'a Schema),
    Table(&'a Table),
    View(&'a View),
    Sequence(&'a Sequence),
    Domain(&'a Domain),
    Column(&'a Column),
    Index(&'a Index),
    Constraint(&'a Constraint),
    Extension(&'a ExtensionObject),
}

impl<'a> Node<'a> {
    pub fn kind(&self) -> NodeKind {
        match *self {
            Node::Catalog(_) => NodeKind::Catalog,
            Node::Schema(_) => NodeKind::Schema,
            Node::Table(_) => NodeKind::Table,
            Node::View(_) => NodeKind::View,
            Node::Sequence(_) => NodeKind::Sequence,
            Node::Domain(_) => NodeKind::Domain,
            Node::Column(_) => NodeKind::Column,
            Node::Index(index) => match index.variant {
                IndexVariant::Regular => NodeKind::Index,
                IndexVariant::FullText { .. } => NodeKind::FullTextIndex,
                IndexVariant::Spatial { .. } => NodeKind::SpatialIndex,
            },
            Node::Constraint(constraint) => match constraint.definition {
                ConstraintDef::PrimaryKey { .. } => NodeKind::PrimaryKey,
                ConstraintDef::Unique { .. } => NodeKind::UniqueConstraint,
                ConstraintDef::Check { .. } => NodeKind::CheckConstraint,
                ConstraintDef::Default { .. } => NodeKind::DefaultConstraint,
                ConstraintDef::ForeignKey(_) => NodeKind::ForeignKey,
            },
            Node::Extension(ext) => NodeKind::Extension(ext.kind.clone()),
        }
    }

    pub fn name(&self) -> &'a str {
        match *self {
            Node::Catalog(n) => &n.name,
            Node::Schema(n) => &n.name,
            Node::Table(n) => &n.name,
            Node::View(n) => &n.name,
            Node::Sequence(n) => &n.name,
            Node::Domain(n) => &n.name,
            Node::Column(n) => &n.name,
            Node::Index(n) => &n.name,
            Node::Constraint(n) => &n.name,
            Node::Extension(n) => &n.name,
        }
    }
}

/// A node together with its location in the catalog it was taken from
#[derive(Debug, Clone)]
pub struct NodeRef<'a> {
    pub node: Node<'a>,
    pub path: NodePath,
}

impl<'a> NodeRef<'a> {
    pub fn new(node: Node<'a>, path: NodePath) -> Self {
        Self { node, path }
    }

    pub fn catalog(catalog: &'a Catalog) -> Self {
        Self::new(Node::Catalog(catalog), NodePath::root())
    }

    pub fn kind(&self) -> NodeKind {
        self.node.kind()
    }

    pub fn name(&self) -> &'a str {
        self.node.name()
    }
}

/// Implemented by every child collection element so comparers can match them generically
pub trait SchemaObject {
    fn as_node(&self) -> Node<'_>;
}

macro_rules! schema_object {
    ($($ty:ident),* $(,)?) => {
        $(
            impl SchemaObject for $ty {
                fn as_node(&self) -> Node<'_> {
                    Node::$ty(self)
                }
            }
        )*
    };
}

schema_object!(Schema, Table, View, Sequence, Domain, Column, Index, Constraint);

impl SchemaObject for ExtensionObject {
    fn as_node(&self) -> Node<'_> {
        Node::Extension(self)
    }
}
