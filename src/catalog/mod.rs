//! Schema Graph Module
//!
//! The relational object graph every backend extractor produces and every
//! other part of the crate consumes:
//! - Catalogs, schemas, tables, columns, indexes, constraints, sequences
//! - Node kinds and their ancestor hierarchy
//! - Node paths used as stable identities inside one catalog

pub mod model;
pub mod node;

pub use model::{
    Catalog, Column, Constraint, ConstraintDef, Domain, ExtensionObject, ForeignKeyDef, Index,
    IndexColumn, IndexVariant, ReferentialAction, Schema, Sequence, Table, TableRef, View,
};
pub use node::{Node, NodeKind, NodePath, NodeRef, SchemaObject};
