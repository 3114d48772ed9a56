//! Per-type comparers
//!
//! Each comparer records its node type's scalar properties and hands child
//! collections back to the context, which dispatches every child pair to the
//! comparer registered for its kind.

use super::context::ComparisonContext;
use super::result::{ComparisonResult, ResultBuilder};
use crate::catalog::{
    Constraint, ConstraintDef, ForeignKeyDef, Index, IndexVariant, Node, NodeKind, NodePath,
    NodeRef,
};
use crate::error::CompareError;
use std::sync::Arc;
use tracing::trace;

pub trait Comparer: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn compare<'a>(
        &self,
        ctx: &mut ComparisonContext<'a>,
        original: Option<NodeRef<'a>>,
        new: Option<NodeRef<'a>>,
    ) -> Result<Arc<ComparisonResult>, CompareError>;
}

macro_rules! downcast {
    ($node:expr, $variant:ident) => {
        match $node.as_ref().map(|r| r.node) {
            Some(Node::$variant(inner)) => Some(inner),
            _ => None,
        }
    };
}

macro_rules! compare_fields {
    ($builder:expr, $original:expr, $new:expr, { $($label:literal => $field:ident),* $(,)? }) => {
        $(
            $builder.property($label, $original.map(|x| &x.$field), $new.map(|x| &x.$field))?;
        )*
    };
}

fn paths<'r>(
    original: &'r Option<NodeRef<'_>>,
    new: &'r Option<NodeRef<'_>>,
) -> (Option<&'r NodePath>, Option<&'r NodePath>) {
    (
        original.as_ref().map(|r| &r.path),
        new.as_ref().map(|r| &r.path),
    )
}

pub struct CatalogComparer;

impl Comparer for CatalogComparer {
    fn name(&self) -> &'static str {
        "catalog"
    }

    fn compare<'a>(
        &self,
        ctx: &mut ComparisonContext<'a>,
        original: Option<NodeRef<'a>>,
        new: Option<NodeRef<'a>>,
    ) -> Result<Arc<ComparisonResult>, CompareError> {
        let mut result = ctx.create_result(original.as_ref(), new.as_ref())?;
        let (o, n) = (downcast!(original, Catalog), downcast!(new, Catalog));
        compare_fields!(result, o, n, { "DefaultSchema" => default_schema });

        let (op, np) = paths(&original, &new);
        ctx.compare_children(
            &mut result,
            op,
            np,
            o.map(|c| c.schemas.as_slice()).unwrap_or(&[]),
            n.map(|c| c.schemas.as_slice()).unwrap_or(&[]),
        )?;
        Ok(result.finish())
    }
}

pub struct SchemaNodeComparer;

impl Comparer for SchemaNodeComparer {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn compare<'a>(
        &self,
        ctx: &mut ComparisonContext<'a>,
        original: Option<NodeRef<'a>>,
        new: Option<NodeRef<'a>>,
    ) -> Result<Arc<ComparisonResult>, CompareError> {
        let mut result = ctx.create_result(original.as_ref(), new.as_ref())?;
        let (o, n) = (downcast!(original, Schema), downcast!(new, Schema));
        compare_fields!(result, o, n, { "Name" => name, "Owner" => owner });

        let (op, np) = paths(&original, &new);
        ctx.compare_children(
            &mut result,
            op,
            np,
            o.map(|s| s.tables.as_slice()).unwrap_or(&[]),
            n.map(|s| s.tables.as_slice()).unwrap_or(&[]),
        )?;
        ctx.compare_children(
            &mut result,
            op,
            np,
            o.map(|s| s.views.as_slice()).unwrap_or(&[]),
            n.map(|s| s.views.as_slice()).unwrap_or(&[]),
        )?;
        ctx.compare_children(
            &mut result,
            op,
            np,
            o.map(|s| s.sequences.as_slice()).unwrap_or(&[]),
            n.map(|s| s.sequences.as_slice()).unwrap_or(&[]),
        )?;
        ctx.compare_children(
            &mut result,
            op,
            np,
            o.map(|s| s.domains.as_slice()).unwrap_or(&[]),
            n.map(|s| s.domains.as_slice()).unwrap_or(&[]),
        )?;
        ctx.compare_children(
            &mut result,
            op,
            np,
            o.map(|s| s.extensions.as_slice()).unwrap_or(&[]),
            n.map(|s| s.extensions.as_slice()).unwrap_or(&[]),
        )?;
        Ok(result.finish())
    }
}

pub struct TableComparer;

impl Comparer for TableComparer {
    fn name(&self) -> &'static str {
        "table"
    }

    fn compare<'a>(
        &self,
        ctx: &mut ComparisonContext<'a>,
        original: Option<NodeRef<'a>>,
        new: Option<NodeRef<'a>>,
    ) -> Result<Arc<ComparisonResult>, CompareError> {
        let mut result = ctx.create_result(original.as_ref(), new.as_ref())?;
        let (o, n) = (downcast!(original, Table), downcast!(new, Table));
        compare_fields!(result, o, n, { "Name" => name });

        let (op, np) = paths(&original, &new);
        ctx.compare_children(
            &mut result,
            op,
            np,
            o.map(|t| t.columns.as_slice()).unwrap_or(&[]),
            n.map(|t| t.columns.as_slice()).unwrap_or(&[]),
        )?;
        ctx.compare_children(
            &mut result,
            op,
            np,
            o.map(|t| t.indexes.as_slice()).unwrap_or(&[]),
            n.map(|t| t.indexes.as_slice()).unwrap_or(&[]),
        )?;
        ctx.compare_children(
            &mut result,
            op,
            np,
            o.map(|t| t.constraints.as_slice()).unwrap_or(&[]),
            n.map(|t| t.constraints.as_slice()).unwrap_or(&[]),
        )?;
        Ok(result.finish())
    }
}

pub struct ColumnComparer;

impl Comparer for ColumnComparer {
    fn name(&self) -> &'static str {
        "column"
    }

    fn compare<'a>(
        &self,
        ctx: &mut ComparisonContext<'a>,
        original: Option<NodeRef<'a>>,
        new: Option<NodeRef<'a>>,
    ) -> Result<Arc<ComparisonResult>, CompareError> {
        let mut result = ctx.create_result(original.as_ref(), new.as_ref())?;
        let (o, n) = (downcast!(original, Column), downcast!(new, Column));
        compare_fields!(result, o, n, {
            "Name" => name,
            "DataType" => data_type,
            "IsNullable" => nullable,
            "DefaultValue" => default_value,
            "Collation" => collation,
        });
        Ok(result.finish())
    }
}

fn index_properties(
    result: &mut ResultBuilder,
    o: Option<&Index>,
    n: Option<&Index>,
) -> Result<(), CompareError> {
    compare_fields!(result, o, n, {
        "Name" => name,
        "IsUnique" => is_unique,
        "IsClustered" => is_clustered,
        "FillFactor" => fill_factor,
        "Columns" => columns,
        "Filter" => filter,
    });
    Ok(())
}

pub struct IndexComparer;

impl Comparer for IndexComparer {
    fn name(&self) -> &'static str {
        "index"
    }

    fn compare<'a>(
        &self,
        ctx: &mut ComparisonContext<'a>,
        original: Option<NodeRef<'a>>,
        new: Option<NodeRef<'a>>,
    ) -> Result<Arc<ComparisonResult>, CompareError> {
        let mut result = ctx.create_result(original.as_ref(), new.as_ref())?;
        let (o, n) = (downcast!(original, Index), downcast!(new, Index));
        index_properties(&mut result, o, n)?;
        // Distinguishes a regular index turning into a spatial one
        result.property(
            "IndexType",
            o.map(|i| variant_name(&i.variant)),
            n.map(|i| variant_name(&i.variant)),
        )?;

        // Serves spatial indexes too, which have no comparer of their own
        let grid = |index: &'a Index| match &index.variant {
            IndexVariant::Spatial { grid } => Some(grid.as_deref()),
            _ => None,
        };
        let (og, ng) = (o.and_then(grid), n.and_then(grid));
        if og.is_some() || ng.is_some() {
            result.property("Grid", og.flatten(), ng.flatten())?;
        }
        Ok(result.finish())
    }
}

fn variant_name(variant: &IndexVariant) -> &'static str {
    match variant {
        IndexVariant::Regular => "regular",
        IndexVariant::FullText { .. } => "fullText",
        IndexVariant::Spatial { .. } => "spatial",
    }
}

pub struct FullTextIndexComparer;

impl Comparer for FullTextIndexComparer {
    fn name(&self) -> &'static str {
        "full-text-index"
    }

    fn compare<'a>(
        &self,
        ctx: &mut ComparisonContext<'a>,
        original: Option<NodeRef<'a>>,
        new: Option<NodeRef<'a>>,
    ) -> Result<Arc<ComparisonResult>, CompareError> {
        let mut result = ctx.create_result(original.as_ref(), new.as_ref())?;
        let (o, n) = (downcast!(original, Index), downcast!(new, Index));
        index_properties(&mut result, o, n)?;

        let full_text = |index: &'a Index| match &index.variant {
            IndexVariant::FullText {
                language,
                change_tracking,
            } => (language.as_deref(), change_tracking.as_deref()),
            _ => (None, None),
        };
        let (of, nf) = (o.map(full_text), n.map(full_text));
        result.property("Language", of.map(|f| f.0), nf.map(|f| f.0))?;
        result.property("ChangeTracking", of.map(|f| f.1), nf.map(|f| f.1))?;
        Ok(result.finish())
    }
}

fn constraint_type(definition: &ConstraintDef) -> &'static str {
    match definition {
        ConstraintDef::PrimaryKey { .. } => "primaryKey",
        ConstraintDef::Unique { .. } => "unique",
        ConstraintDef::Check { .. } => "check",
        ConstraintDef::Default { .. } => "default",
        ConstraintDef::ForeignKey(_) => "foreignKey",
    }
}

fn constraint_columns(definition: &ConstraintDef) -> Vec<&str> {
    match definition {
        ConstraintDef::PrimaryKey { columns } | ConstraintDef::Unique { columns } => {
            columns.iter().map(String::as_str).collect()
        }
        ConstraintDef::Default { column, .. } => vec![column.as_str()],
        ConstraintDef::ForeignKey(fk) => fk.columns.iter().map(String::as_str).collect(),
        ConstraintDef::Check { .. } => Vec::new(),
    }
}

fn constraint_expression(definition: &ConstraintDef) -> Option<&str> {
    match definition {
        ConstraintDef::Check { expression } | ConstraintDef::Default { expression, .. } => {
            Some(expression)
        }
        _ => None,
    }
}

/// Common constraint properties; serves every constraint kind without its own comparer
pub struct ConstraintComparer;

impl Comparer for ConstraintComparer {
    fn name(&self) -> &'static str {
        "constraint"
    }

    fn compare<'a>(
        &self,
        ctx: &mut ComparisonContext<'a>,
        original: Option<NodeRef<'a>>,
        new: Option<NodeRef<'a>>,
    ) -> Result<Arc<ComparisonResult>, CompareError> {
        let mut result = ctx.create_result(original.as_ref(), new.as_ref())?;
        let (o, n): (Option<&Constraint>, Option<&Constraint>) =
            (downcast!(original, Constraint), downcast!(new, Constraint));
        compare_fields!(result, o, n, { "Name" => name });
        result.property(
            "ConstraintType",
            o.map(|c| constraint_type(&c.definition)),
            n.map(|c| constraint_type(&c.definition)),
        )?;
        result.property(
            "Columns",
            o.map(|c| constraint_columns(&c.definition)),
            n.map(|c| constraint_columns(&c.definition)),
        )?;
        result.property(
            "Expression",
            o.map(|c| constraint_expression(&c.definition)),
            n.map(|c| constraint_expression(&c.definition)),
        )?;
        Ok(result.finish())
    }
}

pub struct ForeignKeyComparer;

impl Comparer for ForeignKeyComparer {
    fn name(&self) -> &'static str {
        "foreign-key"
    }

    fn compare<'a>(
        &self,
        ctx: &mut ComparisonContext<'a>,
        original: Option<NodeRef<'a>>,
        new: Option<NodeRef<'a>>,
    ) -> Result<Arc<ComparisonResult>, CompareError> {
        let mut result = ctx.create_result(original.as_ref(), new.as_ref())?;
        let (o, n) = (downcast!(original, Constraint), downcast!(new, Constraint));
        compare_fields!(result, o, n, { "Name" => name });

        let as_fk = |c: &'a Constraint| match &c.definition {
            ConstraintDef::ForeignKey(fk) => Some(fk),
            _ => None,
        };
        let (of, nf): (Option<&'a ForeignKeyDef>, Option<&'a ForeignKeyDef>) =
            (o.and_then(as_fk), n.and_then(as_fk));
        compare_fields!(result, of, nf, {
            "Columns" => columns,
            "ReferencedColumns" => referenced_columns,
            "OnDelete" => on_delete,
            "OnUpdate" => on_update,
        });
        ctx.compare_reference(
            &mut result,
            "ReferencedTable",
            of.map(|fk| &fk.referenced_table),
            nf.map(|fk| &fk.referenced_table),
        )?;
        Ok(result.finish())
    }
}

pub struct ViewComparer;

impl Comparer for ViewComparer {
    fn name(&self) -> &'static str {
        "view"
    }

    fn compare<'a>(
        &self,
        ctx: &mut ComparisonContext<'a>,
        original: Option<NodeRef<'a>>,
        new: Option<NodeRef<'a>>,
    ) -> Result<Arc<ComparisonResult>, CompareError> {
        let mut result = ctx.create_result(original.as_ref(), new.as_ref())?;
        let (o, n) = (downcast!(original, View), downcast!(new, View));
        compare_fields!(result, o, n, {
            "Name" => name,
            "Definition" => definition,
            "CheckOption" => check_option,
        });
        Ok(result.finish())
    }
}

pub struct SequenceComparer;

impl Comparer for SequenceComparer {
    fn name(&self) -> &'static str {
        "sequence"
    }

    fn compare<'a>(
        &self,
        ctx: &mut ComparisonContext<'a>,
        original: Option<NodeRef<'a>>,
        new: Option<NodeRef<'a>>,
    ) -> Result<Arc<ComparisonResult>, CompareError> {
        let mut result = ctx.create_result(original.as_ref(), new.as_ref())?;
        let (o, n) = (downcast!(original, Sequence), downcast!(new, Sequence));
        compare_fields!(result, o, n, {
            "Name" => name,
            "DataType" => data_type,
            "StartValue" => start_value,
            "Increment" => increment,
            "MinValue" => min_value,
            "MaxValue" => max_value,
            "IsCyclic" => is_cyclic,
        });
        Ok(result.finish())
    }
}

pub struct DomainComparer;

impl Comparer for DomainComparer {
    fn name(&self) -> &'static str {
        "domain"
    }

    fn compare<'a>(
        &self,
        ctx: &mut ComparisonContext<'a>,
        original: Option<NodeRef<'a>>,
        new: Option<NodeRef<'a>>,
    ) -> Result<Arc<ComparisonResult>, CompareError> {
        let mut result = ctx.create_result(original.as_ref(), new.as_ref())?;
        let (o, n) = (downcast!(original, Domain), downcast!(new, Domain));
        compare_fields!(result, o, n, {
            "Name" => name,
            "DataType" => data_type,
            "DefaultValue" => default_value,
            "CheckExpression" => check_expression,
            "Collation" => collation,
        });
        Ok(result.finish())
    }
}

/// Runs a base kind's comparer against a node of a derived kind
pub struct AncestorComparer {
    kind: NodeKind,
    base: Arc<dyn Comparer>,
}

impl AncestorComparer {
    pub fn new(kind: NodeKind, base: Arc<dyn Comparer>) -> Self {
        Self { kind, base }
    }
}

impl Comparer for AncestorComparer {
    fn name(&self) -> &'static str {
        self.base.name()
    }

    fn compare<'a>(
        &self,
        ctx: &mut ComparisonContext<'a>,
        original: Option<NodeRef<'a>>,
        new: Option<NodeRef<'a>>,
    ) -> Result<Arc<ComparisonResult>, CompareError> {
        trace!("Comparing {} with the {} comparer", self.kind, self.base.name());
        self.base.compare(ctx, original, new)
    }
}

/// Reports presence only; used for kinds nothing else can compare
pub struct NoopComparer;

impl Comparer for NoopComparer {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn compare<'a>(
        &self,
        ctx: &mut ComparisonContext<'a>,
        original: Option<NodeRef<'a>>,
        new: Option<NodeRef<'a>>,
    ) -> Result<Arc<ComparisonResult>, CompareError> {
        Ok(ctx.create_result(original.as_ref(), new.as_ref())?.finish())
    }
}
