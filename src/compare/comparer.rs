//! Schema Comparer
//!
//! Entry point of the comparison engine. Each call runs one comparison pass
//! with a fresh context and returns the frozen result tree for the two catalogs.

use super::context::ComparisonContext;
use super::hints::HintSet;
use super::provider::ComparerProvider;
use super::result::{ComparisonResult, ResultType};
use super::summary::ComparisonSummary;
use crate::catalog::{Catalog, NodeKind, NodePath, NodeRef};
use crate::error::CompareError;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct SchemaComparer {
    provider: Arc<ComparerProvider>,
}

impl SchemaComparer {
    pub fn new() -> Self {
        Self::with_provider(Arc::new(ComparerProvider::default()))
    }

    pub fn with_provider(provider: Arc<ComparerProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &ComparerProvider {
        &self.provider
    }

    /// Compare two catalogs under the given hints
    pub fn compare(
        &self,
        original: &Catalog,
        new: &Catalog,
        hints: &HintSet,
    ) -> Result<CatalogComparisonResult, CompareError> {
        let run_id = Uuid::new_v4();
        debug!(
            %run_id,
            original = %original.name,
            new = %new.name,
            hints = hints.len(),
            "Starting schema comparison"
        );

        let mut ctx = ComparisonContext::new(original, new, hints, &self.provider);
        let root = ctx.compare(Some(NodeRef::catalog(original)), Some(NodeRef::catalog(new)))?;
        let (registry, factory) = ctx.into_parts();

        let result = CatalogComparisonResult {
            root,
            pairs_compared: registry.len(),
        };
        info!(
            %run_id,
            pairs = registry.len(),
            results = factory.created(),
            changes = result.summary().total_changes,
            "Schema comparison finished"
        );
        Ok(result)
    }
}

impl Default for SchemaComparer {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of comparing two catalogs; serializes as its root result
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct CatalogComparisonResult {
    root: Arc<ComparisonResult>,
    #[serde(skip)]
    pairs_compared: usize,
}

impl CatalogComparisonResult {
    pub fn root(&self) -> &ComparisonResult {
        &self.root
    }

    pub fn has_changes(&self) -> bool {
        self.root.has_changes()
    }

    pub fn result_type(&self) -> ResultType {
        self.root.result_type()
    }

    /// Number of distinct node pairs compared during the pass
    pub fn pairs_compared(&self) -> usize {
        self.pairs_compared
    }

    pub fn find(&self, kind: &NodeKind, path: &str) -> Option<&ComparisonResult> {
        self.root.find(kind, &NodePath::from(path))
    }

    /// Every changed result below the catalog, depth-first
    pub fn changes(&self) -> Vec<&ComparisonResult> {
        let mut changes = Vec::new();
        for child in self.root.nested() {
            child.walk(&mut |result| {
                if result.has_changes() {
                    changes.push(result);
                }
            });
        }
        changes
    }

    pub fn summary(&self) -> ComparisonSummary {
        ComparisonSummary::calculate(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        Column, Constraint, ConstraintDef, ExtensionObject, Index, IndexVariant, Schema, Table,
        TableRef,
    };
    use crate::compare::hints::Hint;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn orders_catalog(order_id_type: &str) -> Catalog {
        Catalog::new("Sales").with_schema(
            Schema::new("dbo")
                .with_table(
                    Table::new("Customer")
                        .with_column(Column::new("Id", "int", false))
                        .with_constraint(Constraint::primary_key("PK_Customer", &["Id"])),
                )
                .with_table(
                    Table::new("Order")
                        .with_column(Column::new("Id", order_id_type, false))
                        .with_column(Column::new("CustomerId", "int", false))
                        .with_constraint(Constraint::foreign_key(
                            "FK_Order_Customer",
                            &["CustomerId"],
                            TableRef::new("dbo", "Customer"),
                            &["Id"],
                        )),
                ),
        )
    }

    fn compare(original: &Catalog, new: &Catalog, hints: HintSet) -> CatalogComparisonResult {
        SchemaComparer::new().compare(original, new, &hints).unwrap()
    }

    #[test]
    fn test_identical_catalogs_are_unchanged() {
        let catalog = orders_catalog("int");
        let result = compare(&catalog, &catalog.clone(), HintSet::new());

        assert_eq!(result.result_type(), ResultType::Unchanged);
        assert!(!result.has_changes());
        assert!(result.changes().is_empty());
    }

    #[test]
    fn test_absence_is_symmetric() {
        let empty = Catalog::new("Sales").with_schema(Schema::new("dbo"));
        let full = orders_catalog("int");

        let added = compare(&empty, &full, HintSet::new());
        let removed = compare(&full, &empty, HintSet::new());

        let order = added.find(&NodeKind::Table, "dbo.Order").unwrap();
        assert_eq!(order.result_type(), ResultType::Added);
        assert!(order.original().is_none());
        let order = removed.find(&NodeKind::Table, "dbo.Order").unwrap();
        assert_eq!(order.result_type(), ResultType::Removed);
        assert!(order.new_value().is_none());

        assert_eq!(added.changes().len(), removed.changes().len());
    }

    #[test]
    fn test_two_absent_nodes_are_rejected() {
        let catalog = orders_catalog("int");
        let hints = HintSet::new();
        let provider = ComparerProvider::default();
        let mut ctx = ComparisonContext::new(&catalog, &catalog, &hints, &provider);

        let err = ctx.compare(None, None).unwrap_err();
        assert!(matches!(err, CompareError::BothNodesNull));
    }

    #[test]
    fn test_modified_column_bubbles_to_catalog() {
        let result = compare(&orders_catalog("int"), &orders_catalog("bigint"), HintSet::new());

        assert_eq!(result.result_type(), ResultType::Modified);
        let column = result.find(&NodeKind::Column, "dbo.Order.Id").unwrap();
        let data_type = column.property("DataType").unwrap();
        assert!(data_type.has_changes());
        assert_eq!(data_type.original(), Some(&serde_json::json!("int")));
        assert_eq!(data_type.new_value(), Some(&serde_json::json!("bigint")));

        let kinds: Vec<String> = result.changes().iter().map(|r| r.kind().to_string()).collect();
        assert_eq!(kinds, vec!["Schema", "Table", "Column"]);
    }

    fn cyclic_catalog(b_value_type: &str) -> Catalog {
        Catalog::new("Graph").with_schema(
            Schema::new("dbo")
                .with_table(
                    Table::new("A")
                        .with_column(Column::new("Id", "int", false))
                        .with_column(Column::new("BId", "int", true))
                        .with_constraint(Constraint::foreign_key(
                            "FK_A_B",
                            &["BId"],
                            TableRef::new("dbo", "B"),
                            &["Id"],
                        )),
                )
                .with_table(
                    Table::new("B")
                        .with_column(Column::new("Id", "int", false))
                        .with_column(Column::new("AId", "int", true))
                        .with_column(Column::new("Value", b_value_type, true))
                        .with_constraint(Constraint::foreign_key(
                            "FK_B_A",
                            &["AId"],
                            TableRef::new("dbo", "A"),
                            &["Id"],
                        )),
                ),
        )
    }

    #[test]
    fn test_reference_cycle_terminates_with_one_result_per_pair() {
        let result = compare(
            &cyclic_catalog("int"),
            &cyclic_catalog("bigint"),
            HintSet::new(),
        );

        let mut tables = Vec::new();
        result.root().walk(&mut |r| {
            if r.kind() == &NodeKind::Table {
                tables.push(r.path().map(ToString::to_string));
            }
        });
        assert_eq!(
            tables,
            vec![Some("dbo.A".to_string()), Some("dbo.B".to_string())]
        );

        let a = result.find(&NodeKind::Table, "dbo.A").unwrap();
        let b = result.find(&NodeKind::Table, "dbo.B").unwrap();
        assert_eq!(a.result_type(), ResultType::Unchanged);
        assert_eq!(b.result_type(), ResultType::Modified);

        let fk = result
            .find(&NodeKind::ForeignKey, "dbo.A.FK_A_B")
            .unwrap();
        assert!(!fk.property("ReferencedTable").unwrap().has_changes());

        // catalog, schema, 2 tables, 5 columns, 2 foreign keys
        assert_eq!(result.pairs_compared(), 11);
    }

    #[test]
    fn test_self_reference_terminates() {
        let catalog = Catalog::new("Org").with_schema(
            Schema::new("hr").with_table(
                Table::new("Employee")
                    .with_column(Column::new("Id", "int", false))
                    .with_column(Column::new("ManagerId", "int", true))
                    .with_constraint(Constraint::foreign_key(
                        "FK_Manager",
                        &["ManagerId"],
                        TableRef::new("hr", "Employee"),
                        &["Id"],
                    )),
            ),
        );

        let result = compare(&catalog, &catalog.clone(), HintSet::new());
        assert!(!result.has_changes());
    }

    #[test]
    fn test_rename_hint_pairs_tables() {
        let original = orders_catalog("int");
        let mut new = orders_catalog("int");
        new.schemas[0].tables[0].name = "Client".to_string();
        if let ConstraintDef::ForeignKey(fk) = &mut new.schemas[0].tables[1].constraints[0].definition
        {
            fk.referenced_table = TableRef::new("dbo", "Client");
        }

        let unhinted = compare(&original, &new, HintSet::new());
        assert_eq!(
            unhinted
                .find(&NodeKind::Table, "dbo.Customer")
                .unwrap()
                .result_type(),
            ResultType::Removed
        );
        let fk = unhinted
            .find(&NodeKind::ForeignKey, "dbo.Order.FK_Order_Customer")
            .unwrap();
        assert!(fk.property("ReferencedTable").unwrap().has_changes());

        let hints = HintSet::new().with(Hint::rename(NodeKind::Table, "dbo.Customer", "dbo.Client"));
        let hinted = compare(&original, &new, hints);

        let table = hinted.find(&NodeKind::Table, "dbo.Client").unwrap();
        assert_eq!(table.result_type(), ResultType::Modified);
        assert_eq!(table.original().unwrap().name, "Customer");
        assert!(table.property("Name").unwrap().has_changes());

        let fk = hinted
            .find(&NodeKind::ForeignKey, "dbo.Order.FK_Order_Customer")
            .unwrap();
        assert!(!fk.property("ReferencedTable").unwrap().has_changes());
        assert_eq!(hinted.summary().counts("Table").added, 0);
    }

    #[test]
    fn test_reference_to_table_renamed_over_is_changed() {
        let mut original = cyclic_catalog("int");
        original.schemas[0].tables.push(
            Table::new("Z").with_column(Column::new("Id", "int", false)),
        );
        let new = cyclic_catalog("int");

        let hints = HintSet::new().with(Hint::rename(NodeKind::Table, "dbo.Z", "dbo.B"));
        let result = compare(&original, &new, hints);

        let removed = result
            .root()
            .nested()[0]
            .nested()
            .iter()
            .find(|r| r.original().is_some_and(|o| o.name == "B"))
            .unwrap();
        assert_eq!(removed.result_type(), ResultType::Removed);

        let fk = result.find(&NodeKind::ForeignKey, "dbo.A.FK_A_B").unwrap();
        let referenced = fk.property("ReferencedTable").unwrap();
        assert!(referenced.has_changes());
        assert_eq!(fk.result_type(), ResultType::Modified);

        // catalog, schema, A with 2 columns and FK, removed B with 4 children,
        // Z paired with new B plus 4 children; no extra (dbo.B, dbo.B) pair
        assert_eq!(result.pairs_compared(), 16);
    }

    #[test]
    fn test_ignored_node_is_skipped_on_both_sides() {
        let original = orders_catalog("int");
        let mut new = orders_catalog("int");
        new.schemas[0].tables.push(Table::new("Scratch"));

        let hints = HintSet::new().with(Hint::ignore(NodeKind::Table, "dbo.Scratch"));
        let result = compare(&original, &new, hints);

        assert!(!result.has_changes());
        assert!(result.find(&NodeKind::Table, "dbo.Scratch").is_none());
    }

    #[test]
    fn test_unknown_kind_reports_presence_only() {
        let original = orders_catalog("int");
        let mut new = orders_catalog("int");
        new.schemas[0].extensions.push(ExtensionObject {
            kind: "PartitionFunction".to_string(),
            name: "pf_ByYear".to_string(),
            properties: BTreeMap::new(),
        });

        let result = compare(&original, &new, HintSet::new());
        let kind = NodeKind::Extension("PartitionFunction".to_string());
        let extension = result.find(&kind, "dbo.pf_ByYear").unwrap();

        assert_eq!(extension.result_type(), ResultType::Added);
        assert!(extension.properties().is_empty());
    }

    #[test]
    fn test_constraint_kind_change_uses_common_ancestor() {
        let original = Catalog::new("Sales").with_schema(Schema::new("dbo").with_table(
            Table::new("T").with_constraint(Constraint::primary_key("UQ_T", &["Code"])),
        ));
        let new = Catalog::new("Sales").with_schema(Schema::new("dbo").with_table(
            Table::new("T").with_constraint(Constraint {
                name: "UQ_T".to_string(),
                definition: ConstraintDef::Unique {
                    columns: vec!["Code".to_string()],
                },
            }),
        ));

        let result = compare(&original, &new, HintSet::new());
        let constraint = result.find(&NodeKind::Constraint, "dbo.T.UQ_T").unwrap();

        assert_eq!(constraint.kind(), &NodeKind::Constraint);
        assert_eq!(constraint.result_type(), ResultType::Modified);
        assert!(constraint.property("ConstraintType").unwrap().has_changes());
        assert!(!constraint.property("Columns").unwrap().has_changes());
    }

    #[test]
    fn test_spatial_grid_change_is_detected() {
        let with_grid = |grid: &str| {
            let mut index = Index::new("SIX_Store_Location", &["Location"]);
            index.variant = IndexVariant::Spatial {
                grid: Some(grid.to_string()),
            };
            Catalog::new("Geo").with_schema(
                Schema::new("dbo").with_table(Table::new("Store").with_index(index)),
            )
        };

        let result = compare(&with_grid("LOW"), &with_grid("HIGH"), HintSet::new());
        let index = result
            .find(&NodeKind::SpatialIndex, "dbo.Store.SIX_Store_Location")
            .unwrap();

        assert_eq!(index.kind(), &NodeKind::SpatialIndex);
        assert_eq!(index.result_type(), ResultType::Modified);
        assert!(index.property("Grid").unwrap().has_changes());
        assert!(!index.property("IndexType").unwrap().has_changes());

        let same = compare(&with_grid("LOW"), &with_grid("LOW"), HintSet::new());
        assert!(!same.has_changes());
    }

    #[test]
    fn test_nested_scope_leaves_outer_registry_untouched() {
        let original = orders_catalog("int");
        let new = orders_catalog("bigint");
        let hints = HintSet::new();
        let provider = ComparerProvider::default();
        let outer = ComparisonContext::new(&original, &new, &hints, &provider);

        {
            let inner_hints =
                HintSet::new().with(Hint::ignore(NodeKind::Column, "dbo.Order.Id"));
            let mut inner = outer.nested(&inner_hints);
            let result = inner
                .compare(Some(NodeRef::catalog(&original)), Some(NodeRef::catalog(&new)))
                .unwrap();
            assert!(!result.has_changes());
            assert!(!inner.registry().is_empty());
        }

        assert!(outer.registry().is_empty());
        assert_eq!(outer.factory().created(), 0);
    }

    #[test]
    fn test_result_serializes_as_tree() {
        let result = compare(&orders_catalog("int"), &orders_catalog("bigint"), HintSet::new());
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["kind"], "catalog");
        assert_eq!(json["resultType"], "modified");
        assert_eq!(json["nested"][0]["new"]["path"], "dbo");
    }
}
