//! Schema graph types
//!
//! The object graph produced by backend extractors:
//! `Catalog → Schema → {Table, View, Sequence, Domain}`, `Table → {Column, Index, Constraint}`.
//! Foreign keys refer to other tables by name through [`TableRef`], so the graph
//! stays a plain owned tree that can be cloned and serialized.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};

/// Top-level container for one physical database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Physical database name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_schema: Option<String>,
    #[serde(default)]
    pub schemas: Vec<Schema>,
}

impl Catalog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_schema: None,
            schemas: Vec::new(),
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schemas.push(schema);
        self
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.iter().find(|s| s.name == name)
    }

    /// Resolve a foreign-key target
    pub fn table(&self, reference: &TableRef) -> Option<&Table> {
        self.schema(&reference.schema)?
            .tables
            .iter()
            .find(|t| t.name == reference.table)
    }

    /// Check that every child name is unique within its parent and dot-free
    ///
    /// Node paths join names with dots, so a dotted name could not be addressed.
    pub fn validate(&self) -> Result<(), CatalogError> {
        check_names(&self.name, "schema", self.schemas.iter().map(|s| s.name.as_str()))?;

        for schema in &self.schemas {
            let parent = format!("{}.{}", self.name, schema.name);
            check_names(&parent, "table", schema.tables.iter().map(|t| t.name.as_str()))?;
            check_names(&parent, "view", schema.views.iter().map(|v| v.name.as_str()))?;
            check_names(&parent, "sequence", schema.sequences.iter().map(|s| s.name.as_str()))?;
            check_names(&parent, "domain", schema.domains.iter().map(|d| d.name.as_str()))?;
            check_names(&parent, "extension", schema.extensions.iter().map(|e| e.name.as_str()))?;

            for table in &schema.tables {
                let parent = format!("{}.{}", parent, table.name);
                check_names(&parent, "column", table.columns.iter().map(|c| c.name.as_str()))?;
                check_names(&parent, "index", table.indexes.iter().map(|i| i.name.as_str()))?;
                check_names(&parent, "constraint", table.constraints.iter().map(|c| c.name.as_str()))?;
            }
        }

        Ok(())
    }

    /// Stable content hash, independent of the catalog's own name
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();

        for schema in &self.schemas {
            hasher.update(format!("S:{}", schema.name).as_bytes());
            for table in &schema.tables {
                hasher.update(format!("T:{}.{}", schema.name, table.name).as_bytes());
                for col in &table.columns {
                    hasher.update(
                        format!("C:{}:{}:{}", col.name, col.data_type, col.nullable).as_bytes(),
                    );
                }
                for idx in &table.indexes {
                    hasher.update(format!("I:{}:{}", idx.name, idx.is_unique).as_bytes());
                }
                for constraint in &table.constraints {
                    hasher.update(format!("K:{}", constraint.name).as_bytes());
                    if let ConstraintDef::ForeignKey(fk) = &constraint.definition {
                        hasher.update(format!("->{}", fk.referenced_table).as_bytes());
                    }
                }
            }
            for view in &schema.views {
                hasher.update(format!("V:{}:{}", view.name, view.definition).as_bytes());
            }
            for seq in &schema.sequences {
                hasher.update(format!("Q:{}:{}", seq.name, seq.start_value).as_bytes());
            }
        }

        format!("{:x}", hasher.finalize())
    }
}

fn check_names<'a>(
    parent: &str,
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for name in names {
        if name.contains('.') {
            return Err(CatalogError::DottedName {
                parent: parent.to_string(),
                kind,
                name: name.to_string(),
            });
        }
        if !seen.insert(name) {
            return Err(CatalogError::DuplicateName {
                parent: parent.to_string(),
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub views: Vec<View>,
    #[serde(default)]
    pub sequences: Vec<Sequence>,
    #[serde(default)]
    pub domains: Vec<Domain>,
    /// Backend-specific objects the generic model does not know about
    #[serde(default)]
    pub extensions: Vec<ExtensionObject>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: None,
            tables: Vec::new(),
            views: Vec::new(),
            sequences: Vec::new(),
            domains: Vec::new(),
            extensions: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKeyDef> {
        self.constraints.iter().filter_map(|c| match &c.definition {
            ConstraintDef::ForeignKey(fk) => Some(fk),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
    #[serde(default)]
    pub ordinal_position: i32,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            default_value: None,
            collation: None,
            ordinal_position: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexColumn {
    pub name: String,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

fn default_ascending() -> bool {
    true
}

impl IndexColumn {
    pub fn asc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ascending: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum IndexVariant {
    #[default]
    Regular,
    FullText {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        change_tracking: Option<String>,
    },
    Spatial {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        grid: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub name: String,
    pub columns: Vec<IndexColumn>,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub is_clustered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_factor: Option<u8>,
    /// Partial index predicate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default)]
    pub variant: IndexVariant,
}

impl Index {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| IndexColumn::asc(*c)).collect(),
            is_unique: false,
            is_clustered: false,
            fill_factor: None,
            filter: None,
            variant: IndexVariant::Regular,
        }
    }
}

/// Name-based pointer to a table, possibly in another schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyDef {
    pub columns: Vec<String>,
    pub referenced_table: TableRef,
    pub referenced_columns: Vec<String>,
    #[serde(default)]
    pub on_delete: ReferentialAction,
    #[serde(default)]
    pub on_update: ReferentialAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ConstraintDef {
    PrimaryKey { columns: Vec<String> },
    Unique { columns: Vec<String> },
    Check { expression: String },
    Default { column: String, expression: String },
    ForeignKey(ForeignKeyDef),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub name: String,
    pub definition: ConstraintDef,
}

impl Constraint {
    pub fn primary_key(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            definition: ConstraintDef::PrimaryKey {
                columns: columns.iter().map(|c| c.to_string()).collect(),
            },
        }
    }

    pub fn foreign_key(
        name: impl Into<String>,
        columns: &[&str],
        referenced_table: TableRef,
        referenced_columns: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            definition: ConstraintDef::ForeignKey(ForeignKeyDef {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                referenced_table,
                referenced_columns: referenced_columns.iter().map(|c| c.to_string()).collect(),
                on_delete: ReferentialAction::NoAction,
                on_update: ReferentialAction::NoAction,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub name: String,
    pub definition: String,
    #[serde(default)]
    pub check_option: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub name: String,
    pub data_type: String,
    #[serde(default = "default_one")]
    pub start_value: i64,
    #[serde(default = "default_one")]
    pub increment: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i64>,
    #[serde(default)]
    pub is_cyclic: bool,
}

fn default_one() -> i64 {
    1
}

/// User-defined domain type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub name: String,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
}

/// An object kind specific to one backend (partition function, full-text catalog, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionObject {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}
