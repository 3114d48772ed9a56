//! Node Schema Mapper
//!
//! Derives the name translation between two nodes of one domain. Both nodes
//! map the same logical names, so translating node A's physical name into node
//! B's goes through the logical name they share.

use super::config::{DomainConfig, NodeConfig};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

/// Ordered source → target name translation for one namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NodeMapping {
    names: IndexMap<String, String>,
}

impl NodeMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pair; a source name already mapped keeps its first target
    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) -> bool {
        let from = from.into();
        if self.names.contains_key(&from) {
            return false;
        }
        self.names.insert(from, to.into());
        true
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    /// Translate a name; names without a mapping are returned unchanged
    pub fn apply<'m>(&'m self, name: &'m str) -> &'m str {
        self.get(name).unwrap_or(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Target → source mapping
    pub fn inverse(&self) -> NodeMapping {
        let mut inverse = NodeMapping::new();
        for (from, to) in self.iter() {
            inverse.insert(to, from);
        }
        inverse
    }
}

pub struct NodeSchemaMapper<'d> {
    domain: &'d DomainConfig,
}

impl<'d> NodeSchemaMapper<'d> {
    pub fn new(domain: &'d DomainConfig) -> Self {
        Self { domain }
    }

    /// Schema names of `source` → schema names of `target` within one logical database
    pub fn map_schemas(&self, database: &str, source: &NodeConfig, target: &NodeConfig) -> NodeMapping {
        let mut mapping = NodeMapping::new();
        for logical in self.domain.logical_schemas(database) {
            let from = source.physical_schema(logical);
            let to = target.physical_schema(logical);
            if !mapping.insert(from, to) {
                warn!(
                    source = %source.node_id,
                    schema = from,
                    "Several logical schemas share one physical schema, keeping the first"
                );
            }
        }
        mapping
    }

    /// Database names of `source` → database names of `target`
    pub fn map_databases(&self, source: &NodeConfig, target: &NodeConfig) -> NodeMapping {
        let mut mapping = NodeMapping::new();
        for logical in self.domain.logical_databases() {
            mapping.insert(source.physical_database(logical), target.physical_database(logical));
        }
        mapping
    }
}
