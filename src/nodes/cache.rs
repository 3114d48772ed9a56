//! Node Schema Cache
//!
//! Catalogs extracted for one node, kept for the process lifetime and served to
//! other nodes on the same server by cloning and renaming schemas.
//! Lookups take a shared read lock; `add` takes the write lock briefly.

use super::config::{DomainConfig, NodeConfig};
use super::connection::ConnectionIdentity;
use super::mapper::NodeSchemaMapper;
use crate::catalog::{Catalog, ConstraintDef};
use crate::config::ConfigError;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Connection identity plus physical database name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    identity: ConnectionIdentity,
    database: String,
}

/// A cached extraction
#[derive(Debug)]
pub struct CachedCatalog {
    pub catalog: Arc<Catalog>,
    /// Node the catalog was extracted for; its schema names are the physical ones
    pub source: NodeConfig,
    pub logical_database: String,
    pub checksum: String,
    pub cached_at: DateTime<Utc>,
}

/// Diagnostics view of one cache entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntryInfo {
    pub server: String,
    pub database: String,
    pub logical_database: String,
    pub source_node: String,
    pub schemas: usize,
    pub checksum: String,
    pub cached_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct NodeSchemaCache {
    domain: Arc<DomainConfig>,
    entries: Arc<RwLock<HashMap<CacheKey, Arc<CachedCatalog>>>>,
}

impl NodeSchemaCache {
    pub fn new(domain: Arc<DomainConfig>) -> Self {
        Self {
            domain,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn domain(&self) -> &DomainConfig {
        &self.domain
    }

    /// Cache a catalog extracted for `source`
    ///
    /// The catalog name is the physical database. The first catalog cached for
    /// a server and database wins; later ones are ignored and `false` is returned.
    pub async fn add(&self, catalog: Catalog, source: &NodeConfig) -> Result<bool, ConfigError> {
        let identity = self.domain.effective_connection(source).identity()?;
        let key = CacheKey {
            identity,
            database: catalog.name.clone(),
        };

        let logical_database = self
            .domain
            .logical_databases()
            .into_iter()
            .find(|logical| source.physical_database(logical) == catalog.name)
            .unwrap_or(catalog.name.as_str())
            .to_string();

        let checksum = catalog.checksum();
        let schemas = catalog.schemas.len();
        let entry = Arc::new(CachedCatalog {
            catalog: Arc::new(catalog),
            source: source.clone(),
            logical_database,
            checksum,
            cached_at: Utc::now(),
        });

        // Only the insert runs under the write lock
        let inserted = {
            let mut entries = self.entries.write().await;
            if entries.contains_key(&key) {
                false
            } else {
                entries.insert(key.clone(), entry.clone());
                true
            }
        };
        if !inserted {
            debug!(
                server = %key.identity,
                database = %key.database,
                node = %source.node_id,
                "Catalog already cached, keeping the first"
            );
            return Ok(false);
        }

        info!(
            server = %key.identity,
            database = %key.database,
            node = %source.node_id,
            schemas,
            checksum = %entry.checksum,
            "Cached catalog"
        );
        Ok(true)
    }

    /// Catalogs for `target`, one per physical database it maps into
    ///
    /// Returns `None` unless every logical database of the domain is cached for
    /// the target's server. The returned catalogs are independent copies holding
    /// exactly the target's schemas under its own names.
    pub async fn get_node_schema(&self, target: &NodeConfig) -> Option<Vec<Catalog>> {
        let groups = self.lookup(target).await?;
        let mapper = NodeSchemaMapper::new(&self.domain);

        let catalogs = groups
            .into_iter()
            .map(|(database, (entry, logical_databases))| {
                virtualize(&mapper, &entry, target, &database, &logical_databases)
            })
            .collect();
        Some(catalogs)
    }

    /// The entry cached for `source`'s connection and a physical database
    pub async fn cached(&self, source: &NodeConfig, database: &str) -> Option<Arc<CachedCatalog>> {
        let identity = self.domain.effective_connection(source).identity().ok()?;
        let key = CacheKey {
            identity,
            database: database.to_string(),
        };
        self.entries.read().await.get(&key).cloned()
    }

    /// Whether [`get_node_schema`](Self::get_node_schema) would hit for `target`
    pub async fn contains(&self, target: &NodeConfig) -> bool {
        self.lookup(target).await.is_some()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn entries(&self) -> Vec<CacheEntryInfo> {
        let entries = self.entries.read().await;
        let mut infos: Vec<CacheEntryInfo> = entries
            .iter()
            .map(|(key, entry)| CacheEntryInfo {
                server: key.identity.to_string(),
                database: key.database.clone(),
                logical_database: entry.logical_database.clone(),
                source_node: entry.source.node_id.clone(),
                schemas: entry.catalog.schemas.len(),
                checksum: entry.checksum.clone(),
                cached_at: entry.cached_at,
            })
            .collect();
        infos.sort_by(|a, b| (&a.server, &a.database).cmp(&(&b.server, &b.database)));
        infos
    }

    /// Cached entries grouped by the target's physical database
    async fn lookup(
        &self,
        target: &NodeConfig,
    ) -> Option<IndexMap<String, (Arc<CachedCatalog>, Vec<String>)>> {
        let identity = match self.domain.effective_connection(target).identity() {
            Ok(identity) => identity,
            Err(err) => {
                warn!(node = %target.node_id, error = %err, "Unusable node connection");
                return None;
            }
        };

        let entries = self.entries.read().await;
        let mut groups: IndexMap<String, (Arc<CachedCatalog>, Vec<String>)> = IndexMap::new();
        for logical in self.domain.logical_databases() {
            let key = CacheKey {
                identity: identity.clone(),
                database: target.physical_database(logical).to_string(),
            };
            let Some(entry) = entries.get(&key) else {
                debug!(
                    node = %target.node_id,
                    server = %key.identity,
                    database = %key.database,
                    "Schema cache miss"
                );
                return None;
            };
            groups
                .entry(key.database)
                .or_insert_with(|| (entry.clone(), Vec::new()))
                .1
                .push(logical.to_string());
        }

        debug!(node = %target.node_id, databases = groups.len(), "Schema cache hit");
        Some(groups)
    }
}

/// Clone a cached catalog into the target node's names
fn virtualize(
    mapper: &NodeSchemaMapper<'_>,
    entry: &CachedCatalog,
    target: &NodeConfig,
    database: &str,
    logical_databases: &[String],
) -> Catalog {
    let mut renames: IndexMap<String, String> = IndexMap::new();
    for logical in logical_databases {
        let mapping = mapper.map_schemas(logical, &entry.source, target);
        for (from, to) in mapping.iter() {
            if renames.contains_key(from) {
                continue;
            }
            if renames.values().any(|existing| existing == to) {
                warn!(
                    node = %target.node_id,
                    schema = from,
                    target_schema = to,
                    "Two schemas map onto one target schema, skipping"
                );
                continue;
            }
            renames.insert(from.to_string(), to.to_string());
        }
    }

    let source = &entry.catalog;
    let mut schemas = Vec::with_capacity(renames.len());
    for schema in &source.schemas {
        let Some(name) = renames.get(&schema.name) else {
            continue;
        };
        let mut schema = schema.clone();
        schema.name = name.clone();
        for table in &mut schema.tables {
            for constraint in &mut table.constraints {
                if let ConstraintDef::ForeignKey(fk) = &mut constraint.definition {
                    if let Some(renamed) = renames.get(&fk.referenced_table.schema) {
                        fk.referenced_table.schema = renamed.clone();
                    }
                }
            }
        }
        schemas.push(schema);
    }

    Catalog {
        name: database.to_string(),
        default_schema: source
            .default_schema
            .as_ref()
            .and_then(|s| renames.get(s))
            .cloned(),
        schemas,
    }
}
