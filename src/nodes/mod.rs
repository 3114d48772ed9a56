//! Node Module
//!
//! Multi-tenant schema virtualization:
//! - Domain and node configuration with logical → physical name mappings
//! - Connection identity by value
//! - Schema/database name translation between nodes
//! - A process-lifetime cache serving one extracted catalog to many nodes

pub mod cache;
pub mod config;
pub mod connection;
pub mod mapper;

pub use cache::{CacheEntryInfo, CachedCatalog, NodeSchemaCache};
pub use config::{DomainConfig, MappingRule, NameMapping, NodeConfig, DEFAULT_NODE_ID};
pub use connection::{ConnectionIdentity, ConnectionInfo, ConnectionParams};
pub use mapper::{NodeMapping, NodeSchemaMapper};
