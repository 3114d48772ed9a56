//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::compare::SchemaComparer;
use crate::nodes::{DomainConfig, NodeSchemaCache};
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Domain and node configuration loaded at startup
    pub domain: Arc<DomainConfig>,

    /// Schema comparison engine (stateless between calls)
    pub comparer: SchemaComparer,

    /// Extracted catalogs served to all nodes (has internal locking)
    pub schema_cache: NodeSchemaCache,
}

impl AppState {
    pub fn new(domain: DomainConfig) -> Self {
        let domain = Arc::new(domain);
        Self {
            schema_cache: NodeSchemaCache::new(domain.clone()),
            comparer: SchemaComparer::new(),
            domain,
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
