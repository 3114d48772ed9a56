//! SchemaFlow Catalog
//!
//! Structural comparison of relational schema graphs and a multi-tenant
//! schema cache that serves one extracted catalog to many logical nodes.
//!
//! - [`catalog`]: the schema graph every extractor produces
//! - [`compare`]: the comparison engine
//! - [`nodes`]: node configuration, name mapping and the schema cache

pub mod catalog;
pub mod compare;
pub mod config;
pub mod error;
pub mod models;
pub mod nodes;
pub mod routes;
pub mod state;

pub use catalog::Catalog;
pub use compare::{CatalogComparisonResult, HintSet, SchemaComparer};
pub use error::{AppError, CompareError};
pub use nodes::{DomainConfig, NodeConfig, NodeSchemaCache};
