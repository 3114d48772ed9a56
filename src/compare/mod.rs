//! Comparison Engine
//!
//! Structural comparison of two schema graphs:
//! - Per-kind comparers resolved through a static provider table
//! - A per-pass registry that memoizes results and breaks reference cycles
//! - Rename and ignore hints that override name-based matching
//! - Immutable result trees with change summaries

pub mod comparer;
pub mod comparers;
pub mod context;
pub mod hints;
pub mod provider;
pub mod registry;
pub mod result;
pub mod summary;

pub use comparer::{CatalogComparisonResult, SchemaComparer};
pub use comparers::Comparer;
pub use context::ComparisonContext;
pub use hints::{Hint, HintSet};
pub use provider::ComparerProvider;
pub use registry::{ComparisonRegistry, PairKey, RegistryEntry};
pub use result::{ComparisonResult, NodeIdentity, PropertyResult, ResultBuilder, ResultFactory, ResultType};
pub use summary::{ChangeCounts, ComparisonSummary};
