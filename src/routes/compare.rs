//! Comparison API Routes
//!
//! Routes for comparing two catalogs posted by the caller.

use crate::catalog::Catalog;
use crate::compare::{CatalogComparisonResult, ComparisonSummary, Hint, HintSet};
use crate::error::ApiResult;
use crate::state::SharedState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

// ==================== Request/Response Types ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub original: Catalog,
    pub new: Catalog,
    /// Rename and ignore hints, applied in order
    #[serde(default)]
    pub hints: Vec<Hint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub success: bool,
    pub has_changes: bool,
    pub summary: ComparisonSummary,
    pub result: CatalogComparisonResult,
}

// ==================== Handlers ====================

/// Compare two catalogs
pub async fn compare_catalogs(
    State(state): State<SharedState>,
    Json(req): Json<CompareRequest>,
) -> ApiResult<Json<CompareResponse>> {
    req.original.validate()?;
    req.new.validate()?;

    let hints = HintSet::from(req.hints);
    let result = state.comparer.compare(&req.original, &req.new, &hints)?;
    let summary = result.summary();

    tracing::info!(
        "Compared catalogs {} and {}: {} changes",
        req.original.name,
        req.new.name,
        summary.total_changes
    );

    Ok(Json(CompareResponse {
        success: true,
        has_changes: result.has_changes(),
        summary,
        result,
    }))
}
