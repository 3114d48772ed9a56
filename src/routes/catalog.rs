//! Catalog Cache API Routes
//!
//! Routes through which extractors hand catalogs to the node schema cache.

use crate::catalog::Catalog;
use crate::error::{not_found_error, validation_error, ApiResult, AppError};
use crate::models::SuccessResponse;
use crate::nodes::CacheEntryInfo;
use crate::state::SharedState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ==================== Request/Response Types ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddCatalogRequest {
    /// Node the catalog was extracted for
    #[validate(length(min = 1, message = "Node id is required"))]
    pub node_id: String,
    pub catalog: Catalog,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCatalogResponse {
    pub database: String,
    /// Checksum of the cached entry, which is the first catalog added
    pub checksum: String,
    /// False when a catalog for the same connection and database was already cached
    pub added: bool,
}

// ==================== Handlers ====================

/// Add an extracted catalog to the schema cache
pub async fn add_catalog(
    State(state): State<SharedState>,
    Json(req): Json<AddCatalogRequest>,
) -> ApiResult<Json<SuccessResponse<AddCatalogResponse>>> {
    req.validate()
        .map_err(|e| validation_error(e.to_string()))?;
    req.catalog.validate()?;

    let node = state
        .domain
        .node(&req.node_id)
        .ok_or_else(|| not_found_error(format!("Node '{}' is not configured", req.node_id)))?;

    // A catalog outside the node's databases would never be looked up
    let database = req.catalog.name.clone();
    let known = state
        .domain
        .logical_databases()
        .into_iter()
        .any(|logical| node.physical_database(logical) == database);
    if !known {
        return Err(AppError::BadRequest(format!(
            "Database '{}' is not mapped by node '{}'",
            database, node.node_id
        )));
    }

    let added = state.schema_cache.add(req.catalog, &node).await?;
    let checksum = state
        .schema_cache
        .cached(&node, &database)
        .await
        .map(|entry| entry.checksum.clone())
        .ok_or_else(|| AppError::Internal(format!("Catalog '{}' missing after add", database)))?;

    let message = if added {
        format!("Catalog '{}' cached for node '{}'", database, node.node_id)
    } else {
        format!("Catalog '{}' was already cached", database)
    };

    Ok(Json(SuccessResponse::with_data(
        message,
        AddCatalogResponse {
            database,
            checksum,
            added,
        },
    )))
}

/// List cache entries
pub async fn list_catalogs(
    State(state): State<SharedState>,
) -> Json<SuccessResponse<Vec<CacheEntryInfo>>> {
    let entries = state.schema_cache.entries().await;
    Json(SuccessResponse::with_data(
        format!("{} cached catalogs", entries.len()),
        entries,
    ))
}
