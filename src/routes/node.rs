//! Node API Routes
//!
//! Routes for configured nodes, their virtualized schemas and name mappings.

use crate::catalog::Catalog;
use crate::error::{not_found_error, ApiResult, AppError};
use crate::models::SuccessResponse;
use crate::nodes::{DomainConfig, NameMapping, NodeConfig, NodeMapping, NodeSchemaMapper};
use crate::state::SharedState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

// ==================== Request/Response Types ====================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    pub node_id: String,
    pub is_default: bool,
    /// Server the node connects to, password omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    pub schema_mapping: Vec<NameMapping>,
    pub database_mapping: Vec<NameMapping>,
    /// Whether the cache can serve this node without extraction
    pub cached: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSchemaResponse {
    pub node_id: String,
    pub catalogs: Vec<Catalog>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingQuery {
    /// Logical database (defaults to the domain's default database)
    pub database: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingResponse {
    pub source: String,
    pub target: String,
    pub database: String,
    pub schemas: NodeMapping,
    pub databases: NodeMapping,
}

// ==================== Handlers ====================

/// List the default node and all configured nodes
pub async fn list_nodes(
    State(state): State<SharedState>,
) -> Json<SuccessResponse<Vec<NodeSummary>>> {
    let mut nodes = vec![NodeConfig::default_node()];
    nodes.extend(state.domain.nodes.iter().filter(|n| !n.is_default()).cloned());

    let mut summaries = Vec::with_capacity(nodes.len());
    for node in nodes {
        let server = state
            .domain
            .effective_connection(&node)
            .identity()
            .ok()
            .map(|identity| identity.to_string());
        summaries.push(NodeSummary {
            is_default: node.is_default(),
            server,
            cached: state.schema_cache.contains(&node).await,
            node_id: node.node_id,
            schema_mapping: node.schema_mapping,
            database_mapping: node.database_mapping,
        });
    }

    Json(SuccessResponse::with_data(
        format!("{} nodes configured", summaries.len()),
        summaries,
    ))
}

/// Cached catalogs renamed for one node
pub async fn get_node_schema(
    State(state): State<SharedState>,
    Path(node_id): Path<String>,
) -> ApiResult<Json<NodeSchemaResponse>> {
    let node = find_node(&state.domain, &node_id)?;
    let catalogs = state
        .schema_cache
        .get_node_schema(&node)
        .await
        .ok_or_else(|| AppError::NotCached(node_id.clone()))?;

    Ok(Json(NodeSchemaResponse { node_id, catalogs }))
}

/// Schema and database name mapping between two nodes
pub async fn get_mapping(
    State(state): State<SharedState>,
    Path((source_id, target_id)): Path<(String, String)>,
    Query(query): Query<MappingQuery>,
) -> ApiResult<Json<MappingResponse>> {
    let source = find_node(&state.domain, &source_id)?;
    let target = find_node(&state.domain, &target_id)?;

    let database = query
        .database
        .unwrap_or_else(|| state.domain.default_database.clone());
    if !state.domain.logical_databases().contains(&database.as_str()) {
        return Err(not_found_error(format!(
            "Database '{}' is not part of the domain",
            database
        )));
    }

    let mapper = NodeSchemaMapper::new(&state.domain);
    let schemas = mapper.map_schemas(&database, &source, &target);
    let databases = mapper.map_databases(&source, &target);

    Ok(Json(MappingResponse {
        source: source_id,
        target: target_id,
        database,
        schemas,
        databases,
    }))
}

fn find_node(domain: &DomainConfig, node_id: &str) -> Result<NodeConfig, AppError> {
    domain
        .node(node_id)
        .ok_or_else(|| not_found_error(format!("Node '{}' is not configured", node_id)))
}
