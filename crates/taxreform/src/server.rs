//! HTTP lookup service for single names

use crate::error::ResolveError;
use crate::lineage::CacheStats;
use crate::orchestrator::Orchestrator;
use crate::types::RawQuery;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared state for the HTTP server
pub struct ServerState {
    pub orchestrator: Arc<Orchestrator>,
    /// Default taxonomic context for queries that do not pass one
    pub context: String,
    pub taxon_filter: Vec<String>,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(orchestrator: Arc<Orchestrator>, context: &str, taxon_filter: Vec<String>) -> Self {
        Self {
            orchestrator,
            context: context.to_string(),
            taxon_filter,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    ott_version: Option<String>,
    lineage_cache: CacheStats,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
pub struct ResolveQuery {
    name: String,
    #[serde(default)]
    context: Option<String>,
}

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/resolve", get(resolve))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let lineages = state.orchestrator.lineages();
    Json(HealthResponse {
        status: "ok",
        uptime_secs: (Utc::now() - state.started_at).num_seconds().max(0) as u64,
        ott_version: lineages.source_version().map(str::to_string),
        lineage_cache: lineages.cache_stats(),
    })
}

fn error_response(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

async fn resolve(State(state): State<SharedState>, Query(params): Query<ResolveQuery>) -> Response {
    if params.name.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Missing name");
    }
    let context = params.context.as_deref().unwrap_or(&state.context);
    let query = RawQuery::new(&params.name, context, &state.taxon_filter);

    match state.orchestrator.resolve(&query).await {
        Ok(Some(result)) => Json(result.view()).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Name not found"),
        Err(e @ ResolveError::RetriesExhausted { .. }) => {
            tracing::error!(error = %e, "Resolve failed");
            error_response(StatusCode::SERVICE_UNAVAILABLE, "Name service unavailable")
        }
        Err(e) => {
            tracing::error!(error = %e, "Resolve failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Resolve failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CanonicalParser;
    use crate::testing::{candidate, honeybee_info, taxon_match, FakeFuzzy, FakeTaxonomy};
    use crate::types::DataSource;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn create_test_state() -> SharedState {
        let fuzzy = FakeFuzzy::default().with(
            "Apis meliffera",
            vec![candidate("Apis mellifera", 95.0, DataSource::Ott, None)],
        );
        let taxonomy = FakeTaxonomy::default()
            .with_match(
                "Apis mellifera",
                vec![taxon_match("Apis mellifera", 1.0, 1000, "Apis mellifera", "species", Some("7460"))],
            )
            .with_taxon(honeybee_info());
        let orchestrator = Orchestrator::new(
            Arc::new(fuzzy),
            Arc::new(taxonomy),
            Arc::new(CanonicalParser),
            Some("ott3.6".to_string()),
        );
        Arc::new(ServerState::new(Arc::new(orchestrator), "All life", Vec::new()))
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = create_router(create_test_state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, json) = get_json("/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["ott_version"], "ott3.6");
        assert_eq!(json["lineage_cache"]["hits"], 0);
    }

    #[tokio::test]
    async fn test_resolve_endpoint() {
        let (status, json) = get_json("/resolve?name=Apis%20meliffera").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["matchedName"], "Apis mellifera");
        assert_eq!(json["taxonomicSource"], "OTT");
        assert_eq!(json["taxonomicLevel"], "species");
        assert_eq!(json["lineage"]["ranks"]["order"], "Hymenoptera");
    }

    #[tokio::test]
    async fn test_resolve_unknown_name_is_404() {
        let (status, json) = get_json("/resolve?name=Nullus").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Name not found");
    }

    #[tokio::test]
    async fn test_resolve_blank_name_is_400() {
        let (status, _) = get_json("/resolve?name=%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_resolve_without_name_is_rejected() {
        let response = create_router(create_test_state())
            .oneshot(Request::builder().uri("/resolve").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
