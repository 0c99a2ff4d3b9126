//! HTTP front end for the resolver.

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::resolver::{ResolutionOutcome, Resolver};

/// Query parameter carrying the address to resolve.
pub const ADDRESS_PARAM: &str = "addr";

const MISSING_ADDRESS_MSG: &str = "Missing required 'addr' parameter in proxy service request";
const PROVIDER_FAILURE_MSG: &str = "An error occurred with 3rd party geocode providers";
const INTERNAL_ERROR_MSG: &str = "An unknown error occurred with the geocode proxy service";

/// JSON body of every response, tagged by its `status` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Payload {
    Ok { loc: String },
    Debug { msg: Vec<String> },
    Fail { msg: String },
}

impl Payload {
    fn fail(msg: impl Into<String>) -> Self {
        Payload::Fail { msg: msg.into() }
    }
}

#[derive(Clone)]
struct AppState {
    resolver: Arc<Resolver>,
    cache_max_age: u32,
}

/// Build the router serving `config.path`; every other path answers 404.
pub fn router(resolver: Arc<Resolver>, config: &ServerConfig) -> Router {
    let state = AppState {
        resolver,
        cache_max_age: config.cache_max_age,
    };

    Router::new()
        .route(&config.path, get(geocode))
        .fallback(unknown_path)
        .with_state(state)
}

/// Bind the listener and serve until Ctrl-C.
pub async fn serve(resolver: Arc<Resolver>, config: &ServerConfig) -> Result<()> {
    let app = router(resolver, config);
    let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
    tracing::info!(
        "Geocode proxy listening on http://{}{}",
        listener.local_addr()?,
        config.path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Geocode proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

async fn geocode(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(addr) = params
        .get(ADDRESS_PARAM)
        .filter(|addr| !addr.is_empty())
        .cloned()
    else {
        return respond(
            StatusCode::BAD_REQUEST,
            Payload::fail(MISSING_ADDRESS_MSG),
            state.cache_max_age,
        );
    };

    // Provider queries block, keep them off the async workers.
    let resolver = Arc::clone(&state.resolver);
    let outcome = tokio::task::spawn_blocking(move || resolver.resolve(&addr)).await;

    let (status, payload) = match outcome {
        Ok(ResolutionOutcome::Resolved(location)) => (
            StatusCode::OK,
            Payload::Ok {
                loc: location.to_string(),
            },
        ),
        Ok(ResolutionOutcome::DebugTrace(entries)) => {
            (StatusCode::OK, Payload::Debug { msg: entries })
        }
        Ok(ResolutionOutcome::Failed) => {
            (StatusCode::BAD_GATEWAY, Payload::fail(PROVIDER_FAILURE_MSG))
        }
        Err(err) => {
            tracing::error!(error = %err, "Unexpected runtime error while resolving address");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Payload::fail(INTERNAL_ERROR_MSG),
            )
        }
    };

    respond(status, payload, state.cache_max_age)
}

async fn unknown_path(uri: Uri) -> Response {
    let path = uri
        .path_and_query()
        .map_or_else(|| uri.path(), |pq| pq.as_str());
    respond(
        StatusCode::NOT_FOUND,
        Payload::fail(format!("Unknown resource path '{}'", path)),
        0,
    )
}

fn respond(status: StatusCode, payload: Payload, cache_max_age: u32) -> Response {
    let mut response = (status, Json(payload)).into_response();

    if status == StatusCode::OK && cache_max_age > 0 {
        let value = format!("public, max-age={}", cache_max_age);
        if let Ok(value) = HeaderValue::from_str(&value) {
            response.headers_mut().insert(header::CACHE_CONTROL, value);
        }
    }

    response
}
