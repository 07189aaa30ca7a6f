// SPDX-License-Identifier: GPL-3.0-or-later
pub mod handlers;

use axum::{routing::get, Json, Router};
use handlers::search::{
    search, ErrorResponse, LyricsResponse, RecordResponse, __path_search,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use yutify_application::AppState;

#[derive(Serialize, utoipa::ToSchema)]
struct HealthResponse {
    status: &'static str,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(OpenApi)]
#[openapi(
    paths(health, search),
    components(schemas(HealthResponse, RecordResponse, LyricsResponse, ErrorResponse)),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "search", description = "Cross-catalog song resolution")
    ),
    info(
        title = "Yutify API",
        version = "0.1.0",
        description = "Resolves one song across Spotify, Deezer, iTunes, YouTube Music and KKBOX",
    )
)]
struct ApiDoc;

pub fn router(state: AppState) -> Router {
    info!(target: "api", "building router");

    let api = Router::new()
        .route("/search/:query", get(search))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}
