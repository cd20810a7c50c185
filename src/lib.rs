pub mod api;
pub mod config;
pub mod infrastructure;
pub mod services;
pub mod ui;
pub mod utils;

use crate::api::middleware::request_id::REQUEST_ID_HEADER;
use crate::config::AppConfig;
use crate::services::session::AnalysisService;
use crate::services::staging::StagingStore;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Multipart framing on top of the document itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::analyze::analyze_document,
        api::handlers::analyze::retry_analysis,
        api::handlers::analyze::list_staged,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::analyze::AnalysisResponse,
            api::handlers::analyze::StagedFilesResponse,
            api::handlers::analyze::UploadRequest,
            api::handlers::health::HealthResponse,
            services::staging::StagedFile,
            services::session::Notice,
            services::session::NoticeLevel,
        )
    ),
    tags(
        (name = "analysis", description = "Document upload and proofreading"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub staging: Arc<dyn StagingStore>,
    pub analysis: Arc<AnalysisService>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_file_size.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route(
            "/",
            get(api::handlers::page::index).post(api::handlers::page::submit),
        )
        .route("/retry", post(api::handlers::page::retry))
        .route(
            "/api/analyze",
            post(api::handlers::analyze::analyze_document),
        )
        .route(
            "/api/analyze/retry",
            post(api::handlers::analyze::retry_analysis),
        )
        .route("/api/staged", get(api::handlers::analyze::list_staged))
        .route("/health", get(api::handlers::health::health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        // Sits inside the request-id layer so the span sees the id it assigns
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
