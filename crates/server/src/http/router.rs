use super::handlers::{admin, challenge, products, reviews};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub struct RouterOptions<'a> {
    pub allowed_origins: &'a str,
    pub upload_dir: &'a str,
    pub public_prefix: &'a str,
    pub max_body_bytes: usize,
}

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT];
    if allowed_origins == "*" {
        return CorsLayer::new()
            .allow_methods(methods)
            .allow_origin(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS config is invalid or empty, falling back to allow ANY.");
        CorsLayer::new()
            .allow_methods(methods)
            .allow_origin(Any)
            .allow_headers(Any)
    } else {
        tracing::info!("CORS enabled for origins: {:?}", origins);
        CorsLayer::new()
            .allow_methods(methods)
            .allow_origin(origins)
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
                HeaderName::from_static("x-user-token"),
            ])
    }
}

pub fn build_router(state: AppState, opts: RouterOptions<'_>) -> Router {
    let api = Router::new()
        .route(
            "/api/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route("/api/reviews/sortings", get(reviews::list_sortings))
        .route("/api/products/:id/rating", get(products::rating))
        .route("/api/products/:id/files", get(products::files))
        .route("/api/products/:id/reviewed", get(products::reviewed))
        .route("/api/challenge", get(challenge::get_challenge))
        .route("/api/admin/reviews/:id/approve", post(admin::approve))
        .route("/api/admin/reviews/:id/unpublish", post(admin::unpublish))
        .route("/api/admin/reviews/:id/response", put(admin::respond))
        .route("/api/admin/import", post(admin::run_import))
        .layer(DefaultBodyLimit::max(opts.max_body_bytes))
        .with_state(state);

    api.nest_service(opts.public_prefix, ServeDir::new(opts.upload_dir))
        .layer(cors_layer(opts.allowed_origins))
        .layer(TraceLayer::new_for_http())
}
