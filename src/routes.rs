use axum::{
    body::Body,
    http::{HeaderValue, Request},
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::handlers::{protected, public};
use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v0";

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .nest(API_PREFIX, api_routes())
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ok", get(public::ok))
        .route("/token", put(public::token_put))
        .route("/status", get(protected::status_get))
        .route("/whoami", get(protected::whoami_get))
        .route("/org", post(protected::org_post))
        .route("/org/:id", get(protected::org_get).put(protected::org_put))
        .route("/user", post(protected::user_post))
        .route("/user/:id", get(protected::user_get).put(protected::user_put))
        .route("/self", put(protected::self_put))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    if state.config.is_development() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = state
        .config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
