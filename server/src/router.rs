// Router configuration

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{health_handlers::*, member_handlers::*},
    observability,
    state::AppState,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/health", get(health_handler))
        .route("/vaults/{vault_id}/members", post(add_member_handler))
        .route(
            "/vaults/{vault_id}/members/{member_id}",
            get(check_membership_handler),
        )
        .route(
            "/vaults/{vault_id}/members/{member_id}/remove",
            post(remove_member_handler),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(observability::http_make_span())
                .on_response(observability::response_logger()),
        )
        .layer(cors)
        .layer(observability::request_context_layer())
        .with_state(state)
}
