use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::route_not_found;
use crate::handler::{
    AppState, add_school, delete_school, get_school, healthcheck, list_schools, update_school,
};

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod model;
pub mod proximity;
pub mod repository;
pub mod validate;

/// Builds the full HTTP surface over the given state. Unknown paths and
/// unsupported methods on known paths both get the 404 endpoint listing.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/addSchool", post(add_school).fallback(route_not_found))
        .route("/listSchools", get(list_schools).fallback(route_not_found))
        .route(
            "/school/:id",
            get(get_school)
                .put(update_school)
                .delete(delete_school)
                .fallback(route_not_found),
        )
        .route("/health", get(healthcheck).fallback(route_not_found))
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
