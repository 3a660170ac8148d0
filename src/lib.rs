//! Doctor booking service: a slot ledger of booking requests, an admin
//! approval workflow that turns approvals into appointments, and a public
//! availability query.

pub mod api;
pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod services;
pub mod utils;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa_rapidoc::RapiDoc;

use crate::app_state::AppState;
use crate::middleware::auth::{authenticate, require_admin};

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Full HTTP surface with middleware and state applied.
pub fn app(state: AppState) -> Router {
    // Public routes
    let public_routes = Router::new()
        .merge(api::doctor::doctor_routes())
        .merge(api::booking::public_booking_routes());

    // Signed-in callers
    let member_routes = Router::new()
        .merge(api::booking::booking_routes())
        .merge(api::appointment::appointment_routes())
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    // Admins only; authenticate runs first
    let admin_routes = api::admin::admin_routes()
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .merge(api::health::health_routes())
        .merge(public_routes)
        .merge(member_routes)
        .merge(admin_routes)
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", api::docs::api_doc()).path("/rapidoc"))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
