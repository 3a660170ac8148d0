use axum::{
    routing::{get, put},
    Router,
};

use crate::app_state::AppState;
use crate::db::queries::admin::{approve_booking, list_bookings, reject_booking};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/bookings", get(list_bookings))
        .route("/admin/bookings/{id}/approve", put(approve_booking))
        .route("/admin/bookings/{id}/reject", put(reject_booking))
}
