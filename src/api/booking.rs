use axum::{
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;
use crate::db::queries::booking::{create_booking, get_blocked_slots};

/// Routes that need a signed-in caller.
pub fn booking_routes() -> Router<AppState> {
    Router::new().route("/bookings", post(create_booking))
}

pub fn public_booking_routes() -> Router<AppState> {
    Router::new().route("/bookings/doctor/{doctor_id}/slots", get(get_blocked_slots))
}
