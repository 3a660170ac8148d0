use axum::{routing::get, Router};

use crate::app_state::AppState;
use crate::db::queries::appointment::my_appointments;

pub fn appointment_routes() -> Router<AppState> {
    Router::new().route("/appointments/my", get(my_appointments))
}
