use axum::{routing::get, Router};

use crate::app_state::AppState;
use crate::db::queries::doctor::list_doctors;

pub fn doctor_routes() -> Router<AppState> {
    Router::new().route("/doctors", get(list_doctors))
}
