use axum::extract::State;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::db::models::doctor::Doctor;
use crate::error::AppError;
use crate::utils::api_response::ApiResponse;

#[derive(OpenApi)]
#[openapi(
    paths(list_doctors),
    components(schemas(Doctor)),
    tags(
        (name = "Doctors", description = "Doctor directory")
    )
)]
pub struct DoctorDoc;

/// Doctors currently taking bookings, by name.
#[utoipa::path(
    get,
    path = "/doctors",
    tag = "Doctors",
    responses(
        (status = 200, description = "Available doctors", body = [Doctor])
    )
)]
pub async fn list_doctors(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Doctor>>, ApiResponse<()>> {
    let doctors = state
        .store
        .available_doctors()
        .await
        .map_err(|e| state.fail(AppError::from(e)))?;

    Ok(ApiResponse::ok("Doctors retrieved", doctors))
}
