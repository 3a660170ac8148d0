use axum::extract::{Extension, State};
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::db::models::appointment::{Appointment, AppointmentStatus, AppointmentView};
use crate::middleware::auth::Identity;
use crate::services::approval;
use crate::utils::api_response::ApiResponse;

#[derive(OpenApi)]
#[openapi(
    paths(my_appointments),
    components(schemas(Appointment, AppointmentStatus, AppointmentView)),
    tags(
        (name = "Appointments", description = "Confirmed appointments of the caller")
    )
)]
pub struct AppointmentDoc;

#[utoipa::path(
    get,
    path = "/appointments/my",
    tag = "Appointments",
    responses(
        (status = 200, description = "Approved appointments, soonest first", body = [AppointmentView]),
        (status = 401, description = "Missing or invalid token")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
pub async fn my_appointments(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<ApiResponse<Vec<AppointmentView>>, ApiResponse<()>> {
    let appointments = approval::my_appointments(&state, &identity)
        .await
        .map_err(|e| state.fail(e))?;

    Ok(ApiResponse::ok("Appointments retrieved", appointments))
}
