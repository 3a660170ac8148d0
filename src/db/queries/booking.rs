use axum::extract::{Extension, Path, Query, State};
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi};

use crate::app_state::AppState;
use crate::db::models::booking::{Booking, NewBooking};
use crate::middleware::auth::Identity;
use crate::services::booking as service;
use crate::utils::api_response::ApiResponse;
use crate::utils::json_body::JsonBody;

#[derive(OpenApi)]
#[openapi(
    paths(create_booking, get_blocked_slots),
    components(schemas(Booking, NewBooking)),
    tags(
        (name = "Bookings", description = "Booking requests and doctor availability")
    )
)]
pub struct BookingDoc;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SlotQuery {
    /// Calendar date, `YYYY-MM-DD`
    pub date: Option<String>,
}

#[utoipa::path(
    post,
    path = "/bookings",
    tag = "Bookings",
    request_body = NewBooking,
    responses(
        (status = 201, description = "Booking request recorded as PENDING", body = Booking),
        (status = 400, description = "Missing or malformed fields"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Doctor not found"),
        (status = 409, description = "Slot already approved for another booking")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    body: Option<JsonBody<NewBooking>>,
) -> Result<ApiResponse<Booking>, ApiResponse<()>> {
    let payload = body.map(|JsonBody(payload)| payload).unwrap_or_default();

    let booking = service::create_booking(&state, &identity, payload)
        .await
        .map_err(|e| state.fail(e))?;

    Ok(ApiResponse::created("Booking request submitted successfully", booking))
}

#[utoipa::path(
    get,
    path = "/bookings/doctor/{doctor_id}/slots",
    tag = "Bookings",
    params(
        ("doctor_id" = String, Path, description = "Doctor ID"),
        SlotQuery
    ),
    responses(
        (status = 200, description = "Time labels already approved on that date", body = [String]),
        (status = 400, description = "Missing or malformed date or doctor id")
    )
)]
pub async fn get_blocked_slots(
    State(state): State<AppState>,
    Path(doctor_id): Path<String>,
    Query(query): Query<SlotQuery>,
) -> Result<ApiResponse<Vec<String>>, ApiResponse<()>> {
    let blocked = service::blocked_slots(&state, &doctor_id, query.date.as_deref())
        .await
        .map_err(|e| state.fail(e))?;

    Ok(ApiResponse::ok("Booked slots retrieved", blocked))
}
