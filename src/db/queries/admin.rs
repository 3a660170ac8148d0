use axum::extract::{Extension, Path, Query, State};
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::models::appointment::Appointment;
use crate::db::models::booking::{ApprovalOutcome, Booking, BookingStatus, BookingView, DecisionRequest, DoctorSummary, RequesterSummary};
use crate::middleware::auth::Identity;
use crate::services::approval;
use crate::utils::api_response::ApiResponse;
use crate::utils::json_body::JsonBody;

#[derive(OpenApi)]
#[openapi(
    paths(list_bookings, approve_booking, reject_booking),
    components(schemas(
        ApprovalOutcome,
        Appointment,
        Booking,
        BookingStatus,
        BookingView,
        DecisionRequest,
        DoctorSummary,
        RequesterSummary
    )),
    tags(
        (name = "Admin", description = "Booking review for administrators")
    )
)]
pub struct AdminDoc;

#[derive(Debug, Deserialize, IntoParams)]
pub struct BookingFilter {
    /// PENDING, APPROVED or REJECTED (any case)
    pub status: Option<String>,
}

#[utoipa::path(
    get,
    path = "/admin/bookings",
    tag = "Admin",
    params(BookingFilter),
    responses(
        (status = 200, description = "Bookings, newest first", body = [BookingView]),
        (status = 400, description = "Unknown status filter"),
        (status = 403, description = "Admin access required")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(filter): Query<BookingFilter>,
) -> Result<ApiResponse<Vec<BookingView>>, ApiResponse<()>> {
    let bookings = approval::list_bookings(&state, &identity, filter.status.as_deref())
        .await
        .map_err(|e| state.fail(e))?;

    Ok(ApiResponse::ok("Bookings retrieved", bookings))
}

#[utoipa::path(
    put,
    path = "/admin/bookings/{id}/approve",
    tag = "Admin",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Booking approved and appointment created", body = ApprovalOutcome),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking already processed or slot taken")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
pub async fn approve_booking(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    body: Option<JsonBody<DecisionRequest>>,
) -> Result<ApiResponse<ApprovalOutcome>, ApiResponse<()>> {
    let request = body.map(|JsonBody(request)| request).unwrap_or_default();

    let outcome = approval::approve_booking(&state, &identity, id, request.admin_remarks)
        .await
        .map_err(|e| state.fail(e))?;

    Ok(ApiResponse::ok("Booking approved successfully", outcome))
}

#[utoipa::path(
    put,
    path = "/admin/bookings/{id}/reject",
    tag = "Admin",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Booking rejected", body = Booking),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Booking not found")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
pub async fn reject_booking(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    body: Option<JsonBody<DecisionRequest>>,
) -> Result<ApiResponse<Booking>, ApiResponse<()>> {
    let request = body.map(|JsonBody(request)| request).unwrap_or_default();

    let booking = approval::reject_booking(&state, &identity, id, request.admin_remarks)
        .await
        .map_err(|e| state.fail(e))?;

    Ok(ApiResponse::ok("Booking rejected", booking))
}
