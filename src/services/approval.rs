use tracing::{info, warn};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::models::appointment::{AppointmentDraft, AppointmentView};
use crate::db::models::booking::{ApprovalOutcome, Booking, BookingStatus, BookingView, Decision};
use crate::db::store::GuardedApproval;
use crate::error::AppError;
use crate::middleware::auth::{Capability, Identity};
use crate::services::booking::SLOT_TAKEN;

const NOT_FOUND: &str = "Booking not found";
const ALREADY_PROCESSED: &str = "Booking already processed";

/// Parses the optional `status` filter of the admin listing.
pub fn parse_status_filter(raw: Option<&str>) -> Result<Option<BookingStatus>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(AppError::Validation),
    }
}

pub async fn list_bookings(state: &AppState, admin: &Identity, status: Option<&str>) -> Result<Vec<BookingView>, AppError> {
    admin.require(Capability::ReviewBookings)?;
    let status = parse_status_filter(status)?;
    Ok(state.store.list_bookings(status).await?)
}

pub async fn my_appointments(state: &AppState, caller: &Identity) -> Result<Vec<AppointmentView>, AppError> {
    caller.require(Capability::ViewOwnAppointments)?;
    Ok(state.store.approved_appointments_for(caller.user_id).await?)
}

/// PENDING → APPROVED, then one confirmed appointment.
///
/// The default path neither re-checks the slot nor guards the status write, so
/// two pending requests for one slot can both be approved. With `slot_guard`
/// the whole step runs in one critical section and a taken slot is a conflict.
pub async fn approve_booking(
    state: &AppState,
    admin: &Identity,
    booking_id: Uuid,
    remarks: Option<String>,
) -> Result<ApprovalOutcome, AppError> {
    admin.require(Capability::ReviewBookings)?;
    let remarks = remarks.unwrap_or_default();

    let (booking, appointment) = if state.config.slot_guard {
        match state.store.approve_if_open(booking_id, admin.user_id, remarks).await? {
            GuardedApproval::Approved(booking, appointment) => (booking, appointment),
            GuardedApproval::NotFound => return Err(AppError::not_found(NOT_FOUND)),
            GuardedApproval::AlreadyProcessed => return Err(AppError::conflict(ALREADY_PROCESSED)),
            GuardedApproval::SlotTaken => {
                warn!(%booking_id, "approval refused: slot already approved");
                return Err(AppError::conflict(SLOT_TAKEN));
            }
        }
    } else {
        let current = state
            .store
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
        if !current.status.is_pending() {
            return Err(AppError::conflict(ALREADY_PROCESSED));
        }

        let decision = Decision::Approve { admin_id: admin.user_id, remarks };
        let booking = state
            .store
            .record_decision(booking_id, &decision)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
        let appointment = state
            .store
            .insert_appointment(AppointmentDraft::confirming(&booking))
            .await?;
        (booking, appointment)
    };

    info!(
        %booking_id,
        appointment_id = %appointment.id,
        admin_id = %admin.user_id,
        "✅ booking approved"
    );
    state.notifier.decision_made(booking.clone());
    Ok(ApprovalOutcome { booking, appointment })
}

/// Any existing booking can be rejected, whatever its current status.
pub async fn reject_booking(
    state: &AppState,
    admin: &Identity,
    booking_id: Uuid,
    remarks: Option<String>,
) -> Result<Booking, AppError> {
    admin.require(Capability::ReviewBookings)?;
    let decision = Decision::Reject { remarks: remarks.unwrap_or_default() };

    let booking = state
        .store
        .record_decision(booking_id, &decision)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    info!(%booking_id, admin_id = %admin.user_id, "booking rejected");
    state.notifier.decision_made(booking.clone());
    Ok(booking)
}
