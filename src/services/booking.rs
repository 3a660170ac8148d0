use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::models::booking::{is_slot_label, Booking, BookingDraft, NewBooking};
use crate::db::models::doctor::Doctor;
use crate::error::AppError;
use crate::middleware::auth::{Capability, Identity};

pub const SLOT_TAKEN: &str = "This time slot is already booked";

fn present(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn parse_doctor_id(raw: &str) -> Result<Uuid, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::validation("Invalid doctor id"))
}

pub fn parse_date(raw: &str) -> Result<String, AppError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|_| raw.to_string())
        .map_err(|_| AppError::validation("Date must be formatted as YYYY-MM-DD"))
}

/// Checks a request body and turns it into a draft owned by `requester_id`.
pub fn validate_new_booking(requester_id: Uuid, payload: NewBooking) -> Result<BookingDraft, AppError> {
    let (Some(doctor_id), Some(reason), Some(date), Some(time)) = (
        present(payload.doctor_id),
        present(payload.reason),
        present(payload.requested_date),
        present(payload.requested_time),
    ) else {
        return Err(AppError::validation("All fields are required"));
    };

    let doctor_id = parse_doctor_id(&doctor_id)?;
    let requested_date = parse_date(&date)?;
    if !is_slot_label(&time) {
        return Err(AppError::validation(format!("'{time}' is not a bookable time slot")));
    }

    Ok(BookingDraft {
        id: Uuid::new_v4(),
        requester_id,
        doctor_id,
        reason,
        requested_date,
        requested_time: time,
    })
}

/// Records a PENDING booking unless the slot already has an APPROVED one.
///
/// Without `slot_guard` the check and the insert are two separate store calls,
/// so concurrent requests can both pass the check.
pub async fn create_booking(state: &AppState, requester: &Identity, payload: NewBooking) -> Result<Booking, AppError> {
    requester.require(Capability::RequestBooking)?;
    let draft = validate_new_booking(requester.user_id, payload)?;

    let doctor: Doctor = state
        .store
        .find_doctor(draft.doctor_id)
        .await?
        .ok_or_else(|| AppError::not_found("Doctor not found"))?;

    let slot = draft.slot();
    let booking = if state.config.slot_guard {
        state.store.insert_booking_if_open(draft).await?
    } else if state.store.approved_booking_at(&slot).await?.is_some() {
        None
    } else {
        Some(state.store.insert_booking(draft).await?)
    };

    let Some(booking) = booking else {
        warn!(doctor_id = %slot.doctor_id, date = %slot.date, time = %slot.time, "booking refused: slot already approved");
        return Err(AppError::conflict(SLOT_TAKEN));
    };

    info!(
        booking_id = %booking.id,
        requester_id = %booking.requester_id,
        doctor = %doctor.name,
        date = %booking.requested_date,
        time = %booking.requested_time,
        "✅ booking request submitted"
    );
    Ok(booking)
}

/// Time labels held by APPROVED bookings, in the order they were booked.
pub async fn blocked_slots(state: &AppState, doctor_id: &str, date: Option<&str>) -> Result<Vec<String>, AppError> {
    let date = date
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::validation("Date is required"))?;
    let date = parse_date(date)?;
    let doctor_id = parse_doctor_id(doctor_id)?;

    Ok(state.store.blocked_slots(doctor_id, &date).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn body(doctor: &str, reason: &str, date: &str, time: &str) -> NewBooking {
        NewBooking {
            doctor_id: Some(doctor.into()),
            reason: Some(reason.into()),
            requested_date: Some(date.into()),
            requested_time: Some(time.into()),
        }
    }

    #[test]
    fn accepts_a_complete_request() {
        let doctor = Uuid::new_v4();
        let requester = Uuid::new_v4();
        let draft = assert_ok!(validate_new_booking(
            requester,
            body(&doctor.to_string(), " checkup ", "2025-01-10", "09:00 AM")
        ));
        assert_eq!(draft.doctor_id, doctor);
        assert_eq!(draft.requester_id, requester);
        assert_eq!(draft.reason, "checkup");
    }

    #[test]
    fn blank_fields_count_as_missing() {
        let doctor = Uuid::new_v4().to_string();
        let err = assert_err!(validate_new_booking(Uuid::new_v4(), body(&doctor, "   ", "2025-01-10", "09:00 AM")));
        assert_eq!(err.to_string(), "All fields are required");

        let mut missing_time = body(&doctor, "checkup", "2025-01-10", "09:00 AM");
        missing_time.requested_time = None;
        assert!(matches!(validate_new_booking(Uuid::new_v4(), missing_time), Err(AppError::Validation(_))));
    }

    #[test]
    fn malformed_values_are_validation_errors() {
        let doctor = Uuid::new_v4().to_string();
        assert!(matches!(
            validate_new_booking(Uuid::new_v4(), body("D1", "checkup", "2025-01-10", "09:00 AM")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_new_booking(Uuid::new_v4(), body(&doctor, "checkup", "10/01/2025", "09:00 AM")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_new_booking(Uuid::new_v4(), body(&doctor, "checkup", "2025-01-10", "13:00")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn dates_must_exist_on_the_calendar() {
        assert_ok!(parse_date("2024-02-29"));
        assert_err!(parse_date("2025-02-29"));
    }
}
