use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::booking::{Booking, DoctorSummary};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(type_name = "appointment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Rejected,
}

/// Confirmed appointment, spawned by approving a booking.
#[derive(Debug, Serialize, Deserialize, Clone, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub doctor_id: Uuid,
    pub date: String,
    pub time: String,
    pub reason: String,
    pub status: AppointmentStatus,
    pub booking_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct AppointmentDraft {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub doctor_id: Uuid,
    pub date: String,
    pub time: String,
    pub reason: String,
    pub status: AppointmentStatus,
    pub booking_id: Uuid,
}

impl AppointmentDraft {
    /// Copy of an approved booking
    pub fn confirming(booking: &Booking) -> Self {
        Self {
            id: Uuid::new_v4(),
            requester_id: booking.requester_id,
            doctor_id: booking.doctor_id,
            date: booking.requested_date.clone(),
            time: booking.requested_time.clone(),
            reason: booking.reason.clone(),
            status: AppointmentStatus::Approved,
            booking_id: booking.id,
        }
    }

    pub fn into_appointment(self, now: NaiveDateTime) -> Appointment {
        Appointment {
            id: self.id,
            requester_id: self.requester_id,
            doctor_id: self.doctor_id,
            date: self.date,
            time: self.time,
            reason: self.reason,
            status: self.status,
            booking_id: Some(self.booking_id),
            created_at: now,
            updated_at: now,
        }
    }
}

/// `GET /appointments/my` row
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor: Option<DoctorSummary>,
}
