// src/db/models/booking.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use super::appointment::Appointment;

/// Labels a requester may book, morning then evening.
pub const SLOT_LABELS: [&str; 12] = [
    "09:00 AM", "09:30 AM", "10:00 AM", "10:30 AM", "11:00 AM", "11:30 AM",
    "02:00 PM", "02:30 PM", "03:00 PM", "03:30 PM", "04:00 PM", "04:30 PM",
];

pub fn is_slot_label(label: &str) -> bool {
    SLOT_LABELS.contains(&label)
}

/// PENDING is the only non-terminal state.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
}

impl BookingStatus {
    pub fn is_pending(self) -> bool {
        self == BookingStatus::Pending
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Approved => "APPROVED",
            BookingStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(BookingStatus::Pending),
            "APPROVED" => Ok(BookingStatus::Approved),
            "REJECTED" => Ok(BookingStatus::Rejected),
            other => Err(format!("Unknown booking status '{other}'")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub doctor_id: Uuid,
    pub reason: String,
    /// `YYYY-MM-DD`
    pub requested_date: String,
    /// One of [`SLOT_LABELS`]
    pub requested_time: String,
    pub status: BookingStatus,
    pub admin_remarks: String,
    pub approved_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn slot(&self) -> SlotKey {
        SlotKey {
            doctor_id: self.doctor_id,
            date: self.requested_date.clone(),
            time: self.requested_time.clone(),
        }
    }
}

/// The (doctor, date, time) triple a booking competes for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub doctor_id: Uuid,
    pub date: String,
    pub time: String,
}

impl SlotKey {
    /// Key for `pg_advisory_xact_lock(hashtext(..))`
    pub fn lock_key(&self) -> String {
        format!("{}|{}|{}", self.doctor_id, self.date, self.time)
    }
}

/// Booking request body. Fields are optional so a missing one is reported as
/// a validation error instead of a deserialization failure.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub doctor_id: Option<String>,
    pub reason: Option<String>,
    pub requested_date: Option<String>,
    pub requested_time: Option<String>,
}

/// A validated booking ready to be written to the ledger.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub doctor_id: Uuid,
    pub reason: String,
    pub requested_date: String,
    pub requested_time: String,
}

impl BookingDraft {
    pub fn slot(&self) -> SlotKey {
        SlotKey {
            doctor_id: self.doctor_id,
            date: self.requested_date.clone(),
            time: self.requested_time.clone(),
        }
    }
}

/// Body of the approve/reject endpoints.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub admin_remarks: Option<String>,
}

/// Status change applied by an administrator.
#[derive(Debug, Clone)]
pub enum Decision {
    Approve { admin_id: Uuid, remarks: String },
    Reject { remarks: String },
}

impl Decision {
    pub fn status(&self) -> BookingStatus {
        match self {
            Decision::Approve { .. } => BookingStatus::Approved,
            Decision::Reject { .. } => BookingStatus::Rejected,
        }
    }

    pub fn remarks(&self) -> &str {
        match self {
            Decision::Approve { remarks, .. } | Decision::Reject { remarks } => remarks,
        }
    }

    /// Rejection leaves `approved_by` untouched.
    pub fn approved_by(&self) -> Option<Uuid> {
        match self {
            Decision::Approve { admin_id, .. } => Some(*admin_id),
            Decision::Reject { .. } => None,
        }
    }

    pub fn apply(&self, booking: &mut Booking, now: NaiveDateTime) {
        booking.status = self.status();
        booking.admin_remarks = self.remarks().to_string();
        if let Some(admin_id) = self.approved_by() {
            booking.approved_by = Some(admin_id);
        }
        booking.updated_at = now;
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct RequesterSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct DoctorSummary {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
}

/// Admin listing row: the booking joined with display data at read time.
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub requester: Option<RequesterSummary>,
    pub doctor: Option<DoctorSummary>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApprovalOutcome {
    pub booking: Booking,
    pub appointment: Appointment,
}
